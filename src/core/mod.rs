pub mod config;
pub mod error;
pub mod types;

pub use config::PlatformConfig;
pub use error::{ConfigError, DestructionCause, PlatformError, Result};
pub use types::{Damage, DamageType, Energy};
