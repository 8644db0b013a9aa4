//! Battle Station - composite platform simulation
//!
//! A reactor, a shield generator and a charge cannon, each with its own
//! health and background behaviour, combined into a platform that routes
//! incoming damage and tracks overall survivability.

pub mod components;
pub mod core;
pub mod platform;

pub use crate::components::{Cannon, Component, EnergySource, Reactor, ShieldGenerator, ShieldProjector, ShotHandle, ShotOutcome, WeaponCannon};
pub use crate::core::{ConfigError, Damage, DamageType, DestructionCause, Energy, PlatformConfig, PlatformError, Result};
pub use crate::platform::{DamageReport, DamageTarget, Platform, PlatformStatus};
