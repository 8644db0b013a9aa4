//! Platform subsystems and the capability traits they share
//!
//! Every subsystem is a [`Component`]: it has health, an active flag, takes
//! damage and can be activated or deactivated. On top of that each variant
//! exposes its own specialised operation through an extension trait.
//!
//! A component whose health reaches zero is permanently disabled: activation,
//! deactivation and health effects become no-ops.

pub mod cancel;
pub mod cannon;
pub mod constants;
pub mod reactor;
pub mod shield;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::types::{Damage, Energy};

pub use cancel::{CancelScope, CancelToken};
pub use cannon::{ShotHandle, ShotOutcome, WeaponCannon};
pub use reactor::Reactor;
pub use shield::ShieldGenerator;

/// Shared lifecycle and damage capability of every subsystem
#[async_trait]
pub trait Component: Send + Sync {
    /// Short stable name used in logs and status reports
    fn name(&self) -> &'static str;

    fn health_level(&self) -> u32;

    fn is_active(&self) -> bool;

    fn is_destroyed(&self) -> bool {
        self.health_level() == 0
    }

    /// Apply a damage event to this component
    fn get_damage(&self, damage: &Damage);

    /// Idempotent; never blocks on background work it spawns
    async fn activate(&self) -> Result<()>;

    /// Idempotent; returns only once any background work has stopped
    async fn deactivate(&self) -> Result<()>;
}

/// A component that hands out energy
pub trait EnergySource: Component {
    /// Draw `level` energy
    ///
    /// `Ok(None)` means the source declined (inactive, destroyed or not
    /// enough charge). An error is fatal.
    fn get_energy(&self, level: f64) -> Result<Option<Energy>>;
}

/// A component that absorbs incoming damage before it reaches the platform
pub trait ShieldProjector: Component {
    fn shield_level(&self) -> u32;

    /// Reduce `damage`, returning the part that got through
    ///
    /// `None` means the blow was fully absorbed.
    fn absorb_damage(&self, damage: &Damage) -> Option<Damage>;
}

/// A component that can fire
#[async_trait]
pub trait Cannon: Component {
    /// Start a shot and hand back its handle
    async fn fire(&self) -> Result<ShotHandle>;
}

/// Health after taking `amount`, floored at zero
pub(crate) fn reduce_health(health: u32, amount: u32) -> u32 {
    health.saturating_sub(amount)
}
