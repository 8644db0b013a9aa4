//! Fixed physical constants of the station, not configurable

use std::time::Duration;

use crate::core::types::DamageType;

// Reactor regeneration: one unit per elapsed time unit, whole units only
pub const REGEN_TIME_UNIT: Duration = Duration::from_micros(100);
pub const ENERGY_PER_TIME_UNIT: f64 = 1.0;

// Shield absorption factors (fraction of incoming damage removed)
pub const ION_ABSORPTION: f64 = 0.20;
pub const PROTON_ABSORPTION: f64 = 0.10;
pub const LASER_ABSORPTION: f64 = 0.90;
pub const MECHANIC_ABSORPTION: f64 = 0.74;

/// Two energy levels closer than this are considered equal
pub const ENERGY_TOLERANCE: f64 = 1e-10;

/// Absorption factor for a damage type
pub fn absorption_factor(kind: DamageType) -> f64 {
    match kind {
        DamageType::Ion => ION_ABSORPTION,
        DamageType::Proton => PROTON_ABSORPTION,
        DamageType::Laser => LASER_ABSORPTION,
        DamageType::Mechanic => MECHANIC_ABSORPTION,
    }
}
