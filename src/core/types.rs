//! Value objects passed between components: damage events and energy quanta
//!
//! Both are immutable once built and validate their level at construction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::{PlatformError, Result};

/// Kind of weapon that produced a damage event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    /// Ion weapons drain reactor energy
    Ion,
    /// Proton weapons overcharge the reactor
    Proton,
    Laser,
    Mechanic,
}

impl DamageType {
    pub const ALL: [DamageType; 4] = [
        DamageType::Ion,
        DamageType::Proton,
        DamageType::Laser,
        DamageType::Mechanic,
    ];
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DamageType::Ion => "ion",
            DamageType::Proton => "proton",
            DamageType::Laser => "laser",
            DamageType::Mechanic => "mechanic",
        };
        f.write_str(name)
    }
}

/// A single damage event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Damage {
    level: u32,
    kind: DamageType,
}

impl Damage {
    /// Build a damage event, rejecting negative levels
    pub fn new(level: i64, kind: DamageType) -> Result<Self> {
        let level = u32::try_from(level).map_err(|_| {
            PlatformError::InvalidArgument(format!("damage level must be non-negative, got {level}"))
        })?;
        Ok(Self { level, kind })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn kind(&self) -> DamageType {
        self.kind
    }

    /// Same type, different level
    pub(crate) fn with_level(&self, level: u32) -> Self {
        Self { level, kind: self.kind }
    }
}

impl fmt::Display for Damage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level, self.kind)
    }
}

/// A quantity of energy drawn from a reactor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Energy {
    level: f64,
}

impl Energy {
    /// Build an energy quantum; level must be strictly positive
    pub fn new(level: f64) -> Result<Self> {
        // NaN fails this comparison too
        if !(level > 0.0) {
            return Err(PlatformError::InvalidArgument(format!(
                "energy level must be positive, got {level}"
            )));
        }
        Ok(Self { level })
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Combine two quanta into one
    pub fn merge(self, other: Energy) -> Energy {
        Energy {
            level: self.level + other.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_accepts_zero_and_positive() {
        for kind in DamageType::ALL {
            assert_eq!(Damage::new(0, kind).unwrap().level(), 0);
            let damage = Damage::new(250, kind).unwrap();
            assert_eq!(damage.level(), 250);
            assert_eq!(damage.kind(), kind);
        }
    }

    #[test]
    fn test_damage_rejects_negative() {
        let err = Damage::new(-1, DamageType::Laser).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidArgument(_)));
    }

    #[test]
    fn test_energy_rejects_non_positive() {
        assert!(matches!(Energy::new(0.0), Err(PlatformError::InvalidArgument(_))));
        assert!(matches!(Energy::new(-3.5), Err(PlatformError::InvalidArgument(_))));
        assert!(Energy::new(f64::NAN).is_err());
    }

    #[test]
    fn test_energy_merge_sums_levels() {
        let total = Energy::new(100.0).unwrap().merge(Energy::new(40.5).unwrap());
        assert_eq!(total.level(), 140.5);
    }

    #[test]
    fn test_damage_display() {
        let damage = Damage::new(12, DamageType::Proton).unwrap();
        assert_eq!(damage.to_string(), "12 proton");
    }
}
