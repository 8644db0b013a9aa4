//! Platform configuration with documented defaults
//!
//! Every tunable of the platform lives here. Defaults reproduce the stock
//! station; a TOML file may override any subset of fields.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::error::ConfigError;

/// Largest health any pool may start with
pub const MAX_HEALTH: u32 = i16::MAX as u32;

/// Hull settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HullConfig {
    /// Standalone health pool of the platform itself
    pub max_health: u32,
}

impl Default for HullConfig {
    fn default() -> Self {
        Self { max_health: 2000 }
    }
}

/// Reactor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactorConfig {
    /// Energy present when the reactor is built
    pub initial_energy: f64,
    pub max_health: u32,
    /// Passive regeneration only runs while energy is below this level
    pub capacity: f64,
    /// Drawing energy while above this level detonates the core
    ///
    /// Must be >= `capacity`, otherwise normal regeneration alone
    /// would make the reactor explode.
    pub max_allowed_capacity: f64,
    /// Energy injected by every Proton hit (no clamp)
    pub proton_recharge: f64,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            initial_energy: 1000.0,
            max_health: 100,
            capacity: 3000.0,
            max_allowed_capacity: 6000.0,
            proton_recharge: 14645.87,
        }
    }
}

/// Shield generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    pub max_health: u32,
    pub max_shield_level: u32,
    /// Shield gained per successful regeneration tick
    pub regen_per_tick: u32,
    /// Energy requested from the reactor on each tick
    pub energy_per_tick: f64,
    /// Pause between regeneration ticks
    pub regen_period_ms: u64,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            max_health: 120,
            max_shield_level: 100,
            regen_per_tick: 4,
            energy_per_tick: 10.0,
            regen_period_ms: 2000,
        }
    }
}

impl ShieldConfig {
    pub fn regen_period(&self) -> Duration {
        Duration::from_millis(self.regen_period_ms)
    }
}

/// Weapon cannon settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CannonConfig {
    pub max_health: u32,
    /// Accumulated energy needed before the cannon discharges
    pub required_energy_for_shot: f64,
    /// Energy requested from the reactor per charge step
    pub energy_per_request: f64,
    /// Pause between charge requests, keeps the cannon from draining the station
    pub delay_between_requests_ms: u64,
}

impl Default for CannonConfig {
    fn default() -> Self {
        Self {
            max_health: 200,
            required_energy_for_shot: 1500.0,
            energy_per_request: 100.0,
            delay_between_requests_ms: 2000,
        }
    }
}

impl CannonConfig {
    pub fn delay_between_requests(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms)
    }
}

/// How incoming damage is distributed after the shield
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Include the hull in the random target draw
    ///
    /// Off by default: targets are drawn from the components only and the
    /// hull is never hit directly.
    pub include_hull: bool,
    /// Apply the shield residual instead of the original damage
    pub apply_shield_residual: bool,
    /// Fixed seed for the routing RNG, random when absent
    pub seed: Option<u64>,
}

/// Complete platform configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub hull: HullConfig,
    pub reactor: ReactorConfig,
    pub shield: ShieldConfig,
    pub cannon: CannonConfig,
    pub routing: RoutingConfig,
}

impl PlatformConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a (possibly partial) TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PlatformConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded platform config from {:?}", path.as_ref());
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, health) in [
            ("hull.max_health", self.hull.max_health),
            ("reactor.max_health", self.reactor.max_health),
            ("shield.max_health", self.shield.max_health),
            ("cannon.max_health", self.cannon.max_health),
        ] {
            if health > MAX_HEALTH {
                return Err(ConfigError::Invalid(format!(
                    "{field} ({health}) exceeds {MAX_HEALTH}"
                )));
            }
        }
        if self.hull.max_health == 0 {
            return Err(ConfigError::Invalid("hull.max_health must be positive".into()));
        }

        let reactor = &self.reactor;
        // NaN fails these comparisons too
        if !(reactor.initial_energy >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "reactor.initial_energy ({}) must not be negative",
                reactor.initial_energy
            )));
        }
        if !(reactor.capacity >= 0.0) || !reactor.proton_recharge.is_finite() {
            return Err(ConfigError::Invalid(
                "reactor.capacity and reactor.proton_recharge must be finite".into(),
            ));
        }
        if !(reactor.max_allowed_capacity >= reactor.capacity) {
            return Err(ConfigError::Invalid(format!(
                "reactor.max_allowed_capacity ({}) should be >= reactor.capacity ({})",
                reactor.max_allowed_capacity, reactor.capacity
            )));
        }

        if !(self.shield.energy_per_tick > 0.0) || !(self.cannon.energy_per_request > 0.0) {
            return Err(ConfigError::Invalid("energy requests must be positive".into()));
        }
        if self.shield.regen_period_ms == 0 {
            return Err(ConfigError::Invalid("shield.regen_period_ms must be positive".into()));
        }
        if !(self.cannon.required_energy_for_shot > 0.0) {
            return Err(ConfigError::Invalid(
                "cannon.required_energy_for_shot must be positive".into(),
            ));
        }

        Ok(())
    }
}
