//! Reactor: the station's energy source
//!
//! Energy regenerates linearly with wall-clock time while the reactor sits
//! below its nominal capacity. Drawing energy while above the hard limit
//! detonates the core.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::components::constants::{ENERGY_PER_TIME_UNIT, REGEN_TIME_UNIT};
use crate::components::{reduce_health, Component, EnergySource};
use crate::core::config::ReactorConfig;
use crate::core::error::{DestructionCause, PlatformError, Result};
use crate::core::types::{Damage, DamageType, Energy};

#[derive(Debug)]
struct ReactorState {
    energy: f64,
    health: u32,
    active: bool,
    last_used: Instant,
}

/// Energy source shared by the shield generator and the cannon
///
/// All state sits behind one lock so concurrent draws never interleave.
#[derive(Debug)]
pub struct Reactor {
    config: ReactorConfig,
    state: Mutex<ReactorState>,
}

impl Reactor {
    pub fn new(config: ReactorConfig) -> Self {
        let state = ReactorState {
            energy: config.initial_energy,
            health: config.max_health,
            active: false,
            last_used: Instant::now(),
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Stock reactor holding `initial_energy`
    pub fn with_energy(initial_energy: f64) -> Self {
        Self::new(ReactorConfig {
            initial_energy,
            ..ReactorConfig::default()
        })
    }

    /// Current stored energy (without pending regeneration)
    pub fn energy_level(&self) -> f64 {
        self.state.lock().energy
    }

    pub fn is_unstable(&self) -> bool {
        self.state.lock().energy > self.config.max_allowed_capacity
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }
}

/// Whole regeneration units earned since `since`
fn regenerated_energy(since: Instant, now: Instant) -> f64 {
    let elapsed = now.saturating_duration_since(since);
    let units = elapsed.as_nanos() / REGEN_TIME_UNIT.as_nanos();
    units as f64 * ENERGY_PER_TIME_UNIT
}

#[async_trait]
impl Component for Reactor {
    fn name(&self) -> &'static str {
        "reactor"
    }

    fn health_level(&self) -> u32 {
        self.state.lock().health
    }

    fn is_active(&self) -> bool {
        self.state.lock().active
    }

    fn get_damage(&self, damage: &Damage) {
        let mut state = self.state.lock();
        let level = damage.level() as f64;
        match damage.kind() {
            // Ion fire drains the core; the level is deliberately taken twice
            DamageType::Ion => {
                state.energy -= level;
                if state.energy - level < 0.0 {
                    state.energy = 0.0;
                } else {
                    state.energy -= level;
                }
                debug!("Reactor drained by ion hit to {:.2}", state.energy);
            }
            // Proton fire charges the core, with no ceiling
            DamageType::Proton => {
                state.energy += self.config.proton_recharge;
                if state.energy > self.config.max_allowed_capacity {
                    warn!(
                        "Reactor overcharged to {:.2} (limit {:.2})",
                        state.energy, self.config.max_allowed_capacity
                    );
                }
            }
            DamageType::Laser | DamageType::Mechanic => {
                if state.health == 0 {
                    return;
                }
                state.health = reduce_health(state.health, damage.level());
                debug!("Reactor took {} damage, health {}", damage, state.health);
            }
        }
    }

    async fn activate(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.active || state.health == 0 {
            return Ok(());
        }
        state.active = true;
        state.last_used = Instant::now();
        info!("Reactor online with {:.2} energy", state.energy);
        Ok(())
    }

    async fn deactivate(&self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.active || state.health == 0 {
            return Ok(());
        }
        state.active = false;
        state.last_used = Instant::now();
        info!("Reactor offline");
        Ok(())
    }
}

impl EnergySource for Reactor {
    fn get_energy(&self, level: f64) -> Result<Option<Energy>> {
        let mut state = self.state.lock();
        if !state.active || state.health == 0 {
            return Ok(None);
        }

        if state.energy > self.config.max_allowed_capacity {
            error!(
                "Reactor queried at {:.2} energy, above limit {:.2}: core meltdown",
                state.energy, self.config.max_allowed_capacity
            );
            return Err(PlatformError::Destroyed(DestructionCause::ReactorMeltdown));
        }

        let now = Instant::now();
        if state.energy < self.config.capacity {
            state.energy += regenerated_energy(state.last_used, now);
        }

        // Regeneration stays banked, but the timestamp only moves on a successful draw
        if state.energy < level {
            debug!("Reactor declined {:.2}, holding {:.2}", level, state.energy);
            return Ok(None);
        }

        let energy = Energy::new(level)?;
        state.energy -= level;
        state.last_used = now;
        Ok(Some(energy))
    }
}
