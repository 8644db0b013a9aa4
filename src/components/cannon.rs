//! Weapon cannon: accumulates reactor energy over several requests, then fires
//!
//! A shot is a background operation. It asks the reactor for a fixed amount
//! of energy, waits between requests, and discharges once the accumulated
//! charge reaches the shot requirement. Deactivation cancels the pending wait
//! and waits for the operation to finish.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::components::cancel::{CancelScope, CancelToken};
use crate::components::{reduce_health, Cannon, Component, EnergySource};
use crate::core::config::CannonConfig;
use crate::core::error::{PlatformError, Result};
use crate::core::types::{Damage, Energy};

/// How a shot ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotOutcome {
    /// The cannon fired, spending the accumulated charge
    Discharged { energy: f64 },
    /// Deactivation cancelled the shot while charging
    Aborted,
    /// The cannon was destroyed, nothing fired
    Misfire,
}

type OutcomeSlot = Option<Result<ShotOutcome>>;

/// Awaitable handle to a firing operation
#[derive(Debug)]
pub struct ShotHandle {
    rx: watch::Receiver<OutcomeSlot>,
}

impl ShotHandle {
    /// A handle whose outcome is already known
    fn settled(outcome: ShotOutcome) -> Self {
        let (_tx, rx) = watch::channel(Some(Ok(outcome)));
        Self { rx }
    }

    /// Outcome so far, without waiting
    pub fn try_outcome(&self) -> Option<Result<ShotOutcome>> {
        self.rx.borrow().clone()
    }

    /// Wait for the shot to settle
    pub async fn wait(mut self) -> Result<ShotOutcome> {
        loop {
            if let Some(outcome) = self.rx.borrow_and_update().clone() {
                return outcome;
            }
            if self.rx.changed().await.is_err() {
                return self.rx.borrow().clone().unwrap_or_else(|| {
                    Err(PlatformError::TaskFailed(
                        "firing operation ended without an outcome".into(),
                    ))
                });
            }
        }
    }
}

impl IntoFuture for ShotHandle {
    type Output = Result<ShotOutcome>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

#[derive(Debug)]
struct CannonState {
    health: u32,
    active: bool,
    charge: Option<Energy>,
}

/// State shared with firing operations
struct CannonCore {
    config: CannonConfig,
    reactor: Arc<dyn EnergySource>,
    state: Mutex<CannonState>,
}

impl CannonCore {
    fn health(&self) -> u32 {
        self.state.lock().health
    }

    fn needs_charge(&self, current: Option<&Energy>) -> bool {
        match current {
            None => true,
            Some(energy) => energy.level() < self.config.required_energy_for_shot,
        }
    }

    fn is_charging(&self) -> bool {
        let state = self.state.lock();
        self.needs_charge(state.charge.as_ref())
    }

    fn accumulate(&self, energy: Energy) {
        let mut state = self.state.lock();
        let total = match state.charge {
            Some(charge) => charge.merge(energy),
            None => energy,
        };
        debug!("Cannon charged to {:.2}", total.level());
        state.charge = Some(total);
    }
}

/// Charge from the reactor until ready, then discharge
async fn charge_and_fire(core: Arc<CannonCore>, mut token: CancelToken) -> Result<ShotOutcome> {
    let delay = core.config.delay_between_requests();
    let mut first_request = true;

    while core.is_charging() {
        if !first_request && !token.sleep(delay).await {
            info!("Cannon charge aborted");
            return Ok(ShotOutcome::Aborted);
        }
        if core.health() == 0 {
            break;
        }

        let energy = core.reactor.get_energy(core.config.energy_per_request).map_err(|err| {
            error!("Cannon charge failed: {}", err);
            err
        })?;
        first_request = false;

        match energy {
            Some(energy) => core.accumulate(energy),
            None => debug!("Reactor declined cannon request, retrying"),
        }
    }

    let mut state = core.state.lock();
    if state.health == 0 {
        info!("Cannon destroyed before discharge");
        return Ok(ShotOutcome::Misfire);
    }
    let energy = state.charge.take().map_or(0.0, |charge| charge.level());
    info!("Cannon discharged {:.2} energy", energy);
    Ok(ShotOutcome::Discharged { energy })
}

/// Scope of the current activation and the tracked firing operation
///
/// Locked before the state whenever both are needed.
#[derive(Default)]
struct FiringTasks {
    scope: Option<CancelScope>,
    shot: Option<JoinHandle<Result<ShotOutcome>>>,
}

/// Main weapon, charged from a reactor
pub struct WeaponCannon {
    core: Arc<CannonCore>,
    tasks: Mutex<FiringTasks>,
}

impl WeaponCannon {
    pub fn new(config: CannonConfig, reactor: Arc<dyn EnergySource>) -> Self {
        let state = CannonState {
            health: config.max_health,
            active: false,
            charge: None,
        };
        Self {
            core: Arc::new(CannonCore {
                config,
                reactor,
                state: Mutex::new(state),
            }),
            tasks: Mutex::new(FiringTasks::default()),
        }
    }

    pub fn config(&self) -> &CannonConfig {
        &self.core.config
    }

    /// True while `current` is absent or below the shot requirement
    pub fn needs_charge(&self, current: Option<&Energy>) -> bool {
        self.core.needs_charge(current)
    }

    /// Energy accumulated for the pending shot
    pub fn charge_level(&self) -> f64 {
        self.core.state.lock().charge.map_or(0.0, |charge| charge.level())
    }
}

#[async_trait]
impl Component for WeaponCannon {
    fn name(&self) -> &'static str {
        "weapon-cannon"
    }

    fn health_level(&self) -> u32 {
        self.core.health()
    }

    fn is_active(&self) -> bool {
        self.core.state.lock().active
    }

    fn get_damage(&self, damage: &Damage) {
        let mut state = self.core.state.lock();
        if state.health == 0 {
            return;
        }
        state.health = reduce_health(state.health, damage.level());
        debug!("Cannon took {} damage, health {}", damage, state.health);
    }

    async fn activate(&self) -> Result<()> {
        let mut tasks = self.tasks.lock();
        {
            let mut state = self.core.state.lock();
            if state.active || state.health == 0 {
                return Ok(());
            }
            state.active = true;
        }
        tasks.scope = Some(CancelScope::new());
        info!("Cannon online");
        Ok(())
    }

    async fn deactivate(&self) -> Result<()> {
        let shot = {
            let mut tasks = self.tasks.lock();
            {
                let mut state = self.core.state.lock();
                if !state.active || state.health == 0 {
                    return Ok(());
                }
                state.active = false;
            }
            if let Some(scope) = tasks.scope.take() {
                scope.cancel();
            }
            tasks.shot.take()
        };

        if let Some(handle) = shot {
            let outcome = handle.await??;
            debug!("Pending shot settled as {:?}", outcome);
        }
        info!("Cannon offline");
        Ok(())
    }
}

#[async_trait]
impl Cannon for WeaponCannon {
    async fn fire(&self) -> Result<ShotHandle> {
        let mut tasks = self.tasks.lock();
        {
            let state = self.core.state.lock();
            if !state.active {
                return Err(PlatformError::InvalidState(
                    "cannon must be activated before firing".into(),
                ));
            }
            if state.health == 0 {
                return Ok(ShotHandle::settled(ShotOutcome::Misfire));
            }
        }

        let token = tasks
            .scope
            .as_ref()
            .map(CancelScope::token)
            .ok_or_else(|| PlatformError::InvalidState("cannon has no activation scope".into()))?;

        let (tx, rx) = watch::channel(None);
        let core = Arc::clone(&self.core);
        let handle = tokio::spawn(async move {
            let outcome = charge_and_fire(core, token).await;
            tx.send_replace(Some(outcome.clone()));
            outcome
        });

        if let Some(previous) = tasks.shot.replace(handle) {
            if !previous.is_finished() {
                debug!("New shot replaces an in-flight one");
            }
        }
        Ok(ShotHandle { rx })
    }
}

impl Drop for WeaponCannon {
    fn drop(&mut self) {
        if let Some(scope) = self.tasks.get_mut().scope.take() {
            scope.cancel();
        }
    }
}
