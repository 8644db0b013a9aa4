//! Shield generator: absorbs incoming damage and regenerates from the reactor
//!
//! While active, a background loop requests a fixed amount of energy every
//! regeneration period and tops the shield up when the reactor grants it in
//! full. Deactivation cancels the loop and waits for it to exit.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::components::cancel::{CancelScope, CancelToken};
use crate::components::constants::{absorption_factor, ENERGY_TOLERANCE};
use crate::components::{reduce_health, Component, EnergySource, ShieldProjector};
use crate::core::config::ShieldConfig;
use crate::core::error::Result;
use crate::core::types::Damage;

#[derive(Debug)]
struct ShieldState {
    health: u32,
    shield_level: u32,
    active: bool,
}

/// State shared with the regeneration loop
struct ShieldCore {
    config: ShieldConfig,
    reactor: Arc<dyn EnergySource>,
    state: Mutex<ShieldState>,
}

impl ShieldCore {
    fn health(&self) -> u32 {
        self.state.lock().health
    }

    /// One regeneration step; reactor errors are fatal and end the loop
    fn regenerate_once(&self) -> Result<()> {
        let requested = self.config.energy_per_tick;
        let energy = self.reactor.get_energy(requested)?;
        let granted = energy.is_some_and(|e| (e.level() - requested).abs() < ENERGY_TOLERANCE);
        if granted {
            let mut state = self.state.lock();
            state.shield_level =
                (state.shield_level + self.config.regen_per_tick).min(self.config.max_shield_level);
            debug!("Shield regenerated to {}", state.shield_level);
        }
        Ok(())
    }
}

/// Background regeneration loop
async fn regenerate(core: Arc<ShieldCore>, mut token: CancelToken) -> Result<()> {
    let period = core.config.regen_period();
    loop {
        if core.health() == 0 {
            debug!("Shield generator destroyed, regeneration halted");
            break;
        }
        if let Err(err) = core.regenerate_once() {
            error!("Shield regeneration aborted: {}", err);
            return Err(err);
        }
        if !token.sleep(period).await {
            break;
        }
    }
    Ok(())
}

/// The running regeneration loop of one activation
struct RegenTask {
    scope: CancelScope,
    handle: JoinHandle<Result<()>>,
}

/// Deflector shield generator fed by a reactor
///
/// `task` is locked before the shared state whenever both are needed.
pub struct ShieldGenerator {
    core: Arc<ShieldCore>,
    task: Mutex<Option<RegenTask>>,
}

impl ShieldGenerator {
    pub fn new(config: ShieldConfig, reactor: Arc<dyn EnergySource>) -> Self {
        let state = ShieldState {
            health: config.max_health,
            shield_level: config.max_shield_level,
            active: false,
        };
        Self {
            core: Arc::new(ShieldCore {
                config,
                reactor,
                state: Mutex::new(state),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ShieldConfig {
        &self.core.config
    }

    /// Set the shield level directly, capped at the maximum
    pub fn set_shield_level(&self, level: u32) {
        let mut state = self.core.state.lock();
        state.shield_level = level.min(self.core.config.max_shield_level);
    }
}

#[async_trait]
impl Component for ShieldGenerator {
    fn name(&self) -> &'static str {
        "shield-generator"
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
        debug!("Shield generator took {} damage, health {}", damage, state.health);
    }

    async fn activate(&self) -> Result<()> {
        let mut task = self.task.lock();
        {
            let mut state = self.core.state.lock();
            if state.active || state.health == 0 {
                return Ok(());
            }
            state.active = true;
        }

        let scope = CancelScope::new();
        let handle = tokio::spawn(regenerate(Arc::clone(&self.core), scope.token()));
        *task = Some(RegenTask { scope, handle });
        info!("Shield generator online");
        Ok(())
    }

    async fn deactivate(&self) -> Result<()> {
        let task = {
            let mut task = self.task.lock();
            {
                let mut state = self.core.state.lock();
                if !state.active || state.health == 0 {
                    return Ok(());
                }
                state.active = false;
            }
            task.take()
        };

        if let Some(task) = task {
            task.scope.cancel();
            task.handle.await??;
        }
        info!("Shield generator offline");
        Ok(())
    }
}

impl ShieldProjector for ShieldGenerator {
    fn shield_level(&self) -> u32 {
        self.core.state.lock().shield_level
    }

    fn absorb_damage(&self, damage: &Damage) -> Option<Damage> {
        let mut state = self.core.state.lock();
        if state.shield_level == 0 {
            return Some(*damage);
        }

        let level = damage.level() as i64;
        let absorbed = (absorption_factor(damage.kind()) * level as f64).round_ties_even() as i64;
        let reduced = level - absorbed;
        if reduced <= 0 {
            debug!("Shield fully absorbed {}", damage);
            return None;
        }

        let reduced = reduced as u32;
        state.shield_level = state.shield_level.saturating_sub(reduced / 2);
        Some(damage.with_level(reduced))
    }
}

impl Drop for ShieldGenerator {
    fn drop(&mut self) {
        // The loop exits at its next suspend point
        if let Some(task) = self.task.get_mut().take() {
            task.scope.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::{DrainedReactor, GrantingReactor};
    use crate::components::Reactor;
    use crate::core::error::{DestructionCause, PlatformError};
    use crate::core::types::DamageType;
    use std::time::Duration;

    fn damage(level: i64, kind: DamageType) -> Damage {
        Damage::new(level, kind).unwrap()
    }

    fn generator(reactor: Arc<dyn EnergySource>) -> ShieldGenerator {
        ShieldGenerator::new(ShieldConfig::default(), reactor)
    }

    #[tokio::test]
    async fn test_absorb_by_damage_type() {
        let cases = [
            (DamageType::Laser, 1),
            (DamageType::Mechanic, 3),
            (DamageType::Ion, 8),
            (DamageType::Proton, 9),
        ];
        for (kind, expected) in cases {
            let shield = generator(Arc::new(GrantingReactor::default()));
            shield.activate().await.unwrap();

            let residual = shield.absorb_damage(&damage(10, kind)).expect("should leak damage");

            assert_eq!(residual.level(), expected, "residual for {kind}");
            assert_eq!(residual.kind(), kind);
            shield.deactivate().await.unwrap();
        }
    }

    #[test]
    fn test_absorb_depletes_shield_by_half_residual() {
        let shield = generator(Arc::new(GrantingReactor::default()));
        // 100 mechanic: 100 - 74 = 26 through, shield loses 13
        let residual = shield.absorb_damage(&damage(100, DamageType::Mechanic)).unwrap();
        assert_eq!(residual.level(), 26);
        assert_eq!(shield.shield_level(), 87);
    }

    #[test]
    fn test_absorb_uses_half_even_rounding() {
        let shield = generator(Arc::new(GrantingReactor::default()));
        // 0.9 * 5 = 4.5 rounds to 4, so 1 gets through
        let residual = shield.absorb_damage(&damage(5, DamageType::Laser)).unwrap();
        assert_eq!(residual.level(), 1);
    }

    #[test]
    fn test_small_hit_fully_absorbed() {
        let shield = generator(Arc::new(GrantingReactor::default()));
        assert_eq!(shield.absorb_damage(&damage(1, DamageType::Laser)), None);
        assert_eq!(shield.absorb_damage(&damage(0, DamageType::Ion)), None);
        assert_eq!(shield.shield_level(), 100);
    }

    #[test]
    fn test_depleted_shield_passes_damage_through() {
        let shield = generator(Arc::new(GrantingReactor::default()));
        shield.set_shield_level(0);

        let hit = damage(40, DamageType::Laser);
        assert_eq!(shield.absorb_damage(&hit), Some(hit));
    }

    #[test]
    fn test_shield_level_never_negative() {
        let shield = generator(Arc::new(GrantingReactor::default()));
        shield.set_shield_level(3);
        shield.absorb_damage(&damage(1000, DamageType::Proton));
        assert_eq!(shield.shield_level(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_keeps_full_shield() {
        let reactor = Arc::new(GrantingReactor::default());
        let shield = generator(reactor.clone());

        shield.activate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(shield.is_active());
        assert_eq!(shield.shield_level(), 100);
        assert!(reactor.request_count() >= 1);
        assert_eq!(reactor.requested_levels.lock()[0], 10.0);
        shield.deactivate().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_regeneration_ticks_each_period() {
        let reactor = Arc::new(GrantingReactor::default());
        let shield = generator(reactor.clone());
        shield.set_shield_level(50);

        shield.activate().await.unwrap();
        // ticks at 0s, 2s, 4s
        tokio::time::sleep(Duration::from_millis(4500)).await;
        shield.deactivate().await.unwrap();

        assert_eq!(reactor.request_count(), 3);
        assert_eq!(shield.shield_level(), 62);
    }

    #[tokio::test(start_paused = true)]
    async fn test_regeneration_capped_at_max() {
        let shield = generator(Arc::new(GrantingReactor::default()));
        shield.set_shield_level(98);

        shield.activate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        shield.deactivate().await.unwrap();

        assert_eq!(shield.shield_level(), 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_energy_does_not_regenerate() {
        let reactor = Arc::new(DrainedReactor::default());
        let shield = generator(reactor.clone());
        shield.set_shield_level(20);

        shield.activate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(4500)).await;
        shield.deactivate().await.unwrap();

        assert_eq!(shield.shield_level(), 20);
        assert_eq!(
            reactor.requests.load(std::sync::atomic::Ordering::SeqCst),
            3
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_activation_spawns_one_loop() {
        let reactor = Arc::new(GrantingReactor::default());
        let shield = generator(reactor.clone());

        shield.activate().await.unwrap();
        shield.activate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        shield.deactivate().await.unwrap();

        // one loop: ticks at 0s and 2s only
        assert_eq!(reactor.request_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_lifecycle_leaves_no_loop_behind() {
        let reactor = Arc::new(GrantingReactor::default());
        let shield = Arc::new(ShieldGenerator::new(
            ShieldConfig {
                regen_period_ms: 1,
                ..ShieldConfig::default()
            },
            reactor.clone(),
        ));

        for _ in 0..200 {
            let activating = tokio::spawn({
                let shield = Arc::clone(&shield);
                async move { shield.activate().await }
            });
            let deactivating = tokio::spawn({
                let shield = Arc::clone(&shield);
                async move { shield.deactivate().await }
            });
            activating.await.unwrap().unwrap();
            deactivating.await.unwrap().unwrap();
        }
        shield.deactivate().await.unwrap();
        assert!(!shield.is_active());

        tokio::time::sleep(Duration::from_millis(10)).await;
        let settled = reactor.request_count();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(reactor.request_count(), settled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_twice_is_idempotent() {
        let shield = generator(Arc::new(GrantingReactor::default()));
        shield.activate().await.unwrap();

        shield.deactivate().await.unwrap();
        shield.deactivate().await.unwrap();
        assert!(!shield.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_deactivate() {
        let reactor = Arc::new(GrantingReactor::default());
        let shield = generator(reactor.clone());

        shield.activate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        shield.deactivate().await.unwrap();
        let after_stop = reactor.request_count();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(reactor.request_count(), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reactivation_starts_fresh_loop() {
        let reactor = Arc::new(GrantingReactor::default());
        let shield = generator(reactor.clone());

        shield.activate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        shield.deactivate().await.unwrap();

        shield.activate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(shield.is_active());
        assert_eq!(reactor.request_count(), 2);
        shield.deactivate().await.unwrap();
    }

    #[tokio::test]
    async fn test_destroyed_generator_ignores_lifecycle() {
        let reactor = Arc::new(GrantingReactor::default());
        let shield = generator(reactor.clone());
        shield.get_damage(&damage(500, DamageType::Mechanic));

        assert_eq!(shield.health_level(), 0);
        shield.activate().await.unwrap();
        assert!(!shield.is_active());
        assert_eq!(reactor.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_when_generator_destroyed() {
        let reactor = Arc::new(GrantingReactor::default());
        let shield = generator(reactor.clone());

        shield.activate().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        shield.get_damage(&damage(120, DamageType::Laser));
        tokio::time::sleep(Duration::from_secs(10)).await;

        // first tick only; the loop saw zero health on its next pass
        assert_eq!(reactor.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_meltdown_surfaces_on_deactivate() {
        // 100 energy: the 2s pause regenerates 20000, the third draw detonates
        let reactor = Arc::new(Reactor::with_energy(100.0));
        reactor.activate().await.unwrap();
        let shield = generator(reactor.clone());

        shield.activate().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(
            shield.deactivate().await,
            Err(PlatformError::Destroyed(DestructionCause::ReactorMeltdown))
        );
    }
}
