//! The platform aggregate: owns the three components and the hull
//!
//! Incoming damage first meets the shield, then lands on a randomly drawn
//! target. Once the hull or the aggregate health is gone the platform is
//! destroyed for good.

pub mod routing;
pub mod status;

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::components::{Cannon, Component, Reactor, ShieldGenerator, ShieldProjector, ShotHandle, WeaponCannon};
use crate::core::config::{PlatformConfig, RoutingConfig};
use crate::core::error::{DestructionCause, PlatformError, Result};
use crate::core::types::Damage;

pub use routing::{DamageRouter, DamageTarget};
pub use status::{ComponentStatus, PlatformStatus};

/// What happened to one damage event
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DamageReport {
    pub target: DamageTarget,
    /// Damage that reached the target, `None` if nothing did
    pub applied: Option<Damage>,
    /// What got past the shield
    pub residual: Option<Damage>,
}

#[derive(Debug)]
struct HullState {
    health: u32,
    destroyed: Option<DestructionCause>,
}

pub struct Platform {
    reactor: Arc<dyn Component>,
    shield: Arc<dyn ShieldProjector>,
    cannon: Arc<dyn Cannon>,
    max_hull_health: u32,
    routing: RoutingConfig,
    router: Mutex<DamageRouter>,
    hull: Mutex<HullState>,
}

impl Platform {
    pub fn new(
        reactor: Arc<dyn Component>,
        shield: Arc<dyn ShieldProjector>,
        cannon: Arc<dyn Cannon>,
        config: &PlatformConfig,
    ) -> Self {
        Self {
            reactor,
            shield,
            cannon,
            max_hull_health: config.hull.max_health,
            routing: config.routing.clone(),
            router: Mutex::new(DamageRouter::new(&config.routing)),
            hull: Mutex::new(HullState {
                health: config.hull.max_health,
                destroyed: None,
            }),
        }
    }

    /// Build the stock components from `config` and wire them together
    pub fn assemble(config: &PlatformConfig) -> Self {
        let reactor = Arc::new(Reactor::new(config.reactor.clone()));
        let shield = Arc::new(ShieldGenerator::new(config.shield.clone(), reactor.clone()));
        let cannon = Arc::new(WeaponCannon::new(config.cannon.clone(), reactor.clone()));
        Self::new(reactor, shield, cannon, config)
    }

    pub fn reactor(&self) -> &Arc<dyn Component> {
        &self.reactor
    }

    pub fn shield(&self) -> &Arc<dyn ShieldProjector> {
        &self.shield
    }

    pub fn cannon(&self) -> &Arc<dyn Cannon> {
        &self.cannon
    }

    /// Hull health plus the health of every component
    pub fn health_level(&self) -> u32 {
        self.hull_health().saturating_add(self.component_health())
    }

    pub fn hull_health(&self) -> u32 {
        self.hull.lock().health
    }

    pub fn shield_level(&self) -> u32 {
        self.shield.shield_level()
    }

    pub fn is_destroyed(&self) -> bool {
        self.hull.lock().destroyed.is_some()
    }

    fn component_health(&self) -> u32 {
        self.reactor
            .health_level()
            .saturating_add(self.shield.health_level())
            .saturating_add(self.cannon.health_level())
    }

    /// Activate all components concurrently
    pub async fn start(&self) -> Result<()> {
        let (reactor, shield, cannon) = tokio::join!(
            self.reactor.activate(),
            self.shield.activate(),
            self.cannon.activate()
        );
        reactor?;
        shield?;
        cannon?;
        info!("Platform started, health {}", self.health_level());
        Ok(())
    }

    /// Deactivate all components concurrently and wait for their loops to drain
    ///
    /// Every component is stopped even if one fails; the first error wins.
    pub async fn stop(&self) -> Result<()> {
        let (reactor, shield, cannon) = tokio::join!(
            self.reactor.deactivate(),
            self.shield.deactivate(),
            self.cannon.deactivate()
        );
        reactor?;
        shield?;
        cannon?;
        info!("Platform stopped");
        Ok(())
    }

    /// Fire the main weapon
    pub async fn fire(&self) -> Result<ShotHandle> {
        self.cannon.fire().await
    }

    /// Take a hit: shield first, then a random target
    pub async fn take_damage(&self, damage: Damage) -> Result<DamageReport> {
        if let Some(cause) = self.hull.lock().destroyed {
            return Err(PlatformError::Destroyed(cause));
        }

        let residual = self.shield.absorb_damage(&damage);
        // The shield residual is only applied when routing asks for it
        let applied = if self.routing.apply_shield_residual {
            residual
        } else {
            Some(damage)
        };

        let target = self.router.lock().next_target();
        if let Some(hit) = &applied {
            self.apply_to(target, hit);
        }
        debug!(
            "Damage {} routed to {:?} (residual {:?})",
            damage, target, residual
        );

        self.check_integrity()?;
        Ok(DamageReport {
            target,
            applied,
            residual,
        })
    }

    fn apply_to(&self, target: DamageTarget, damage: &Damage) {
        match target {
            DamageTarget::Reactor => self.reactor.get_damage(damage),
            DamageTarget::ShieldGenerator => self.shield.get_damage(damage),
            DamageTarget::WeaponCannon => self.cannon.get_damage(damage),
            DamageTarget::Hull => {
                let mut hull = self.hull.lock();
                hull.health = hull.health.saturating_sub(damage.level());
            }
        }
    }

    /// Latch destruction once the hull or the aggregate health is gone
    fn check_integrity(&self) -> Result<()> {
        let components = self.component_health();
        let mut hull = self.hull.lock();
        let cause = if hull.health == 0 && components == 0 {
            DestructionCause::SystemsCollapse
        } else if hull.health == 0 {
            DestructionCause::HullBreached
        } else {
            return Ok(());
        };

        hull.destroyed = Some(cause);
        error!("Platform destroyed: {}", cause);
        Err(PlatformError::Destroyed(cause))
    }

    pub fn status(&self) -> PlatformStatus {
        let (hull_health, destroyed) = {
            let hull = self.hull.lock();
            (hull.health, hull.destroyed.is_some())
        };
        let components = vec![
            ComponentStatus::of(self.reactor.as_ref()),
            ComponentStatus::of(self.shield.as_ref()),
            ComponentStatus::of(self.cannon.as_ref()),
        ];
        let component_health = components
            .iter()
            .fold(0u32, |total, c| total.saturating_add(c.health_level));

        PlatformStatus {
            hull_health,
            max_hull_health: self.max_hull_health,
            health_level: hull_health.saturating_add(component_health),
            shield_level: self.shield.shield_level(),
            destroyed,
            components,
        }
    }
}
