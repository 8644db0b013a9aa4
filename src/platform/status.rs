//! Serializable snapshot of the platform gauges

use serde::Serialize;

use crate::components::Component;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentStatus {
    pub name: &'static str,
    pub health_level: u32,
    pub is_active: bool,
}

impl ComponentStatus {
    pub fn of<C: Component + ?Sized>(component: &C) -> Self {
        Self {
            name: component.name(),
            health_level: component.health_level(),
            is_active: component.is_active(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformStatus {
    pub hull_health: u32,
    pub max_hull_health: u32,
    /// Hull plus every component
    pub health_level: u32,
    pub shield_level: u32,
    pub destroyed: bool,
    pub components: Vec<ComponentStatus>,
}

impl PlatformStatus {
    /// Fraction of the hull left, 0.0 to 1.0
    pub fn hull_ratio(&self) -> f32 {
        if self.max_hull_health == 0 {
            return 0.0;
        }
        self.hull_health as f32 / self.max_hull_health as f32
    }
}
