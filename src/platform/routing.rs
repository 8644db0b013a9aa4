//! Random distribution of incoming damage across targets

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::core::config::RoutingConfig;

/// Where a damage event landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DamageTarget {
    Reactor,
    ShieldGenerator,
    WeaponCannon,
    Hull,
}

impl DamageTarget {
    /// Components in draw order
    pub const COMPONENTS: [DamageTarget; 3] = [
        DamageTarget::Reactor,
        DamageTarget::ShieldGenerator,
        DamageTarget::WeaponCannon,
    ];

    /// Index past the last component selects the hull
    pub fn from_index(index: usize) -> Self {
        Self::COMPONENTS
            .get(index)
            .copied()
            .unwrap_or(DamageTarget::Hull)
    }
}

/// Draws a target for every damage event
#[derive(Debug)]
pub struct DamageRouter {
    rng: ChaCha8Rng,
    include_hull: bool,
}

impl DamageRouter {
    pub fn new(config: &RoutingConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            include_hull: config.include_hull,
        }
    }

    /// Uniform draw over the components, plus the hull when enabled
    pub fn next_target(&mut self) -> DamageTarget {
        let count = DamageTarget::COMPONENTS.len();
        let index = if self.include_hull {
            self.rng.gen_range(0..=count)
        } else {
            self.rng.gen_range(0..count)
        };
        DamageTarget::from_index(index)
    }
}
