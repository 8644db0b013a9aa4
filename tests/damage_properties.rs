//! Property tests for value objects and shield absorption

use std::sync::Arc;

use battle_station::{
    Damage, DamageType, Energy, PlatformError, Reactor, ShieldGenerator, ShieldProjector,
};
use battle_station::core::config::ShieldConfig;
use proptest::prelude::*;

fn damage_type() -> impl Strategy<Value = DamageType> {
    prop::sample::select(DamageType::ALL.to_vec())
}

fn shield() -> ShieldGenerator {
    ShieldGenerator::new(ShieldConfig::default(), Arc::new(Reactor::with_energy(0.0)))
}

proptest! {
    #[test]
    fn damage_accepts_non_negative_levels(level in 0i64..=u32::MAX as i64, kind in damage_type()) {
        let damage = Damage::new(level, kind).unwrap();
        prop_assert_eq!(damage.level() as i64, level);
        prop_assert_eq!(damage.kind(), kind);
    }

    #[test]
    fn damage_rejects_negative_levels(level in i64::MIN..0, kind in damage_type()) {
        let is_invalid_argument = matches!(Damage::new(level, kind), Err(PlatformError::InvalidArgument(_)));
        prop_assert!(is_invalid_argument);
    }

    #[test]
    fn energy_accepts_positive_levels(level in 1e-9f64..1e12) {
        prop_assert_eq!(Energy::new(level).unwrap().level(), level);
    }

    #[test]
    fn energy_rejects_non_positive_levels(level in -1e12f64..=0.0) {
        let is_invalid_argument = matches!(Energy::new(level), Err(PlatformError::InvalidArgument(_)));
        prop_assert!(is_invalid_argument);
    }

    #[test]
    fn residual_never_exceeds_incoming(level in 0i64..10_000, kind in damage_type()) {
        let shield = shield();
        let damage = Damage::new(level, kind).unwrap();

        if let Some(residual) = shield.absorb_damage(&damage) {
            prop_assert!(residual.level() <= damage.level());
            prop_assert!(residual.level() > 0);
            prop_assert_eq!(residual.kind(), kind);
        }
        prop_assert!(shield.shield_level() <= 100);
    }

    #[test]
    fn shield_level_only_drains(hits in prop::collection::vec((0i64..500, damage_type()), 1..40)) {
        let shield = shield();
        let mut previous = shield.shield_level();

        for (level, kind) in hits {
            shield.absorb_damage(&Damage::new(level, kind).unwrap());
            let current = shield.shield_level();
            prop_assert!(current <= previous);
            previous = current;
        }
    }
}
