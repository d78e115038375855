//! Property tests for the level-driven curves.

use core_config::ProfileConfig;
use core_effects::{Category, EffectRegistry};
use core_state::CorruptionProfile;
use proptest::prelude::*;

fn category() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

proptest! {
    #[test]
    fn probability_non_decreasing_in_level(a in 0.0f32..=100.0, b in 0.0f32..=100.0, c in category()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mut p = CorruptionProfile::default();
        p.set_level(lo);
        let p_lo = p.trigger_probability(c);
        p.set_level(hi);
        let p_hi = p.trigger_probability(c);
        prop_assert!(p_lo <= p_hi, "p({lo})={p_lo} > p({hi})={p_hi}");
        prop_assert!(p_hi < 1.0);
    }

    #[test]
    fn cooldown_non_increasing_in_level(a in 0.0f32..=100.0, b in 0.0f32..=100.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let reg = EffectRegistry::builtin();
        let mut p = CorruptionProfile::default();
        for d in reg.iter() {
            p.set_level(lo);
            let c_lo = p.cooldown_ticks(d);
            p.set_level(hi);
            let c_hi = p.cooldown_ticks(d);
            prop_assert!(c_hi <= c_lo, "{}: {c_hi} > {c_lo}", d.name);
        }
    }

    #[test]
    fn level_always_in_bounds(v in proptest::num::f32::ANY) {
        let mut p = CorruptionProfile::default();
        p.set_level(v);
        prop_assert!((0.0..=100.0).contains(&p.level()));
    }

    #[test]
    fn ceiling_never_reaches_one(ceiling in 0.0f64..5.0, floor in 0.0f64..5.0, curve in 0.1f64..8.0) {
        let cfg = ProfileConfig { ceiling, floor, curve, ..ProfileConfig::default() };
        let mut p = CorruptionProfile::from_config(&cfg);
        p.set_level(100.0);
        for c in Category::ALL {
            prop_assert!(p.trigger_probability(c) < 1.0);
        }
    }
}
