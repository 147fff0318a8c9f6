//! Algebraic laws of the trait lattice, checked over every value reachable from the named
//! points.

use privscan_analysis::{TraitId, TraitSet};
use proptest::prelude::*;

fn named_point() -> impl Strategy<Value = TraitSet> {
    prop::sample::select(TraitId::ALL.to_vec()).prop_map(TraitSet::from)
}

// Any meet of named points, which is every value the engine can produce.
fn trait_value() -> impl Strategy<Value = TraitSet> {
    prop::collection::vec(named_point(), 1..4).prop_map(|points| {
        points
            .into_iter()
            .fold(TraitSet::NO_ACCESS, |acc, point| acc & point)
    })
}

proptest! {
    #[test]
    fn meet_is_commutative(a in trait_value(), b in trait_value()) {
        prop_assert_eq!(a & b, b & a);
    }

    #[test]
    fn meet_is_associative(a in trait_value(), b in trait_value(), c in trait_value()) {
        prop_assert_eq!((a & b) & c, a & (b & c));
    }

    #[test]
    fn meet_is_idempotent(a in trait_value()) {
        prop_assert_eq!(a & a, a);
    }

    #[test]
    fn join_is_commutative(a in trait_value(), b in trait_value()) {
        prop_assert_eq!(a | b, b | a);
    }

    #[test]
    fn join_is_associative(a in trait_value(), b in trait_value(), c in trait_value()) {
        prop_assert_eq!((a | b) | c, a | (b | c));
    }

    #[test]
    fn join_is_idempotent(a in trait_value()) {
        prop_assert_eq!(a | a, a);
    }

    #[test]
    fn meet_and_join_absorb(a in trait_value(), b in trait_value()) {
        prop_assert_eq!(a & (a | b), a);
        prop_assert_eq!(a | (a & b), a);
    }

    #[test]
    fn no_access_is_top(a in trait_value()) {
        prop_assert_eq!(a & TraitSet::NO_ACCESS, a);
        prop_assert_eq!(a | TraitSet::NO_ACCESS, TraitSet::NO_ACCESS);
    }

    #[test]
    fn dependency_is_a_fixed_point(a in trait_value()) {
        let narrowed = TraitSet::DEPENDENCY & a;
        prop_assert!(narrowed.is(TraitId::Dependency));
        prop_assert_eq!(narrowed & a, narrowed);
    }

    #[test]
    fn meet_only_narrows(a in trait_value(), b in trait_value()) {
        let narrowed = a & b;
        prop_assert!(narrowed.is_below(&a));
        prop_assert!(narrowed.is_below(&b));
        prop_assert!(a.is_below(&(a | b)));
    }
}

#[test]
fn meet_of_named_points_stays_in_lattice() {
    for a in TraitId::ALL {
        for b in TraitId::ALL {
            let value = TraitSet::from(a) & TraitSet::from(b);
            assert!(value.is_below(&TraitSet::from(a)), "{:?} & {:?}", a, b);
            assert!(value.is_below(&TraitSet::from(b)), "{:?} & {:?}", a, b);
        }
    }
}
