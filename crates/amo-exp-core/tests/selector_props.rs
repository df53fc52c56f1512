use amo_exp_core::{pick_variant, select_variant, Variant, VariantSet};
use proptest::prelude::*;

fn normalized(raw: &[u32]) -> Vec<Variant> {
    let total: u32 = raw.iter().sum();
    raw.iter()
        .enumerate()
        .map(|(idx, share)| Variant::new(format!("v{idx}"), *share as f64 / total as f64))
        .collect()
}

proptest! {
    #[test]
    fn selection_always_returns_a_listed_variant(
        shares in prop::collection::vec(1u32..100, 1..8),
        sample in 0.0f64..1.0,
    ) {
        let variants = normalized(&shares);
        let set = VariantSet::new(variants.clone()).unwrap();
        let chosen = pick_variant(&set, sample);
        prop_assert!(variants.iter().any(|variant| variant.id == chosen));
    }

    #[test]
    fn selection_is_deterministic_for_a_fixed_sample(
        shares in prop::collection::vec(1u32..100, 1..8),
        sample in 0.0f64..1.0,
    ) {
        let variants = normalized(&shares);
        let first = select_variant(&variants, &mut || sample).unwrap().to_string();
        let second = select_variant(&variants, &mut || sample).unwrap().to_string();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn scaled_weights_are_configuration_errors(
        shares in prop::collection::vec(1u32..100, 2..8),
        drift in 1e-6f64..0.1,
        upward in any::<bool>(),
    ) {
        let factor = if upward { 1.0 + drift } else { 1.0 - drift };
        let variants: Vec<Variant> = normalized(&shares)
            .into_iter()
            .map(|variant| Variant::new(variant.id, variant.weight * factor))
            .collect();
        let err = VariantSet::new(variants).unwrap_err();
        prop_assert!(err.is_configuration());
    }

    #[test]
    fn variant_ids_up_to_fifty_chars_are_accepted(id in "[a-z0-9-]{1,50}") {
        prop_assert!(VariantSet::new(vec![Variant::new(id, 1.0)]).is_ok());
    }

    #[test]
    fn variant_ids_over_fifty_chars_are_rejected(id in "[a-z0-9-]{51,80}") {
        let err = VariantSet::new(vec![Variant::new(id, 1.0)]).unwrap_err();
        prop_assert_eq!(err.info().code.as_str(), "exp.variant_id_length");
    }
}
