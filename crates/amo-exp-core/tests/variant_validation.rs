use amo_exp_core::{ExperimentId, Variant, VariantSet, MAX_VARIANT_ID_LEN, NOT_IN_EXPERIMENT};

fn code_of(variants: Vec<Variant>) -> String {
    VariantSet::new(variants).unwrap_err().info().code.clone()
}

#[test]
fn weights_just_under_one_are_rejected() {
    let err = VariantSet::new(vec![Variant::new("a", 0.5), Variant::new("b", 0.499999)])
        .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.info().code, "exp.variant_weight_sum");
    assert!(err.info().context["sum"].starts_with("0.99999"));
}

#[test]
fn weights_just_over_one_are_rejected() {
    let err = VariantSet::new(vec![Variant::new("a", 0.5), Variant::new("b", 0.500002)])
        .unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.info().code, "exp.variant_weight_sum");
}

#[test]
fn float_noise_within_tolerance_is_accepted() {
    let set = VariantSet::new(vec![
        Variant::new("a", 0.1),
        Variant::new("b", 0.2),
        Variant::new("c", 0.7),
    ])
    .unwrap();
    assert_eq!(set.len(), 3);
    assert_eq!(set.ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn variant_id_length_limit_is_fifty_characters() {
    let fifty = "x".repeat(MAX_VARIANT_ID_LEN);
    assert!(VariantSet::new(vec![Variant::new(fifty, 1.0)]).is_ok());

    let fifty_one = "x".repeat(MAX_VARIANT_ID_LEN + 1);
    let err = VariantSet::new(vec![Variant::new(fifty_one.clone(), 1.0)]).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.info().code, "exp.variant_id_length");
    assert_eq!(err.info().context["id"], fifty_one);
}

#[test]
fn empty_and_duplicate_ids_are_rejected() {
    assert_eq!(code_of(vec![Variant::new("", 1.0)]), "exp.variant_id_empty");
    assert_eq!(
        code_of(vec![Variant::new("a", 0.5), Variant::new("a", 0.5)]),
        "exp.variant_id_duplicate"
    );
}

#[test]
fn weights_outside_unit_interval_are_rejected() {
    assert_eq!(
        code_of(vec![Variant::new("a", 0.0), Variant::new("b", 1.0)]),
        "exp.variant_weight_range"
    );
    assert_eq!(
        code_of(vec![Variant::new("a", 1.5), Variant::new("b", -0.5)]),
        "exp.variant_weight_range"
    );
    assert_eq!(code_of(vec![Variant::new("a", f64::NAN)]), "exp.variant_weight_range");
}

#[test]
fn empty_variant_list_fails_on_sum() {
    assert_eq!(code_of(Vec::new()), "exp.variant_weight_sum");
}

#[test]
fn sentinel_may_reserve_a_share() {
    let set = VariantSet::new(vec![
        Variant::new("variant-a", 0.2),
        Variant::new("variant-b", 0.2),
        Variant::new(NOT_IN_EXPERIMENT, 0.6),
    ])
    .unwrap();
    assert!(set.contains(NOT_IN_EXPERIMENT));
}

#[test]
fn experiment_ids_must_be_date_prefixed() {
    assert_eq!(
        ExperimentId::parse("20210101_amo_test").unwrap().as_str(),
        "20210101_amo_test"
    );
    for bad in ["amo_test", "2021010_amo_test", "20210101_amo_", "x20210101_amo_test"] {
        let err = ExperimentId::parse(bad).unwrap_err();
        assert_eq!(err.info().code, "exp.experiment_id_pattern", "id {bad}");
    }
}

#[test]
fn experiment_ids_are_bounded() {
    let prefix = "20210101_amo_";
    let fits = format!("{prefix}{}", "y".repeat(50 - prefix.len()));
    assert!(ExperimentId::parse(&fits).is_ok());

    let too_long = format!("{fits}y");
    let err = ExperimentId::parse(&too_long).unwrap_err();
    assert_eq!(err.info().code, "exp.experiment_id_length");
}
