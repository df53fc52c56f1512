use amo_exp_gate::{ExperimentConfig, ExperimentCookie, ExperimentToggles};

#[test]
fn missing_cookie_decodes_to_empty_payload() {
    let cookie = ExperimentCookie::decode(None);
    assert!(cookie.is_empty());
    assert_eq!(cookie.encode().unwrap(), "{}");
}

#[test]
fn unreadable_cookie_decodes_to_empty_payload() {
    for raw in ["", "not json", "[1,2]", "\"a string\""] {
        assert!(ExperimentCookie::decode(Some(raw)).is_empty(), "raw {raw:?}");
        assert!(ExperimentCookie::parse(raw).is_err(), "raw {raw:?}");
    }
}

#[test]
fn reads_current_and_legacy_entries() {
    let cookie = ExperimentCookie::parse(
        r#"{"20210101_amo_new":{"variantId":"a"},"20190101_amo_old":"b","20200101_amo_bad":7}"#,
    )
    .unwrap();
    assert_eq!(cookie.variant_for("20210101_amo_new").as_deref(), Some("a"));
    assert_eq!(cookie.variant_for("20190101_amo_old").as_deref(), Some("b"));
    assert_eq!(cookie.variant_for("20200101_amo_bad"), None);
    assert!(!cookie.contains("20200101_amo_bad"));
    assert_eq!(cookie.variant_for("20220101_amo_absent"), None);
    assert_eq!(cookie.len(), 3);
}

#[test]
fn empty_variant_id_counts_as_absent() {
    let cookie = ExperimentCookie::parse(
        r#"{"20210101_amo_current":{"variantId":""},"20200101_amo_legacy":""}"#,
    )
    .unwrap();

    assert_eq!(cookie.variant_for("20210101_amo_current"), None);
    assert_eq!(cookie.variant_for("20200101_amo_legacy"), None);
    assert!(!cookie.contains("20210101_amo_current"));
    assert_eq!(cookie.len(), 2);
}

#[test]
fn replacing_an_entry_keeps_its_siblings_verbatim() {
    let mut cookie = ExperimentCookie::parse(
        r#"{"20210101_amo_test":{"variantId":"a"},"20200505_amo_other":{"variantId" :"y","extra":true}}"#,
    )
    .unwrap();
    cookie.set_variant("20210101_amo_test", "b").unwrap();

    assert_eq!(
        cookie.raw_entry("20200505_amo_other"),
        Some(r#"{"variantId" :"y","extra":true}"#)
    );
    assert_eq!(
        cookie.encode().unwrap(),
        r#"{"20200505_amo_other":{"variantId" :"y","extra":true},"20210101_amo_test":{"variantId":"b"}}"#
    );
}

#[test]
fn pruning_removes_only_disabled_experiments() {
    let mut cookie = ExperimentCookie::parse(
        r#"{"20210101_amo_keep":{"variantId":"a"},"20200101_amo_drop":{"variantId":"b"}}"#,
    )
    .unwrap();
    let config = ExperimentToggles::new()
        .with("20210101_amo_keep", true)
        .with("20200101_amo_drop", false);

    let pruned = cookie.prune_disabled(&config);

    assert_eq!(pruned, vec!["20200101_amo_drop".to_string()]);
    assert_eq!(cookie.experiment_ids().collect::<Vec<_>>(), vec!["20210101_amo_keep"]);
}

#[test]
fn toggles_load_from_toml() {
    let toggles = ExperimentToggles::from_toml_str(
        r#"
[experiments]
"20210101_amo_test" = true
"20200101_amo_off" = false
"#,
    )
    .unwrap();
    assert!(toggles.is_experiment_enabled("20210101_amo_test"));
    assert!(!toggles.is_experiment_enabled("20200101_amo_off"));
    assert!(!toggles.is_experiment_enabled("20220101_amo_unknown"));
    assert!(ExperimentToggles::from_toml_str("").unwrap() == ExperimentToggles::new());
}
