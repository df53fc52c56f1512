use amo_exp_core::{ExperimentDefinition, Variant};
use amo_exp_gate::{
    evaluate, Collaborators, CookieJar, ExperimentToggles, MemoryCookieJar, MemoryVariantStore,
    RecordingTelemetry, EXPERIMENT_COOKIE_NAME,
};
use proptest::prelude::*;

const EXPERIMENT: &str = "20210101_amo_test";

proptest! {
    #[test]
    fn enrollment_never_disturbs_other_entries(
        other_variant in "[A-Za-z0-9 _-]{1,20}",
        sample in 0.0f64..1.0,
        excluded in any::<bool>(),
    ) {
        let definition = ExperimentDefinition::new(
            EXPERIMENT,
            vec![Variant::new("a", 0.25), Variant::new("b", 0.75)],
        )
        .unwrap();
        let other_entry = serde_json::json!({ "variantId": other_variant }).to_string();
        let payload = format!(r#"{{"20200505_amo_other":{other_entry}}}"#);
        let config = ExperimentToggles::new()
            .with(EXPERIMENT, true)
            .with("20200505_amo_other", true);
        let mut cookies = MemoryCookieJar::new().with_cookie(EXPERIMENT_COOKIE_NAME, payload.clone());
        let mut store = MemoryVariantStore::new();
        let mut telemetry = RecordingTelemetry::default();
        let mut collaborators = Collaborators {
            config: &config,
            cookies: &mut cookies,
            store: &mut store,
            telemetry: &mut telemetry,
        };

        let assignment = evaluate(&definition, &mut collaborators, || excluded, &mut || sample);
        let written = cookies.get(EXPERIMENT_COOKIE_NAME).unwrap();

        if excluded {
            prop_assert_eq!(written, payload);
            prop_assert!(telemetry.events.is_empty());
        } else {
            prop_assert!(["a", "b"].contains(&assignment.variant()));
            let expected = format!(r#""20200505_amo_other":{other_entry}"#);
            prop_assert!(written.contains(&expected));
            prop_assert_eq!(telemetry.events.len(), 1);
        }
    }
}
