use std::error::Error;
use std::fs;
use std::path::PathBuf;

use amo_exp_core::{RandomSource, RngHandle};
use amo_exp_gate::{
    evaluate, AssignmentSource, Collaborators, CookieJar, CookieWrite, ExperimentToggles,
    ExperimentView, MemoryCookieJar, MemoryVariantStore, RecordingTelemetry, TrackingEvent,
    EXPERIMENT_COOKIE_NAME,
};
use clap::Args;
use serde::Serialize;

use super::{load_definition, print_json};

#[derive(Args, Debug)]
pub struct AssignArgs {
    /// TOML experiment definition.
    #[arg(long)]
    pub definition: PathBuf,
    /// TOML `[experiments]` toggles. Without it only this experiment is enabled.
    #[arg(long)]
    pub toggles: Option<PathBuf>,
    /// Current value of the experiments cookie.
    #[arg(long)]
    pub cookie: Option<String>,
    /// Variant already held in the in-memory store.
    #[arg(long)]
    pub stored: Option<String>,
    /// Treat the request as excluded from the experiment.
    #[arg(long)]
    pub excluded: bool,
    /// Seed for the sampler; OS entropy is used when omitted.
    #[arg(long, conflicts_with = "sample")]
    pub seed: Option<u64>,
    /// Fixed sample in [0, 1) used instead of a random draw.
    #[arg(long, value_parser = parse_unit_sample)]
    pub sample: Option<f64>,
}

fn parse_unit_sample(raw: &str) -> Result<f64, String> {
    let sample: f64 = raw
        .parse()
        .map_err(|err| format!("`{raw}` is not a number: {err}"))?;
    if !sample.is_finite() || !(0.0..1.0).contains(&sample) {
        return Err(format!("sample must lie in [0, 1), got {raw}"));
    }
    Ok(sample)
}

#[derive(Debug, Serialize)]
struct AssignReport {
    view: ExperimentView,
    source: AssignmentSource,
    cookie: Option<String>,
    cookie_writes: Vec<CookieWrite>,
    events: Vec<TrackingEvent>,
    dimensions: Vec<(String, String)>,
}

pub fn run(args: &AssignArgs) -> Result<(), Box<dyn Error>> {
    let definition = load_definition(&args.definition)?;
    let config = match &args.toggles {
        Some(path) => ExperimentToggles::from_toml_str(&fs::read_to_string(path)?)?,
        None => ExperimentToggles::new().with(definition.id().as_str(), true),
    };
    let mut cookies = match &args.cookie {
        Some(value) => MemoryCookieJar::new().with_cookie(EXPERIMENT_COOKIE_NAME, value.clone()),
        None => MemoryCookieJar::new(),
    };
    let mut store = match &args.stored {
        Some(variant) => {
            MemoryVariantStore::new().with_variant(definition.id().as_str(), variant)
        }
        None => MemoryVariantStore::new(),
    };
    let mut telemetry = RecordingTelemetry::default();
    let mut random: Box<dyn RandomSource> = match (args.sample, args.seed) {
        (Some(sample), _) => Box::new(move || sample),
        (None, Some(seed)) => Box::new(RngHandle::for_experiment(seed, definition.id().as_str())),
        (None, None) => Box::new(RngHandle::from_entropy()),
    };

    let mut collaborators = Collaborators {
        config: &config,
        cookies: &mut cookies,
        store: &mut store,
        telemetry: &mut telemetry,
    };
    let excluded = args.excluded;
    let assignment = evaluate(&definition, &mut collaborators, || excluded, random.as_mut());

    let report = AssignReport {
        view: assignment.view(),
        source: assignment.source(),
        cookie: cookies.get(EXPERIMENT_COOKIE_NAME),
        cookie_writes: cookies.writes().to_vec(),
        events: telemetry.events,
        dimensions: telemetry.dimensions,
    };
    print_json(&report)
}
