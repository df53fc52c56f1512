//! Boundary traits consumed by the gate, plus in-memory implementations used
//! by the CLI and by tests.

use std::collections::BTreeMap;

use amo_exp_core::errors::ExpError;
use amo_exp_core::serde::from_toml_str;
use amo_exp_core::CookieOptions;
use log::info;
use serde::{Deserialize, Serialize};

/// Answers whether an experiment is switched on by configuration.
pub trait ExperimentConfig {
    /// Returns true when the experiment is enabled.
    fn is_experiment_enabled(&self, experiment_id: &str) -> bool;
}

/// Reads and writes the raw value of request cookies.
///
/// Values are the decoded cookie strings; transport encoding is the jar's
/// concern.
pub trait CookieJar {
    /// Returns the value of the named cookie, if the request carries it.
    fn get(&self, name: &str) -> Option<String>;

    /// Writes the named cookie with the given options.
    fn set(&mut self, name: &str, value: String, options: &CookieOptions);
}

/// Transient per-process store mirroring assignments made during a render.
pub trait VariantStore {
    /// Returns the variant stored for the experiment, if any.
    fn get_stored_variant(&self, experiment_id: &str) -> Option<String>;

    /// Records the variant assigned to the experiment.
    fn store_variant(&mut self, experiment_id: &str, variant_id: &str);
}

/// Analytics event emitted on enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Event category.
    pub category: String,
    /// Event action.
    pub action: String,
    /// Optional label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Sink for analytics events. Delivery failures are the sink's problem.
pub trait Telemetry {
    /// Sends one event.
    fn send_event(&mut self, event: TrackingEvent);

    /// Sets a custom analytics dimension for subsequent hits.
    fn set_dimension(&mut self, _dimension: &str, _value: &str) {}
}

/// Experiment switches loaded from configuration.
///
/// Only an explicit `true` enables an experiment; missing ids are disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentToggles {
    #[serde(default)]
    experiments: BTreeMap<String, bool>,
}

impl ExperimentToggles {
    /// Creates a toggle set with nothing enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `[experiments]` TOML table.
    pub fn from_toml_str(input: &str) -> Result<Self, ExpError> {
        from_toml_str(input)
    }

    /// Returns the toggles with the given experiment switched on or off.
    pub fn with(mut self, experiment_id: impl Into<String>, enabled: bool) -> Self {
        self.set(experiment_id, enabled);
        self
    }

    /// Switches an experiment on or off.
    pub fn set(&mut self, experiment_id: impl Into<String>, enabled: bool) {
        self.experiments.insert(experiment_id.into(), enabled);
    }
}

impl ExperimentConfig for ExperimentToggles {
    fn is_experiment_enabled(&self, experiment_id: &str) -> bool {
        self.experiments.get(experiment_id).copied().unwrap_or(false)
    }
}

/// A cookie write captured by [`MemoryCookieJar`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieWrite {
    /// Cookie name.
    pub name: String,
    /// Value written.
    pub value: String,
    /// Options supplied with the write.
    pub options: CookieOptions,
}

/// Cookie jar backed by a map, recording every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieJar {
    values: BTreeMap<String, String>,
    writes: Vec<CookieWrite>,
}

impl MemoryCookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the jar preloaded with a cookie, without recording a write.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Writes performed through [`CookieJar::set`], oldest first.
    pub fn writes(&self) -> &[CookieWrite] {
        &self.writes
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: String, options: &CookieOptions) {
        self.values.insert(name.to_string(), value.clone());
        self.writes.push(CookieWrite {
            name: name.to_string(),
            value,
            options: options.clone(),
        });
    }
}

/// Variant store backed by a map, counting writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryVariantStore {
    variants: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryVariantStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store preloaded with a variant, without counting a write.
    pub fn with_variant(mut self, experiment_id: &str, variant_id: &str) -> Self {
        self.variants
            .insert(experiment_id.to_string(), variant_id.to_string());
        self
    }

    /// Number of [`VariantStore::store_variant`] calls.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl VariantStore for MemoryVariantStore {
    fn get_stored_variant(&self, experiment_id: &str) -> Option<String> {
        self.variants.get(experiment_id).cloned()
    }

    fn store_variant(&mut self, experiment_id: &str, variant_id: &str) {
        self.variants
            .insert(experiment_id.to_string(), variant_id.to_string());
        self.writes += 1;
    }
}

/// Telemetry sink that keeps everything it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    /// Events in the order they were sent.
    pub events: Vec<TrackingEvent>,
    /// Dimensions in the order they were set.
    pub dimensions: Vec<(String, String)>,
}

impl Telemetry for RecordingTelemetry {
    fn send_event(&mut self, event: TrackingEvent) {
        self.events.push(event);
    }

    fn set_dimension(&mut self, dimension: &str, value: &str) {
        self.dimensions
            .push((dimension.to_string(), value.to_string()));
    }
}

/// Telemetry sink that writes events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn send_event(&mut self, event: TrackingEvent) {
        info!(
            "event=telemetry_send module=telemetry category=\"{}\" action={} label={}",
            event.category,
            event.action,
            event.label.as_deref().unwrap_or("-")
        );
    }

    fn set_dimension(&mut self, dimension: &str, value: &str) {
        info!("event=telemetry_dimension module=telemetry dimension={dimension} value={value}");
    }
}
