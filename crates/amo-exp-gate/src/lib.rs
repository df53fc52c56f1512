//! Experiment membership gate: decides whether a request takes part in an
//! experiment and which variant it sees, persisting the answer in the shared
//! experiments cookie.
//!
//! The gate is a plain function over explicit collaborators (configuration,
//! cookie jar, in-memory store, telemetry). Call [`evaluate`] once per
//! request or render.

pub mod collaborators;
pub mod cookie;
pub mod gate;

pub use collaborators::{
    CookieJar, CookieWrite, ExperimentConfig, ExperimentToggles, LogTelemetry, MemoryCookieJar,
    MemoryVariantStore, RecordingTelemetry, Telemetry, TrackingEvent, VariantStore,
};
pub use cookie::{ExperimentCookie, EXPERIMENT_COOKIE_NAME};
pub use gate::{
    evaluate, Assignment, AssignmentSource, Collaborators, ExperimentView,
    EXPERIMENT_ENROLLMENT_CATEGORY, EXPERIMENT_ID_DIMENSION, EXPERIMENT_VARIATION_DIMENSION,
};
