#![deny(missing_docs)]
#![doc = "Experiment definitions, validation and weighted variant selection for AMO front-end experiments."]

pub mod errors;
pub mod rng;
pub mod selector;
pub mod serde;
pub mod variant;

pub use errors::{ErrorInfo, ExpError};
pub use rng::{derive_experiment_seed, RandomSource, RngHandle};
pub use selector::{pick_variant, select_variant};
pub use variant::{
    CookieOptions, ExperimentDefinition, ExperimentId, RawExperimentDefinition, SameSite, Variant,
    VariantSet, DEFAULT_COOKIE_MAX_AGE, MAX_EXPERIMENT_ID_LEN, MAX_VARIANT_ID_LEN,
    NOT_IN_EXPERIMENT, WEIGHT_EPSILON,
};
