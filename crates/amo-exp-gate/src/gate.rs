//! Per-request experiment evaluation.
//!
//! Precedence, highest first:
//! 1. an entry in the experiments cookie, used verbatim;
//! 2. the experiment disabled by configuration: not in experiment;
//! 3. a variant already in the in-memory store;
//! 4. the exclusion rule: not in experiment;
//! 5. a fresh sample from the variant set.
//!
//! Cases 3 and 5 write the cookie (pruning disabled experiments on the way)
//! and send the enrollment event, since the cookie did not yet record the
//! experiment. Case 5 also fills the in-memory store.

use amo_exp_core::{ExperimentDefinition, ExperimentId, RandomSource, NOT_IN_EXPERIMENT};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::collaborators::{CookieJar, ExperimentConfig, Telemetry, TrackingEvent, VariantStore};
use crate::cookie::{ExperimentCookie, EXPERIMENT_COOKIE_NAME};

/// Category prefix of enrollment events; the experiment id is appended.
pub const EXPERIMENT_ENROLLMENT_CATEGORY: &str = "AMO Experiment Enrollment -";
/// Analytics dimension carrying the experiment id.
pub const EXPERIMENT_ID_DIMENSION: &str = "dimension8";
/// Analytics dimension carrying the variant id.
pub const EXPERIMENT_VARIATION_DIMENSION: &str = "dimension9";

/// The collaborators one evaluation reads from and writes to.
pub struct Collaborators<'a> {
    /// Experiment switches.
    pub config: &'a dyn ExperimentConfig,
    /// Request cookies.
    pub cookies: &'a mut dyn CookieJar,
    /// In-memory assignment store.
    pub store: &'a mut dyn VariantStore,
    /// Analytics sink.
    pub telemetry: &'a mut dyn Telemetry,
}

/// Where an assignment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    /// Read from the experiments cookie.
    Cookie,
    /// Read from the in-memory store and persisted to the cookie.
    Store,
    /// Sampled from the variant set during this evaluation.
    Sampled,
    /// Experiment switched off by configuration.
    Disabled,
    /// User excluded by the exclusion rule.
    Excluded,
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    experiment_id: ExperimentId,
    variant: String,
    source: AssignmentSource,
    enabled: bool,
}

impl Assignment {
    fn new(
        experiment_id: &ExperimentId,
        variant: impl Into<String>,
        source: AssignmentSource,
        enabled: bool,
    ) -> Self {
        Self {
            experiment_id: experiment_id.clone(),
            variant: variant.into(),
            source,
            enabled,
        }
    }

    /// Experiment the assignment belongs to.
    pub fn experiment_id(&self) -> &ExperimentId {
        &self.experiment_id
    }

    /// Resolved variant id, possibly [`NOT_IN_EXPERIMENT`].
    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// How the variant was resolved.
    pub fn source(&self) -> AssignmentSource {
        self.source
    }

    /// Whether configuration enabled the experiment at evaluation time.
    pub fn is_experiment_enabled(&self) -> bool {
        self.enabled
    }

    /// True when the variant is a real branch rather than the sentinel.
    pub fn is_user_in_experiment(&self) -> bool {
        self.variant != NOT_IN_EXPERIMENT
    }

    /// The props a renderer receives for this experiment.
    pub fn view(&self) -> ExperimentView {
        ExperimentView {
            experiment_id: self.experiment_id.to_string(),
            is_experiment_enabled: self.enabled,
            is_user_in_experiment: self.is_user_in_experiment(),
            variant: self.variant.clone(),
        }
    }
}

/// Experiment state handed to rendering code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentView {
    /// Experiment id.
    pub experiment_id: String,
    /// Whether configuration enables the experiment.
    pub is_experiment_enabled: bool,
    /// Whether the user sees a real branch.
    pub is_user_in_experiment: bool,
    /// Resolved variant id.
    pub variant: String,
}

/// Resolves the variant for `definition` in the current request.
///
/// `is_excluded` is only called when the decision actually depends on it, and
/// `random` is drawn from at most once.
pub fn evaluate<E, R>(
    definition: &ExperimentDefinition,
    collaborators: &mut Collaborators<'_>,
    is_excluded: E,
    random: &mut R,
) -> Assignment
where
    E: FnOnce() -> bool,
    R: RandomSource + ?Sized,
{
    let id = definition.id();
    let enabled = collaborators.config.is_experiment_enabled(id.as_str());
    let raw_cookie = collaborators.cookies.get(EXPERIMENT_COOKIE_NAME);
    let mut cookie = ExperimentCookie::decode(raw_cookie.as_deref());

    if let Some(variant) = cookie.variant_for(id.as_str()) {
        debug!("event=experiment_assign module=gate source=cookie experiment={id} variant={variant}");
        let assignment = Assignment::new(id, variant, AssignmentSource::Cookie, enabled);
        set_dimensions(collaborators.telemetry, &assignment);
        return assignment;
    }

    if !enabled {
        debug!("event=experiment_assign module=gate source=disabled experiment={id}");
        return Assignment::new(id, NOT_IN_EXPERIMENT, AssignmentSource::Disabled, false);
    }

    let assignment = match collaborators.store.get_stored_variant(id.as_str()) {
        Some(variant) => Assignment::new(id, variant, AssignmentSource::Store, true),
        None => {
            if is_excluded() {
                debug!("event=experiment_assign module=gate source=excluded experiment={id}");
                return Assignment::new(id, NOT_IN_EXPERIMENT, AssignmentSource::Excluded, true);
            }
            let variant = definition.variants().sample(random).to_string();
            collaborators.store.store_variant(id.as_str(), &variant);
            Assignment::new(id, variant, AssignmentSource::Sampled, true)
        }
    };

    persist(definition, collaborators, &mut cookie, &assignment);
    if assignment.is_user_in_experiment() {
        info!(
            "event=experiment_enroll module=gate experiment={id} variant={} source={:?}",
            assignment.variant, assignment.source
        );
        collaborators.telemetry.send_event(TrackingEvent {
            category: format!("{EXPERIMENT_ENROLLMENT_CATEGORY} {id}"),
            action: assignment.variant.clone(),
            label: None,
        });
    }
    set_dimensions(collaborators.telemetry, &assignment);
    assignment
}

fn persist(
    definition: &ExperimentDefinition,
    collaborators: &mut Collaborators<'_>,
    cookie: &mut ExperimentCookie,
    assignment: &Assignment,
) {
    let id = definition.id().as_str();
    for pruned in cookie.prune_disabled(collaborators.config) {
        debug!("event=cookie_prune module=gate experiment={pruned}");
    }
    let encoded = cookie
        .set_variant(id, &assignment.variant)
        .and_then(|()| cookie.encode());
    match encoded {
        Ok(value) => collaborators.cookies.set(
            EXPERIMENT_COOKIE_NAME,
            value,
            definition.cookie_options(),
        ),
        Err(err) => {
            warn!("event=cookie_write module=gate status=dropped experiment={id} error=\"{err}\"")
        }
    }
}

fn set_dimensions(telemetry: &mut dyn Telemetry, assignment: &Assignment) {
    if assignment.is_user_in_experiment() {
        telemetry.set_dimension(EXPERIMENT_ID_DIMENSION, assignment.experiment_id.as_str());
        telemetry.set_dimension(EXPERIMENT_VARIATION_DIMENSION, &assignment.variant);
    }
}
