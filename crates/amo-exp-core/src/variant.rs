//! Experiment and variant definitions together with their setup-time checks.
//!
//! Everything here validates eagerly: a definition that exists has an id that
//! matches the naming pattern and a variant set whose weights sum to one.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, ExpError};

/// Reserved variant id meaning "the user is not enrolled".
pub const NOT_IN_EXPERIMENT: &str = "notInExperiment";
/// Maximum length, in characters, of a variant id.
pub const MAX_VARIANT_ID_LEN: usize = 50;
/// Maximum length, in characters, of an experiment id.
pub const MAX_EXPERIMENT_ID_LEN: usize = 50;
/// Allowed distance between the weight sum and one.
pub const WEIGHT_EPSILON: f64 = 1e-9;
/// Default cookie lifetime: 30 days in seconds.
pub const DEFAULT_COOKIE_MAX_AGE: u64 = 30 * 24 * 60 * 60;

static EXPERIMENT_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{8}_amo_.+$").expect("experiment id pattern is valid"));

fn config_error(code: &str, message: impl Into<String>) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

/// Date-prefixed experiment identifier, e.g. `20210101_amo_test`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExperimentId(String);

impl ExperimentId {
    /// Validates and wraps an experiment id.
    pub fn parse(raw: &str) -> Result<Self, ExpError> {
        let length = raw.chars().count();
        if length > MAX_EXPERIMENT_ID_LEN {
            return Err(ExpError::Configuration(
                config_error("exp.experiment_id_length", "experiment id is too long")
                    .with_context("id", raw)
                    .with_context("length", length.to_string())
                    .with_context("max", MAX_EXPERIMENT_ID_LEN.to_string()),
            ));
        }
        if !EXPERIMENT_ID_PATTERN.is_match(raw) {
            return Err(ExpError::Configuration(
                config_error(
                    "exp.experiment_id_pattern",
                    "experiment id does not match the naming pattern",
                )
                .with_context("id", raw)
                .with_hint("use YYYYMMDD_amo_<name>"),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExperimentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExperimentId {
    type Error = ExpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExperimentId> for String {
    fn from(value: ExperimentId) -> Self {
        value.0
    }
}

/// One named outcome of an experiment and the share of users it receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant identifier, at most [`MAX_VARIANT_ID_LEN`] characters.
    pub id: String,
    /// Fraction of users in `(0, 1]` assigned to this variant.
    #[serde(alias = "percentage")]
    pub weight: f64,
}

impl Variant {
    /// Creates a variant without validating it.
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }
}

/// Ordered, validated list of variants whose weights sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Variant>", into = "Vec<Variant>")]
pub struct VariantSet {
    variants: Vec<Variant>,
}

impl VariantSet {
    /// Validates the variants and wraps them.
    pub fn new(variants: Vec<Variant>) -> Result<Self, ExpError> {
        validate_variants(&variants)?;
        Ok(Self { variants })
    }

    /// Returns the variants in declaration order.
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Iterates over the variant ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.variants.iter().map(|variant| variant.id.as_str())
    }

    /// Returns true when the set contains the given variant id.
    pub fn contains(&self, id: &str) -> bool {
        self.ids().any(|candidate| candidate == id)
    }

    /// Number of variants in the set.
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Always false for a validated set; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl TryFrom<Vec<Variant>> for VariantSet {
    type Error = ExpError;

    fn try_from(value: Vec<Variant>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VariantSet> for Vec<Variant> {
    fn from(value: VariantSet) -> Self {
        value.variants
    }
}

/// Checks the variant id and weight constraints on a raw variant list.
pub(crate) fn validate_variants(variants: &[Variant]) -> Result<(), ExpError> {
    let mut seen = BTreeSet::new();
    for variant in variants {
        let length = variant.id.chars().count();
        if length == 0 {
            return Err(ExpError::Configuration(config_error(
                "exp.variant_id_empty",
                "variant id must not be empty",
            )));
        }
        if length > MAX_VARIANT_ID_LEN {
            return Err(ExpError::Configuration(
                config_error("exp.variant_id_length", "variant id is too long")
                    .with_context("id", variant.id.clone())
                    .with_context("length", length.to_string())
                    .with_context("max", MAX_VARIANT_ID_LEN.to_string()),
            ));
        }
        if !seen.insert(variant.id.as_str()) {
            return Err(ExpError::Configuration(
                config_error("exp.variant_id_duplicate", "variant id is listed twice")
                    .with_context("id", variant.id.clone()),
            ));
        }
        if !variant.weight.is_finite() || variant.weight <= 0.0 || variant.weight > 1.0 {
            return Err(ExpError::Configuration(
                config_error("exp.variant_weight_range", "variant weight must be in (0, 1]")
                    .with_context("id", variant.id.clone())
                    .with_context("weight", variant.weight.to_string()),
            ));
        }
    }
    let sum: f64 = variants.iter().map(|variant| variant.weight).sum();
    if (sum - 1.0).abs() > WEIGHT_EPSILON {
        return Err(ExpError::Configuration(
            config_error(
                "exp.variant_weight_sum",
                "the sum of all variant weights must be 1",
            )
            .with_context("sum", sum.to_string())
            .with_context("variants", variants.len().to_string()),
        ));
    }
    Ok(())
}

/// `SameSite` attribute written with the experiment cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// Cookie is only sent for same-site requests.
    Strict,
    /// Cookie is sent on top-level cross-site navigations.
    Lax,
    /// Cookie is sent on all requests.
    None,
}

/// Write options forwarded untouched to the cookie collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOptions {
    /// Lifetime of the cookie in seconds.
    pub max_age: Option<u64>,
    /// Path scope of the cookie.
    pub path: Option<String>,
    /// `SameSite` policy.
    pub same_site: Option<SameSite>,
    /// Restrict the cookie to secure transports.
    pub secure: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            max_age: Some(DEFAULT_COOKIE_MAX_AGE),
            path: Some("/".to_string()),
            same_site: Some(SameSite::Strict),
            secure: true,
        }
    }
}

/// Unvalidated experiment definition as it appears in a definition file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawExperimentDefinition {
    /// Experiment id, checked against the naming pattern on conversion.
    pub id: String,
    /// Variants, checked for id and weight constraints on conversion.
    pub variants: Vec<Variant>,
    /// Optional cookie write options; defaults apply when absent.
    #[serde(default)]
    pub cookie: Option<CookieOptions>,
}

/// A fully validated experiment: id, variants and cookie write options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExperimentDefinition")]
pub struct ExperimentDefinition {
    id: ExperimentId,
    variants: VariantSet,
    cookie: CookieOptions,
}

impl ExperimentDefinition {
    /// Validates the id and the variants, using default cookie options.
    pub fn new(id: &str, variants: Vec<Variant>) -> Result<Self, ExpError> {
        let id = ExperimentId::parse(id)?;
        let variants = VariantSet::new(variants)?;
        Ok(Self {
            id,
            variants,
            cookie: CookieOptions::default(),
        })
    }

    /// Replaces the cookie write options.
    pub fn with_cookie_options(mut self, cookie: CookieOptions) -> Self {
        self.cookie = cookie;
        self
    }

    /// Parses and validates a TOML definition.
    ///
    /// Syntax problems surface as [`ExpError::Serde`]; an id or variant set
    /// that parses but breaks a constraint surfaces as
    /// [`ExpError::Configuration`].
    pub fn from_toml_str(input: &str) -> Result<Self, ExpError> {
        let raw: RawExperimentDefinition = crate::serde::from_toml_str(input)?;
        Self::try_from(raw)
    }

    /// Experiment id.
    pub fn id(&self) -> &ExperimentId {
        &self.id
    }

    /// Validated variants.
    pub fn variants(&self) -> &VariantSet {
        &self.variants
    }

    /// Cookie write options.
    pub fn cookie_options(&self) -> &CookieOptions {
        &self.cookie
    }
}

impl TryFrom<RawExperimentDefinition> for ExperimentDefinition {
    type Error = ExpError;

    fn try_from(raw: RawExperimentDefinition) -> Result<Self, Self::Error> {
        let definition = Self::new(&raw.id, raw.variants)?;
        Ok(match raw.cookie {
            Some(cookie) => definition.with_cookie_options(cookie),
            None => definition,
        })
    }
}
