//! Codec for the shared experiments cookie.
//!
//! The cookie value is a JSON object keyed by experiment id, each entry
//! `{"variantId": "..."}`. Entries are held as raw JSON so that rewriting the
//! payload for one experiment leaves every other entry byte-for-byte intact.

use std::collections::BTreeMap;

use amo_exp_core::errors::{ErrorInfo, ExpError};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::value::{to_raw_value, RawValue};

use crate::collaborators::ExperimentConfig;

/// Name of the cookie holding every active experiment assignment.
pub const EXPERIMENT_COOKIE_NAME: &str = "frontend_active_experiments";

#[derive(Debug, Serialize)]
struct CookieEntry<'a> {
    #[serde(rename = "variantId")]
    variant_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Current {
        #[serde(rename = "variantId")]
        variant_id: String,
    },
    // Older payloads stored the variant id directly.
    Legacy(String),
}

/// Decoded experiments cookie.
#[derive(Debug, Clone, Default)]
pub struct ExperimentCookie {
    entries: BTreeMap<String, Box<RawValue>>,
}

impl ExperimentCookie {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a cookie value, failing on anything that is not a JSON object.
    pub fn parse(raw: &str) -> Result<Self, ExpError> {
        let entries = serde_json::from_str(raw).map_err(|err| {
            ExpError::Serde(
                ErrorInfo::new("exp.cookie_decode", "experiments cookie is not a JSON object")
                    .with_hint(err.to_string()),
            )
        })?;
        Ok(Self { entries })
    }

    /// Decodes the cookie as read from the jar.
    ///
    /// A missing cookie is an empty payload. So is an unreadable one: it is
    /// logged and replaced on the next write.
    pub fn decode(raw: Option<&str>) -> Self {
        match raw {
            None => Self::default(),
            Some(value) => Self::parse(value).unwrap_or_else(|err| {
                warn!("event=cookie_decode module=cookie status=error error=\"{err}\"");
                Self::default()
            }),
        }
    }

    /// Returns the variant recorded for the experiment.
    ///
    /// An entry of an unknown shape or with an empty variant id counts as
    /// absent.
    pub fn variant_for(&self, experiment_id: &str) -> Option<String> {
        let raw = self.entries.get(experiment_id)?;
        match serde_json::from_str::<StoredEntry>(raw.get()) {
            Ok(StoredEntry::Current { variant_id }) | Ok(StoredEntry::Legacy(variant_id))
                if !variant_id.is_empty() =>
            {
                Some(variant_id)
            }
            Ok(_) => {
                warn!(
                    "event=cookie_entry module=cookie status=empty_variant experiment={experiment_id}"
                );
                None
            }
            Err(err) => {
                warn!(
                    "event=cookie_entry module=cookie status=unreadable experiment={experiment_id} error=\"{err}\""
                );
                None
            }
        }
    }

    /// Returns true when a readable entry exists for the experiment.
    pub fn contains(&self, experiment_id: &str) -> bool {
        self.variant_for(experiment_id).is_some()
    }

    /// Records a variant, replacing any previous entry for the experiment.
    pub fn set_variant(&mut self, experiment_id: &str, variant_id: &str) -> Result<(), ExpError> {
        let raw = to_raw_value(&CookieEntry { variant_id }).map_err(|err| {
            ExpError::Serde(
                ErrorInfo::new("exp.cookie_entry", "failed to encode cookie entry")
                    .with_context("experiment", experiment_id)
                    .with_hint(err.to_string()),
            )
        })?;
        self.entries.insert(experiment_id.to_string(), raw);
        Ok(())
    }

    /// Drops entries for experiments the configuration no longer enables and
    /// returns their ids.
    pub fn prune_disabled(&mut self, config: &dyn ExperimentConfig) -> Vec<String> {
        let disabled: Vec<String> = self
            .entries
            .keys()
            .filter(|id| !config.is_experiment_enabled(id))
            .cloned()
            .collect();
        for id in &disabled {
            self.entries.remove(id);
        }
        disabled
    }

    /// Experiment ids present in the payload, in key order.
    pub fn experiment_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Raw JSON of the entry for the experiment.
    pub fn raw_entry(&self, experiment_id: &str) -> Option<&str> {
        self.entries.get(experiment_id).map(|raw| raw.get())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the payload holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes the payload as the cookie value.
    pub fn encode(&self) -> Result<String, ExpError> {
        serde_json::to_string(&self.entries).map_err(|err| {
            ExpError::Serde(
                ErrorInfo::new("exp.cookie_encode", "failed to encode experiments cookie")
                    .with_hint(err.to_string()),
            )
        })
    }
}
