//! Run labels and delete-me markers.
//!
//! A [`RunLabel`] is the `key=value` pair stamped on every container and image
//! a test run creates. Parallel runs use distinct values, so a sweep scoped to
//! one label never touches resources owned by another run. A [`DeleteMarker`]
//! is a label key whose presence alone flags a resource for reclamation.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Label key identifying the run that created a resource.
pub const DEFAULT_RUN_LABEL_KEY: &str = "io.labelsweep.test-worker";

/// Label key that flags a resource for unconditional reclamation.
pub const DEFAULT_DELETE_MARKER_KEY: &str = "io.labelsweep.delete-me";

/// Errors raised when building labels.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LabelError {
    /// A key or value was empty after trimming.
    #[error("{field} must not be blank")]
    Blank {
        /// Which part of the label was blank.
        field: String,
    },
    /// Label keys cannot contain `=`, otherwise `key=value` filters become
    /// ambiguous.
    #[error("label key {key:?} must not contain '='")]
    InvalidKey {
        /// Offending key.
        key: String,
    },
}

/// Key-value pair identifying all resources created by one test run.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RunLabel {
    key: String,
    value: String,
}

/// Derives the run label for `run_id` under [`DEFAULT_RUN_LABEL_KEY`].
///
/// This only builds a value; nothing is contacted and nothing global is set.
///
/// # Errors
///
/// Returns [`LabelError::Blank`] when `run_id` is blank.
pub fn begin(run_id: &str) -> Result<RunLabel, LabelError> {
    RunLabel::for_run(DEFAULT_RUN_LABEL_KEY, run_id)
}

impl RunLabel {
    /// Builds a label from `key` and `run_id`, trimming both.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError`] when either part is blank or the key contains
    /// `=`.
    pub fn for_run(key: impl Into<String>, run_id: impl Into<String>) -> Result<Self, LabelError> {
        let trimmed_key = validate_key(key.into())?;
        let trimmed_value = run_id.into().trim().to_owned();
        if trimmed_value.is_empty() {
            return Err(LabelError::Blank {
                field: String::from("run_id"),
            });
        }
        Ok(Self {
            key: trimmed_key,
            value: trimmed_value,
        })
    }

    /// Builds a label for a fresh, randomly generated run id.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError`] when `key` is invalid.
    pub fn generate(key: impl Into<String>) -> Result<Self, LabelError> {
        Self::for_run(key, Uuid::new_v4().simple().to_string())
    }

    /// Label key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Label value (the run id).
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Renders the `key=value` form accepted by container runtime filters.
    #[must_use]
    pub fn filter(&self) -> String {
        format!("{}={}", self.key, self.value)
    }

    /// Returns `true` when `labels` carry this key with exactly this value.
    #[must_use]
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        labels.get(&self.key).is_some_and(|value| *value == self.value)
    }

    /// Adds this label to a label map destined for a new resource.
    pub fn stamp(&self, labels: &mut BTreeMap<String, String>) {
        labels.insert(self.key.clone(), self.value.clone());
    }
}

impl fmt::Display for RunLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Label key whose presence, with any value, marks a resource for deletion.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DeleteMarker {
    key: String,
}

impl DeleteMarker {
    /// Builds a marker, trimming the key.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError`] when the key is blank or contains `=`.
    pub fn new(key: impl Into<String>) -> Result<Self, LabelError> {
        Ok(Self {
            key: validate_key(key.into())?,
        })
    }

    /// Marker key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Presence check only: an empty value still counts.
    #[must_use]
    pub fn is_present(&self, labels: &BTreeMap<String, String>) -> bool {
        labels.contains_key(&self.key)
    }

    /// Adds the marker (with an empty value) to a label map.
    pub fn stamp(&self, labels: &mut BTreeMap<String, String>) {
        labels.insert(self.key.clone(), String::new());
    }
}

impl Default for DeleteMarker {
    fn default() -> Self {
        Self {
            key: DEFAULT_DELETE_MARKER_KEY.to_owned(),
        }
    }
}

fn validate_key(key: String) -> Result<String, LabelError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(LabelError::Blank {
            field: String::from("label key"),
        });
    }
    if trimmed.contains('=') {
        return Err(LabelError::InvalidKey {
            key: trimmed.to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}
