//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::docker::DEFAULT_RUNTIME_BIN;
use crate::label::{DEFAULT_DELETE_MARKER_KEY, DEFAULT_RUN_LABEL_KEY, LabelError, RunLabel};

/// Environment variable holding the test run id. Read by the configuration
/// loader and by the CLI `--run-id` flag.
pub const RUN_ID_ENV: &str = "LABELSWEEP_RUN_ID";

/// Janitor settings merged from defaults, configuration files, and
/// environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "LABELSWEEP",
    discovery(
        app_name = "labelsweep",
        env_var = "LABELSWEEP_CONFIG_PATH",
        config_file_name = "labelsweep.toml",
        dotfile_name = ".labelsweep.toml",
        project_file_name = "labelsweep.toml"
    )
)]
pub struct JanitorConfig {
    /// Identifier of the test run. A random id is generated when absent.
    pub run_id: Option<String>,
    /// Label key stamped on resources created by a run.
    #[ortho_config(default = DEFAULT_RUN_LABEL_KEY.to_owned())]
    pub run_label_key: String,
    /// Label key whose presence marks a resource for unconditional removal.
    #[ortho_config(default = DEFAULT_DELETE_MARKER_KEY.to_owned())]
    pub delete_marker_key: String,
    /// Container runtime CLI (`docker` or `podman`).
    #[ortho_config(default = DEFAULT_RUNTIME_BIN.to_owned())]
    pub runtime_bin: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl JanitorConfig {
    /// Built-in defaults with no run id.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            run_id: None,
            run_label_key: DEFAULT_RUN_LABEL_KEY.to_owned(),
            delete_marker_key: DEFAULT_DELETE_MARKER_KEY.to_owned(),
            runtime_bin: DEFAULT_RUNTIME_BIN.to_owned(),
        }
    }

    /// Built-in defaults for a known run id.
    #[must_use]
    pub fn for_run(run_id: impl Into<String>) -> Self {
        Self {
            run_id: Some(run_id.into()),
            ..Self::defaults()
        }
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to labelsweep.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration from defaults, configuration files, and
    /// environment variables. The process arguments are never read, so the
    /// binary's own flags cannot leak into the merge.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("labelsweep")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.run_label_key,
            &FieldMetadata::new(
                "run label key",
                "LABELSWEEP_RUN_LABEL_KEY",
                "run_label_key",
            ),
        )?;
        Self::require_field(
            &self.delete_marker_key,
            &FieldMetadata::new(
                "delete-me marker key",
                "LABELSWEEP_DELETE_MARKER_KEY",
                "delete_marker_key",
            ),
        )?;
        Self::require_field(
            &self.runtime_bin,
            &FieldMetadata::new(
                "container runtime binary",
                "LABELSWEEP_RUNTIME_BIN",
                "runtime_bin",
            ),
        )?;
        if let Some(run_id) = self.run_id.as_deref() {
            Self::require_field(
                run_id,
                &FieldMetadata::new("test run id", RUN_ID_ENV, "run_id"),
            )?;
        }
        Ok(())
    }

    /// Builds the run label for this configuration, generating a run id when
    /// none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError`] when the key or configured run id is invalid.
    pub fn run_label(&self) -> Result<RunLabel, LabelError> {
        match self.run_id.as_deref() {
            Some(run_id) => RunLabel::for_run(self.run_label_key.as_str(), run_id),
            None => RunLabel::generate(self.run_label_key.as_str()),
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
