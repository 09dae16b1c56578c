//! Session-scoped cleanup: begin a run, create resources, sweep once at the
//! end.
//!
//! [`JanitorSession`] sweeps when finished explicitly and, failing that, when
//! dropped, so a test body that returns early or panics still reclaims what it
//! created.

use std::collections::BTreeMap;

use tracing::{error, info};

use crate::client::ResourceClient;
use crate::config::JanitorConfig;
use crate::janitor::{Janitor, JanitorError, SweepReport};
use crate::label::{DeleteMarker, RunLabel};

/// A test session that owns its run label and sweeps exactly once.
#[derive(Debug)]
pub struct JanitorSession<C: ResourceClient> {
    janitor: Janitor<C>,
    finished: bool,
}

impl<C: ResourceClient> JanitorSession<C> {
    /// Starts a session using the run label and marker described by `config`.
    ///
    /// No runtime calls are made until the session finishes.
    ///
    /// # Errors
    ///
    /// Returns [`JanitorError::Label`] when the configured label key, marker
    /// key, or run id is invalid.
    pub fn begin(client: C, config: &JanitorConfig) -> Result<Self, JanitorError> {
        let label = config.run_label()?;
        let marker = DeleteMarker::new(config.delete_marker_key.as_str())?;
        info!(label = %label, "janitor session started");
        Ok(Self::from_janitor(Janitor::new(client, label, marker)))
    }

    /// Wraps an existing janitor.
    #[must_use]
    pub const fn from_janitor(janitor: Janitor<C>) -> Self {
        Self {
            janitor,
            finished: false,
        }
    }

    /// Label that resources created during this session must carry.
    #[must_use]
    pub const fn label(&self) -> &RunLabel {
        self.janitor.label()
    }

    /// Marker for resources created outside the per-run labelling path.
    #[must_use]
    pub const fn marker(&self) -> &DeleteMarker {
        self.janitor.marker()
    }

    /// Runtime client, for test code that creates resources.
    #[must_use]
    pub const fn client(&self) -> &C {
        self.janitor.client()
    }

    /// Labels to attach to a resource created during this session.
    #[must_use]
    pub fn resource_labels(&self) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        self.label().stamp(&mut labels);
        labels
    }

    /// Ends the session with a sweep.
    ///
    /// # Errors
    ///
    /// Returns [`JanitorError::Listing`] when the runtime cannot enumerate
    /// resources.
    pub fn finish(mut self) -> Result<SweepReport, JanitorError> {
        self.finished = true;
        self.janitor.sweep()
    }
}

impl<C: ResourceClient> Drop for JanitorSession<C> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        match self.janitor.sweep() {
            Ok(report) => info!(
                deleted = report.deleted(),
                failed = report.failed(),
                "janitor session swept on drop"
            ),
            Err(err) => error!(error = %err, "janitor session sweep on drop failed"),
        }
    }
}

/// Runs `body` inside a session and sweeps afterwards whatever `body`
/// returned.
///
/// Returns the body's result alongside the sweep result so callers can
/// report test failures and teardown failures separately.
///
/// # Errors
///
/// Returns [`JanitorError::Label`] when the session cannot begin; `body` is
/// not run in that case.
pub fn with_cleanup<C, T, F>(
    client: C,
    config: &JanitorConfig,
    body: F,
) -> Result<(T, Result<SweepReport, JanitorError>), JanitorError>
where
    C: ResourceClient,
    F: FnOnce(&JanitorSession<C>) -> T,
{
    let session = JanitorSession::begin(client, config)?;
    let outcome = body(&session);
    Ok((outcome, session.finish()))
}
