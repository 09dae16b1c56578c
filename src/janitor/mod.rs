//! Container runtime test-resource janitor.
//!
//! Integration tests label every container and image they create with a
//! per-run [`RunLabel`]. At the end of the session the janitor lists all
//! containers (stopped ones included), force-removes those carrying the run
//! label or the [`DeleteMarker`], then force-removes every tag of the images
//! the runtime lists under the run label. A rejected removal is recorded and
//! the sweep moves on; only a failed listing aborts it.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{ListingError, RemoteApiError, ResourceClient};
use crate::label::{DeleteMarker, LabelError, RunLabel};

mod types;

pub use types::{DeletionOutcome, Remaining, ResourceKind, SkipReason, SweepReport};

/// Errors returned by the janitor.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum JanitorError {
    /// Raised when the run label or marker cannot be built.
    #[error(transparent)]
    Label(#[from] LabelError),
    /// Raised when the runtime cannot enumerate resources.
    #[error("janitor could not list resources: {0}")]
    Listing(#[from] ListingError),
    /// Raised by [`Janitor::sweep_and_verify`] when resources remain.
    #[error(
        "resources remain after janitor sweep: containers [{}], images [{}]",
        .containers.join(", "),
        .images.join(", ")
    )]
    NotClean {
        /// Ids of containers still present.
        containers: Vec<String>,
        /// Ids of images still present.
        images: Vec<String>,
    },
}

/// Deletes resources labelled for one run through a [`ResourceClient`].
#[derive(Clone, Debug)]
pub struct Janitor<C: ResourceClient> {
    client: C,
    label: RunLabel,
    marker: DeleteMarker,
}

impl<C: ResourceClient> Janitor<C> {
    /// Creates a janitor scoped to `label`, also reclaiming anything carrying
    /// `marker`.
    #[must_use]
    pub const fn new(client: C, label: RunLabel, marker: DeleteMarker) -> Self {
        Self {
            client,
            label,
            marker,
        }
    }

    /// Run label this janitor sweeps.
    #[must_use]
    pub const fn label(&self) -> &RunLabel {
        &self.label
    }

    /// Delete-me marker this janitor honours.
    #[must_use]
    pub const fn marker(&self) -> &DeleteMarker {
        &self.marker
    }

    /// Underlying runtime client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Returns `true` when a container with `labels` must be removed.
    #[must_use]
    pub fn should_delete(&self, labels: &BTreeMap<String, String>) -> bool {
        self.label.matches(labels) || self.marker.is_present(labels)
    }

    /// Performs one best-effort sweep and reports what happened to every
    /// listed resource.
    ///
    /// Containers are handled before images are listed so images used only by
    /// just-removed containers can go too. Running the sweep again once
    /// everything is gone issues no removals.
    ///
    /// # Errors
    ///
    /// Returns [`JanitorError::Listing`] when either listing fails. Removal
    /// failures never surface here; they appear as
    /// [`DeletionOutcome::FailedIgnored`].
    pub fn sweep(&self) -> Result<SweepReport, JanitorError> {
        let mut outcomes = Vec::new();
        self.sweep_containers(&mut outcomes)?;
        self.sweep_images(&mut outcomes)?;

        let report = SweepReport { outcomes };
        info!(
            label = %self.label,
            deleted = report.deleted(),
            failed = report.failed(),
            skipped = report.skipped(),
            "janitor sweep finished"
        );
        Ok(report)
    }

    /// Lists resources that a sweep would still target.
    ///
    /// # Errors
    ///
    /// Returns [`JanitorError::Listing`] when either listing fails.
    pub fn remaining(&self) -> Result<Remaining, JanitorError> {
        let containers = self
            .client
            .list_containers(true)?
            .into_iter()
            .filter(|container| self.should_delete(&container.labels))
            .collect();
        let images = self.client.list_images(&self.label)?;
        Ok(Remaining { containers, images })
    }

    /// Sweeps, then fails if anything eligible is still listed.
    ///
    /// # Errors
    ///
    /// Returns [`JanitorError::Listing`] when a listing fails, or
    /// [`JanitorError::NotClean`] when resources remain afterwards.
    pub fn sweep_and_verify(&self) -> Result<SweepReport, JanitorError> {
        let report = self.sweep()?;
        let remaining = self.remaining()?;
        if remaining.is_clean() {
            return Ok(report);
        }

        Err(JanitorError::NotClean {
            containers: remaining
                .containers
                .into_iter()
                .map(|container| container.id)
                .collect(),
            images: remaining.images.into_iter().map(|image| image.id).collect(),
        })
    }

    fn sweep_containers(&self, outcomes: &mut Vec<DeletionOutcome>) -> Result<(), JanitorError> {
        let containers = self.client.list_containers(true)?;
        debug!(count = containers.len(), "listed containers");

        for container in containers {
            if !self.should_delete(&container.labels) {
                debug!(container_id = %container.id, "skipping unlabelled container");
                outcomes.push(DeletionOutcome::Skipped {
                    kind: ResourceKind::Container,
                    target: container.id,
                    reason: SkipReason::Unlabelled,
                });
                continue;
            }

            let result = self.client.remove_container(&container.id, true);
            outcomes.push(record(ResourceKind::Container, container.id, result));
        }
        Ok(())
    }

    fn sweep_images(&self, outcomes: &mut Vec<DeletionOutcome>) -> Result<(), JanitorError> {
        let images = self.client.list_images(&self.label)?;
        debug!(count = images.len(), filter = %self.label, "listed images");

        for image in images {
            if image.tags.is_empty() {
                debug!(image_id = %image.id, "skipping untagged image");
                outcomes.push(DeletionOutcome::Skipped {
                    kind: ResourceKind::Image,
                    target: image.id,
                    reason: SkipReason::Untagged,
                });
                continue;
            }

            for tag in image.tags {
                let result = self.client.remove_image(&tag, true);
                outcomes.push(record(ResourceKind::Image, tag, result));
            }
        }
        Ok(())
    }
}

fn record(
    kind: ResourceKind,
    target: String,
    result: Result<(), RemoteApiError>,
) -> DeletionOutcome {
    match result {
        Ok(()) => {
            info!(%kind, %target, "removed");
            DeletionOutcome::Deleted { kind, target }
        }
        Err(error) => {
            warn!(%kind, %target, %error, "removal failed; continuing sweep");
            DeletionOutcome::FailedIgnored {
                kind,
                target,
                error,
            }
        }
    }
}
