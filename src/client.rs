//! Container runtime client seam used by the janitor.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::command::CommandError;
use crate::label::RunLabel;

/// Container handle as reported by the runtime.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Container {
    /// Runtime identifier.
    pub id: String,
    /// Labels attached at creation time.
    pub labels: BTreeMap<String, String>,
}

/// Image handle as reported by the runtime.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Image {
    /// Runtime identifier (content digest).
    pub id: String,
    /// Repository tags pointing at the image, e.g. `repo:v1`.
    pub tags: Vec<String>,
    /// Labels baked into the image config.
    pub labels: BTreeMap<String, String>,
}

/// The backend rejected an operation on a single resource.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RemoteApiError {
    /// The runtime refused the request (already gone, busy, forbidden).
    #[error("runtime rejected removal of {target} (status {status}): {stderr}")]
    Rejected {
        /// Container id or image tag.
        target: String,
        /// Exit status text reported by the runtime CLI.
        status: String,
        /// Runtime error output.
        stderr: String,
    },
    /// The runtime could not be reached at all.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// The backend failed to enumerate resources.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ListingError {
    /// The listing command exited unsuccessfully.
    #[error("{program} failed to list {resource} (status {status}): {stderr}")]
    CommandFailure {
        /// Runtime CLI binary.
        program: String,
        /// Resource kind being listed.
        resource: String,
        /// Exit status text.
        status: String,
        /// Runtime error output.
        stderr: String,
    },
    /// The listing output could not be parsed.
    #[error("failed to parse {resource} listing: {message}")]
    Parse {
        /// Resource kind being listed.
        resource: String,
        /// Parser error message.
        message: String,
    },
    /// The runtime could not be reached at all.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Operations the janitor needs from a container runtime.
pub trait ResourceClient {
    /// Lists containers; `all` includes stopped ones.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError`] when the runtime cannot enumerate containers.
    fn list_containers(&self, all: bool) -> Result<Vec<Container>, ListingError>;

    /// Removes a single container.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteApiError`] when the runtime rejects the removal.
    fn remove_container(&self, id: &str, force: bool) -> Result<(), RemoteApiError>;

    /// Lists images carrying `filter`, filtered by the runtime itself.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError`] when the runtime cannot enumerate images.
    fn list_images(&self, filter: &RunLabel) -> Result<Vec<Image>, ListingError>;

    /// Removes one image tag.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteApiError`] when the runtime rejects the removal.
    fn remove_image(&self, tag: &str, force: bool) -> Result<(), RemoteApiError>;
}
