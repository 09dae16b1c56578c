//! Label-scoped cleanup of container runtime resources created by test runs.
//!
//! Each test run stamps its containers and images with a run label
//! (`key=value`). At session teardown the [`Janitor`] force-removes every
//! container carrying that label or a delete-me marker, then every tag of the
//! images the runtime lists under the label. Individual removal failures are
//! recorded and skipped; only listing failures abort a sweep.

pub mod client;
pub mod command;
pub mod config;
pub mod docker;
pub mod janitor;
pub mod label;
pub mod session;
pub mod test_support;

pub use client::{Container, Image, ListingError, RemoteApiError, ResourceClient};
pub use command::{CommandError, CommandOutput, CommandRunner, ProcessCommandRunner};
pub use config::JanitorConfig;
pub use docker::{DEFAULT_RUNTIME_BIN, DockerCli};
pub use janitor::{
    DeletionOutcome, Janitor, JanitorError, Remaining, ResourceKind, SkipReason, SweepReport,
};
pub use label::{DeleteMarker, LabelError, RunLabel, begin};
pub use session::{JanitorSession, with_cleanup};
