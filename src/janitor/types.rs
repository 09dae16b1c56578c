//! Outcome types reported by the janitor.

use std::fmt;

use crate::client::{Container, Image, RemoteApiError};

/// Kind of runtime resource a sweep touched.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResourceKind {
    /// A container, addressed by id.
    Container,
    /// An image, addressed by tag.
    Image,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => f.write_str("container"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// Why a listed resource was left alone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// The container carries neither the run label nor the delete-me marker.
    Unlabelled,
    /// The image matched the run label but has no tags to remove.
    Untagged,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlabelled => f.write_str("not labelled for this run"),
            Self::Untagged => f.write_str("no tags to remove"),
        }
    }
}

/// Result of handling one resource during a sweep.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeletionOutcome {
    /// The runtime accepted the forced removal.
    Deleted {
        /// Resource kind.
        kind: ResourceKind,
        /// Container id or image tag.
        target: String,
    },
    /// The resource was not eligible for removal.
    Skipped {
        /// Resource kind.
        kind: ResourceKind,
        /// Container id, or image id for untagged images.
        target: String,
        /// Why it was skipped.
        reason: SkipReason,
    },
    /// The runtime rejected the removal; the sweep carried on.
    FailedIgnored {
        /// Resource kind.
        kind: ResourceKind,
        /// Container id or image tag.
        target: String,
        /// Rejection reported by the runtime.
        error: RemoteApiError,
    },
}

impl DeletionOutcome {
    /// Resource kind this outcome refers to.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Deleted { kind, .. }
            | Self::Skipped { kind, .. }
            | Self::FailedIgnored { kind, .. } => *kind,
        }
    }

    /// Container id or image tag this outcome refers to.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Deleted { target, .. }
            | Self::Skipped { target, .. }
            | Self::FailedIgnored { target, .. } => target,
        }
    }
}

impl fmt::Display for DeletionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted { kind, target } => write!(f, "deleted {kind} {target}"),
            Self::Skipped {
                kind,
                target,
                reason,
            } => write!(f, "skipped {kind} {target}: {reason}"),
            Self::FailedIgnored {
                kind,
                target,
                error,
            } => write!(f, "ignored failure for {kind} {target}: {error}"),
        }
    }
}

/// Every outcome of one sweep, containers first, then image tags.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SweepReport {
    /// Outcomes in the order resources were processed.
    pub outcomes: Vec<DeletionOutcome>,
}

impl SweepReport {
    /// Number of resources removed.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.count(|outcome| matches!(outcome, DeletionOutcome::Deleted { .. }))
    }

    /// Number of removals the runtime rejected.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, DeletionOutcome::FailedIgnored { .. }))
    }

    /// Number of resources left alone.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, DeletionOutcome::Skipped { .. }))
    }

    /// Targets removed for `kind`, in order.
    #[must_use]
    pub fn deleted_targets(&self, kind: ResourceKind) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| {
                outcome.kind() == kind && matches!(outcome, DeletionOutcome::Deleted { .. })
            })
            .map(DeletionOutcome::target)
            .collect()
    }

    /// Returns `true` when no resource was listed at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn count(&self, predicate: impl Fn(&DeletionOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(outcome)).count()
    }
}

/// Resources still eligible for reclamation after a sweep.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Remaining {
    /// Containers that still match the sweep predicate.
    pub containers: Vec<Container>,
    /// Images still listed under the run label.
    pub images: Vec<Image>,
}

impl Remaining {
    /// Returns `true` when nothing is left.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.containers.is_empty() && self.images.is_empty()
    }
}
