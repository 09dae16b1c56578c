//! Shapes of `container inspect` / `image inspect` JSON output.
//!
//! Docker and Podman both emit PascalCase keys and may report `null` for
//! missing label maps or tag lists.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::client::{Container, Image};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub(super) struct InspectedConfig {
    #[serde(default)]
    pub(super) labels: Option<BTreeMap<String, String>>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub(super) struct InspectedContainer {
    pub(super) id: String,
    #[serde(default)]
    pub(super) config: Option<InspectedConfig>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub(super) struct InspectedImage {
    pub(super) id: String,
    #[serde(default)]
    pub(super) repo_tags: Option<Vec<String>>,
    #[serde(default)]
    pub(super) config: Option<InspectedConfig>,
}

fn labels_of(config: Option<InspectedConfig>) -> BTreeMap<String, String> {
    config.and_then(|cfg| cfg.labels).unwrap_or_default()
}

impl From<InspectedContainer> for Container {
    fn from(value: InspectedContainer) -> Self {
        Self {
            id: value.id,
            labels: labels_of(value.config),
        }
    }
}

impl From<InspectedImage> for Image {
    fn from(value: InspectedImage) -> Self {
        Self {
            id: value.id,
            tags: value.repo_tags.unwrap_or_default(),
            labels: labels_of(value.config),
        }
    }
}
