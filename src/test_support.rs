//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ffi::OsString;
use std::rc::Rc;

use serde_json::{Value, json};

use crate::client::{Container, Image, ListingError, RemoteApiError, ResourceClient};
use crate::command::{CommandError, CommandOutput, CommandRunner};
use crate::label::RunLabel;

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes a successful exit status with empty output.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32) {
        self.push_output(Some(code), "", "simulated failure");
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, CommandError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| CommandError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// A call observed by [`FakeResourceClient`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClientCall {
    /// `list_containers(all)`.
    ListContainers {
        /// Whether stopped containers were requested.
        all: bool,
    },
    /// `remove_container(id, force)`.
    RemoveContainer {
        /// Container id.
        id: String,
        /// Force flag.
        force: bool,
    },
    /// `list_images(filter)`.
    ListImages {
        /// Rendered `key=value` filter.
        filter: String,
    },
    /// `remove_image(tag, force)`.
    RemoveImage {
        /// Image tag.
        tag: String,
        /// Force flag.
        force: bool,
    },
}

impl ClientCall {
    /// Returns `true` for removal calls.
    #[must_use]
    pub const fn is_delete(&self) -> bool {
        matches!(self, Self::RemoveContainer { .. } | Self::RemoveImage { .. })
    }
}

#[derive(Debug, Default)]
struct FakeState {
    containers: Vec<Container>,
    images: Vec<Image>,
    rejected_containers: BTreeSet<String>,
    rejected_tags: BTreeSet<String>,
    fail_container_listing: bool,
    fail_image_listing: bool,
    calls: Vec<ClientCall>,
}

/// In-memory container runtime with failure injection.
///
/// Removals mutate the stored state, so a second listing reflects what the
/// first sweep deleted. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct FakeResourceClient {
    state: Rc<RefCell<FakeState>>,
}

impl FakeResourceClient {
    /// Creates an empty runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a container with the given labels.
    #[must_use]
    pub fn with_container(self, id: &str, labels: &[(&str, &str)]) -> Self {
        self.add_container(id, labels);
        self
    }

    /// Adds an image with the given tags and labels.
    #[must_use]
    pub fn with_image(self, id: &str, tags: &[&str], labels: &[(&str, &str)]) -> Self {
        self.add_image(id, tags, labels);
        self
    }

    /// Makes every removal of container `id` fail.
    #[must_use]
    pub fn reject_container(self, id: &str) -> Self {
        self.add_container_rejection(id);
        self
    }

    /// Stores a container in the shared state, visible to every clone.
    pub fn add_container(&self, id: &str, labels: &[(&str, &str)]) {
        self.state.borrow_mut().containers.push(Container {
            id: id.to_owned(),
            labels: label_map(labels),
        });
    }

    /// Stores an image in the shared state, visible to every clone.
    pub fn add_image(&self, id: &str, tags: &[&str], labels: &[(&str, &str)]) {
        self.state.borrow_mut().images.push(Image {
            id: id.to_owned(),
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            labels: label_map(labels),
        });
    }

    /// Makes every later removal of container `id` fail.
    pub fn add_container_rejection(&self, id: &str) {
        self.state
            .borrow_mut()
            .rejected_containers
            .insert(id.to_owned());
    }

    /// Makes every removal of image `tag` fail.
    #[must_use]
    pub fn reject_image_tag(self, tag: &str) -> Self {
        self.state.borrow_mut().rejected_tags.insert(tag.to_owned());
        self
    }

    /// Makes `list_containers` fail.
    #[must_use]
    pub fn fail_container_listing(self) -> Self {
        self.break_container_listing();
        self
    }

    /// Makes every later `list_containers` call fail.
    pub fn break_container_listing(&self) {
        self.state.borrow_mut().fail_container_listing = true;
    }

    /// Makes `list_images` fail.
    #[must_use]
    pub fn fail_image_listing(self) -> Self {
        self.state.borrow_mut().fail_image_listing = true;
        self
    }

    /// Returns every call observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ClientCall> {
        self.state.borrow().calls.clone()
    }

    /// Number of removal calls observed so far.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.is_delete())
            .count()
    }

    /// Forgets recorded calls while keeping runtime state.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Ids of containers still present.
    #[must_use]
    pub fn container_ids(&self) -> Vec<String> {
        self.state
            .borrow()
            .containers
            .iter()
            .map(|container| container.id.clone())
            .collect()
    }

    /// Tags of images still present.
    #[must_use]
    pub fn image_tags(&self) -> Vec<String> {
        self.state
            .borrow()
            .images
            .iter()
            .flat_map(|image| image.tags.iter().cloned())
            .collect()
    }

    fn record(&self, call: ClientCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl ResourceClient for FakeResourceClient {
    fn list_containers(&self, all: bool) -> Result<Vec<Container>, ListingError> {
        self.record(ClientCall::ListContainers { all });
        let state = self.state.borrow();
        if state.fail_container_listing {
            return Err(simulated_listing_failure("containers"));
        }
        Ok(state.containers.clone())
    }

    fn remove_container(&self, id: &str, force: bool) -> Result<(), RemoteApiError> {
        self.record(ClientCall::RemoveContainer {
            id: id.to_owned(),
            force,
        });
        let mut state = self.state.borrow_mut();
        if state.rejected_containers.contains(id) {
            return Err(simulated_rejection(id, "container is busy"));
        }
        let before = state.containers.len();
        state.containers.retain(|container| container.id != id);
        if state.containers.len() == before {
            return Err(simulated_rejection(id, "no such container"));
        }
        Ok(())
    }

    fn list_images(&self, filter: &RunLabel) -> Result<Vec<Image>, ListingError> {
        self.record(ClientCall::ListImages {
            filter: filter.filter(),
        });
        let state = self.state.borrow();
        if state.fail_image_listing {
            return Err(simulated_listing_failure("images"));
        }
        Ok(state
            .images
            .iter()
            .filter(|image| filter.matches(&image.labels))
            .cloned()
            .collect())
    }

    fn remove_image(&self, tag: &str, force: bool) -> Result<(), RemoteApiError> {
        self.record(ClientCall::RemoveImage {
            tag: tag.to_owned(),
            force,
        });
        let mut state = self.state.borrow_mut();
        if state.rejected_tags.contains(tag) {
            return Err(simulated_rejection(tag, "image is in use"));
        }
        let mut found = false;
        for image in &mut state.images {
            let before = image.tags.len();
            image.tags.retain(|existing| existing != tag);
            found |= image.tags.len() != before;
        }
        if !found {
            return Err(simulated_rejection(tag, "no such image"));
        }
        state.images.retain(|image| !image.tags.is_empty());
        Ok(())
    }
}

fn simulated_listing_failure(resource: &str) -> ListingError {
    ListingError::CommandFailure {
        program: String::from("fake"),
        resource: resource.to_owned(),
        status: String::from("1"),
        stderr: String::from("simulated listing failure"),
    }
}

fn simulated_rejection(target: &str, reason: &str) -> RemoteApiError {
    RemoteApiError::Rejected {
        target: target.to_owned(),
        status: String::from("1"),
        stderr: reason.to_owned(),
    }
}

fn label_map(labels: &[(&str, &str)]) -> BTreeMap<String, String> {
    labels
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

fn labels_json(labels: &[(&str, &str)]) -> Value {
    if labels.is_empty() {
        return Value::Null;
    }
    Value::Object(
        labels
            .iter()
            .map(|(key, value)| ((*key).to_owned(), Value::from(*value)))
            .collect(),
    )
}

/// Produces a minimal JSON payload matching `docker container inspect`.
#[must_use]
pub fn json_containers(containers: &[(&str, &[(&str, &str)])]) -> String {
    let items = containers
        .iter()
        .map(|(id, labels)| json!({ "Id": id, "Config": { "Labels": labels_json(labels) } }))
        .collect::<Vec<_>>();
    Value::Array(items).to_string()
}

/// Produces a minimal JSON payload matching `docker image inspect`.
#[must_use]
pub fn json_images(images: &[(&str, &[&str], &[(&str, &str)])]) -> String {
    let items = images
        .iter()
        .map(|(id, tags, labels)| {
            json!({
                "Id": id,
                "RepoTags": tags,
                "Config": { "Labels": labels_json(labels) },
            })
        })
        .collect::<Vec<_>>();
    Value::Array(items).to_string()
}
