//! [`ResourceClient`] backed by a Docker-compatible CLI.
//!
//! Listing is a two-step affair: `ls --quiet --no-trunc` yields ids, then
//! `inspect` yields the labels and tags for those ids. Removal maps directly
//! onto `container rm` / `image rm`. Works with `docker` and `podman`.

use std::ffi::OsString;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::{Container, Image, ListingError, RemoteApiError, ResourceClient};
use crate::command::{CommandOutput, CommandRunner, ProcessCommandRunner};
use crate::label::RunLabel;

mod types;

use types::{InspectedContainer, InspectedImage};

/// Default container runtime CLI binary name.
pub const DEFAULT_RUNTIME_BIN: &str = "docker";

/// Talks to the container runtime by shelling out to its CLI.
#[derive(Clone, Debug)]
pub struct DockerCli<R: CommandRunner> {
    bin: String,
    runner: R,
}

impl DockerCli<ProcessCommandRunner> {
    /// Creates a client wired to the real process runner.
    #[must_use]
    pub fn with_process_runner(bin: impl Into<String>) -> Self {
        Self::new(bin, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> DockerCli<R> {
    /// Creates a client invoking `bin` through `runner`.
    #[must_use]
    pub fn new(bin: impl Into<String>, runner: R) -> Self {
        Self {
            bin: bin.into(),
            runner,
        }
    }

    /// Runtime CLI binary used for every call.
    #[must_use]
    pub fn bin(&self) -> &str {
        &self.bin
    }

    fn listing_failure(&self, output: CommandOutput, resource: &str) -> ListingError {
        ListingError::CommandFailure {
            program: self.bin.clone(),
            resource: resource.to_owned(),
            status: output.status_text(),
            stderr: output.stderr.trim().to_owned(),
        }
    }

    /// Runs an `ls --quiet` style command and returns the unique ids it
    /// printed, in order.
    fn list_ids(&self, args: &[OsString], resource: &str) -> Result<Vec<String>, ListingError> {
        let output = self.runner.run(&self.bin, args)?;
        if !output.is_success() {
            return Err(self.listing_failure(output, resource));
        }

        let mut ids: Vec<String> = Vec::new();
        for id in output.stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_owned());
            }
        }
        Ok(ids)
    }

    /// Inspects `ids` and parses the JSON array on stdout.
    ///
    /// Objects removed between `ls` and `inspect` make the CLI exit non-zero
    /// while still printing the others; that output is accepted.
    fn inspect<T>(&self, object: &str, ids: &[String], resource: &str) -> Result<Vec<T>, ListingError>
    where
        T: DeserializeOwned,
    {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec![OsString::from(object), OsString::from("inspect")];
        args.extend(ids.iter().map(OsString::from));
        let output = self.runner.run(&self.bin, &args)?;

        match serde_json::from_str::<Vec<T>>(&output.stdout) {
            Ok(items) => {
                if !output.is_success() {
                    debug!(
                        resource,
                        stderr = %output.stderr.trim(),
                        "inspect reported missing objects; using partial output"
                    );
                }
                Ok(items)
            }
            Err(_) if !output.is_success() => Err(self.listing_failure(output, resource)),
            Err(err) => Err(ListingError::Parse {
                resource: resource.to_owned(),
                message: err.to_string(),
            }),
        }
    }

    fn remove(&self, object: &str, target: &str, force: bool) -> Result<(), RemoteApiError> {
        let mut args = vec![OsString::from(object), OsString::from("rm")];
        if force {
            args.push(OsString::from("--force"));
        }
        args.push(OsString::from(target));

        let output = self.runner.run(&self.bin, &args)?;
        if output.is_success() {
            return Ok(());
        }
        Err(RemoteApiError::Rejected {
            target: target.to_owned(),
            status: output.status_text(),
            stderr: output.stderr.trim().to_owned(),
        })
    }
}

impl<R: CommandRunner> ResourceClient for DockerCli<R> {
    fn list_containers(&self, all: bool) -> Result<Vec<Container>, ListingError> {
        let mut args = build_args(&["container", "ls", "--quiet", "--no-trunc"]);
        if all {
            args.push(OsString::from("--all"));
        }
        let ids = self.list_ids(&args, "containers")?;
        let inspected: Vec<InspectedContainer> = self.inspect("container", &ids, "containers")?;
        Ok(inspected.into_iter().map(Container::from).collect())
    }

    fn remove_container(&self, id: &str, force: bool) -> Result<(), RemoteApiError> {
        self.remove("container", id, force)
    }

    fn list_images(&self, filter: &RunLabel) -> Result<Vec<Image>, ListingError> {
        let mut args = build_args(&["image", "ls", "--quiet", "--no-trunc", "--filter"]);
        args.push(OsString::from(format!("label={}", filter.filter())));
        let ids = self.list_ids(&args, "images")?;
        let inspected: Vec<InspectedImage> = self.inspect("image", &ids, "images")?;
        Ok(inspected.into_iter().map(Image::from).collect())
    }

    fn remove_image(&self, tag: &str, force: bool) -> Result<(), RemoteApiError> {
        self.remove("image", tag, force)
    }
}

fn build_args(parts: &[&str]) -> Vec<OsString> {
    parts.iter().map(OsString::from).collect()
}
