//! End-to-end sweep through the CLI-backed client with scripted runtime
//! output.

use labelsweep::test_support::{ScriptedRunner, json_containers, json_images};
use labelsweep::{
    DeleteMarker, DeletionOutcome, DockerCli, Janitor, JanitorError, ResourceKind, SkipReason,
    begin,
};
use rstest::{fixture, rstest};

const RUN_KEY: &str = "io.labelsweep.test-worker";
const MARKER_KEY: &str = "io.labelsweep.delete-me";

#[fixture]
fn runner() -> ScriptedRunner {
    ScriptedRunner::new()
}

fn janitor(runner: &ScriptedRunner) -> Janitor<DockerCli<ScriptedRunner>> {
    let label = begin("gw0").expect("label should build");
    Janitor::new(
        DockerCli::new("docker", runner.clone()),
        label,
        DeleteMarker::default(),
    )
}

#[rstest]
fn sweep_drives_the_runtime_cli_in_order(runner: ScriptedRunner) {
    runner.push_output(Some(0), "c1\nc2\nc3\n", "");
    runner.push_output(
        Some(0),
        json_containers(&[
            ("c1", &[(RUN_KEY, "gw0")]),
            ("c2", &[(RUN_KEY, "gw1")]),
            ("c3", &[(MARKER_KEY, "")]),
        ]),
        "",
    );
    runner.push_success(); // rm c1
    runner.push_output(Some(1), "", "removal of container c3 is already in progress");
    runner.push_output(Some(0), "sha256:1\n", "");
    runner.push_output(
        Some(0),
        json_images(&[("sha256:1", &["repo:v1", "repo:v2"], &[(RUN_KEY, "gw0")])]),
        "",
    );
    runner.push_success(); // rmi repo:v1
    runner.push_success(); // rmi repo:v2

    let report = janitor(&runner).sweep().expect("sweep should succeed");

    assert_eq!(report.outcomes.len(), 5);
    assert_eq!(
        report.outcomes[0],
        DeletionOutcome::Deleted {
            kind: ResourceKind::Container,
            target: String::from("c1"),
        }
    );
    assert_eq!(
        report.outcomes[1],
        DeletionOutcome::Skipped {
            kind: ResourceKind::Container,
            target: String::from("c2"),
            reason: SkipReason::Unlabelled,
        }
    );
    assert!(matches!(
        report.outcomes[2],
        DeletionOutcome::FailedIgnored { ref target, .. } if target == "c3"
    ));
    assert_eq!(
        report.deleted_targets(ResourceKind::Image),
        vec!["repo:v1", "repo:v2"]
    );

    let commands = runner
        .invocations()
        .iter()
        .map(labelsweep::test_support::CommandInvocation::command_string)
        .collect::<Vec<_>>();
    assert_eq!(
        commands,
        vec![
            "docker container ls --quiet --no-trunc --all",
            "docker container inspect c1 c2 c3",
            "docker container rm --force c1",
            "docker container rm --force c3",
            "docker image ls --quiet --no-trunc --filter label=io.labelsweep.test-worker=gw0",
            "docker image inspect sha256:1",
            "docker image rm --force repo:v1",
            "docker image rm --force repo:v2",
        ]
    );
}

#[rstest]
fn sweep_with_nothing_listed_only_lists(runner: ScriptedRunner) {
    runner.push_output(Some(0), "", "");
    runner.push_output(Some(0), "\n", "");

    let report = janitor(&runner).sweep().expect("sweep should succeed");

    assert!(report.is_empty());
    assert_eq!(runner.invocations().len(), 2);
}

#[rstest]
fn unreachable_daemon_is_a_listing_error(runner: ScriptedRunner) {
    runner.push_output(
        Some(1),
        "",
        "Cannot connect to the Docker daemon at unix:///var/run/docker.sock",
    );

    let err = janitor(&runner).sweep().expect_err("sweep should fail");

    assert!(matches!(err, JanitorError::Listing(_)));
    assert!(err.to_string().contains("Cannot connect to the Docker daemon"));
}

#[rstest]
fn verify_reports_containers_still_present(runner: ScriptedRunner) {
    // sweep: one labelled container whose removal is rejected
    runner.push_output(Some(0), "c1\n", "");
    runner.push_output(Some(0), json_containers(&[("c1", &[(RUN_KEY, "gw0")])]), "");
    runner.push_output(Some(1), "", "container is busy");
    runner.push_output(Some(0), "", "");
    // verification listing
    runner.push_output(Some(0), "c1\n", "");
    runner.push_output(Some(0), json_containers(&[("c1", &[(RUN_KEY, "gw0")])]), "");
    runner.push_output(Some(0), "", "");

    let err = janitor(&runner)
        .sweep_and_verify()
        .expect_err("verification should fail");

    assert_eq!(
        err,
        JanitorError::NotClean {
            containers: vec![String::from("c1")],
            images: Vec::new(),
        }
    );
}
