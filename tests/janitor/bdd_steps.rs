//! BDD step definitions for janitor behaviour.

use labelsweep::janitor::ResourceKind;
use labelsweep::label::{DEFAULT_DELETE_MARKER_KEY, DEFAULT_RUN_LABEL_KEY};
use labelsweep::test_support::FakeResourceClient;
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{JanitorContext, SweepOutcome, build_label, container_id, run_sweep};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a janitor for test run \"{run_id}\"")]
fn configured_janitor(mut janitor_context: JanitorContext, run_id: String) -> JanitorContext {
    janitor_context.label = Some(build_label(run_id.trim()));
    janitor_context
}

#[given("the runtime lists a container labelled for run \"{run_id}\"")]
fn runtime_lists_run_container(fake_runtime: &FakeResourceClient, run_id: String) {
    fake_runtime.add_container(
        &container_id(&run_id),
        &[(DEFAULT_RUN_LABEL_KEY, run_id.as_str())],
    );
}

#[given("the runtime lists a container carrying the delete-me marker")]
fn runtime_lists_marked_container(fake_runtime: &FakeResourceClient) {
    fake_runtime.add_container("container-marked", &[(DEFAULT_DELETE_MARKER_KEY, "")]);
}

#[given("the runtime lists an image labelled for run \"{run_id}\" tagged \"{tags}\"")]
fn runtime_lists_run_image(fake_runtime: &FakeResourceClient, run_id: String, tags: String) {
    let tag_list = tags.split(',').map(str::trim).collect::<Vec<_>>();
    fake_runtime.add_image(
        &format!("sha256:{run_id}"),
        &tag_list,
        &[(DEFAULT_RUN_LABEL_KEY, run_id.as_str())],
    );
}

#[given("the runtime rejects removal of the container labelled for run \"{run_id}\"")]
fn runtime_rejects_container(fake_runtime: &FakeResourceClient, run_id: String) {
    fake_runtime.add_container_rejection(&container_id(&run_id));
}

#[given("the runtime cannot list containers")]
fn runtime_cannot_list(fake_runtime: &FakeResourceClient) {
    fake_runtime.break_container_listing();
}

#[when("I run the janitor sweep")]
fn sweep(
    mut janitor_context: JanitorContext,
    fake_runtime: &FakeResourceClient,
) -> JanitorContext {
    janitor_context.outcome = Some(run_sweep(&janitor_context, fake_runtime));
    janitor_context
}

#[when("I repeat the janitor sweep")]
fn repeat_sweep(
    mut janitor_context: JanitorContext,
    fake_runtime: &FakeResourceClient,
) -> JanitorContext {
    janitor_context.deletes_before_repeat = fake_runtime.delete_calls();
    janitor_context.repeat_outcome = Some(run_sweep(&janitor_context, fake_runtime));
    janitor_context
}

fn successful_report(
    outcome: Option<&SweepOutcome>,
) -> Result<&labelsweep::SweepReport, StepError> {
    let Some(outcome) = outcome else {
        return Err(StepError::Assertion(String::from("missing outcome")));
    };
    let SweepOutcome::Success(report) = outcome else {
        return Err(StepError::Assertion(format!(
            "expected success, got: {outcome:?}"
        )));
    };
    Ok(report)
}

#[then("the janitor reports deleting {containers:u32} containers and {tags:u32} image tags")]
fn reports_deletions(
    janitor_context: &JanitorContext,
    containers: u32,
    tags: u32,
) -> Result<(), StepError> {
    let report = successful_report(janitor_context.outcome.as_ref())?;
    let deleted_containers = report.deleted_targets(ResourceKind::Container).len();
    let deleted_tags = report.deleted_targets(ResourceKind::Image).len();
    if deleted_containers == containers as usize && deleted_tags == tags as usize {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {containers} containers and {tags} tags, got {report:?}"
        )))
    }
}

#[then("the janitor reports {failures:u32} ignored failure")]
fn reports_ignored_failures(
    janitor_context: &JanitorContext,
    failures: u32,
) -> Result<(), StepError> {
    let report = successful_report(janitor_context.outcome.as_ref())?;
    if report.failed() == failures as usize {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {failures} ignored failures, got {report:?}"
        )))
    }
}

#[then("the container labelled for run \"{run_id}\" remains")]
fn container_remains(fake_runtime: &FakeResourceClient, run_id: String) -> Result<(), StepError> {
    let id = container_id(&run_id);
    let remaining = fake_runtime.container_ids();
    if remaining.contains(&id) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {id} to remain, got {remaining:?}"
        )))
    }
}

#[then("the second sweep issues no removals")]
fn second_sweep_is_noop(
    janitor_context: &JanitorContext,
    fake_runtime: &FakeResourceClient,
) -> Result<(), StepError> {
    let report = successful_report(janitor_context.repeat_outcome.as_ref())?;
    let deletes_after = fake_runtime.delete_calls();
    if report.is_empty() && deletes_after == janitor_context.deletes_before_repeat {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no removals on repeat, got {report:?}"
        )))
    }
}

#[then("the janitor reports a listing error")]
fn reports_listing_error(janitor_context: &JanitorContext) -> Result<(), StepError> {
    let Some(outcome) = janitor_context.outcome.as_ref() else {
        return Err(StepError::Assertion(String::from("missing outcome")));
    };
    let SweepOutcome::Failure(message) = outcome else {
        return Err(StepError::Assertion(String::from(
            "expected sweep to fail, got success",
        )));
    };
    if message.contains("janitor could not list resources") {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected listing error, got: {message}"
        )))
    }
}
