//! Shared fixtures and helpers for janitor BDD scenarios.

use labelsweep::janitor::{Janitor, SweepReport};
use labelsweep::label::{DEFAULT_RUN_LABEL_KEY, DeleteMarker, RunLabel};
use labelsweep::test_support::FakeResourceClient;
use rstest::fixture;

#[derive(Clone, Debug)]
pub enum SweepOutcome {
    Success(SweepReport),
    Failure(String),
}

/// Per-scenario results. The runtime itself lives in the `fake_runtime`
/// fixture and is shared with steps by reference.
#[derive(Clone, Debug)]
pub struct JanitorContext {
    pub label: Option<RunLabel>,
    pub outcome: Option<SweepOutcome>,
    pub repeat_outcome: Option<SweepOutcome>,
    pub deletes_before_repeat: usize,
}

#[fixture]
pub fn janitor_context() -> JanitorContext {
    JanitorContext {
        label: None,
        outcome: None,
        repeat_outcome: None,
        deletes_before_repeat: 0,
    }
}

#[fixture]
pub fn fake_runtime() -> FakeResourceClient {
    FakeResourceClient::new()
}

pub fn build_label(run_id: &str) -> RunLabel {
    RunLabel::for_run(DEFAULT_RUN_LABEL_KEY, run_id)
        .unwrap_or_else(|err| panic!("run label should be valid: {err}"))
}

pub fn container_id(run_id: &str) -> String {
    format!("container-{run_id}")
}

pub fn run_sweep(context: &JanitorContext, runtime: &FakeResourceClient) -> SweepOutcome {
    let label = context
        .label
        .clone()
        .unwrap_or_else(|| panic!("test setup requires configured janitor"));
    let janitor = Janitor::new(runtime.clone(), label, DeleteMarker::default());
    match janitor.sweep() {
        Ok(report) => SweepOutcome::Success(report),
        Err(err) => SweepOutcome::Failure(err.to_string()),
    }
}
