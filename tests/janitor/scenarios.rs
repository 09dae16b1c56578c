//! BDD scenarios for the janitor sweep.

use rstest_bdd_macros::scenario;

use labelsweep::test_support::FakeResourceClient;

use super::test_helpers::{JanitorContext, fake_runtime, janitor_context};

#[scenario(
    path = "tests/features/janitor.feature",
    name = "Delete resources labelled for the current run"
)]
fn scenario_delete_labelled_resources(
    janitor_context: JanitorContext,
    fake_runtime: FakeResourceClient,
) {
    let _ = (janitor_context, fake_runtime);
}

#[scenario(
    path = "tests/features/janitor.feature",
    name = "Keep sweeping after a rejected removal"
)]
fn scenario_keep_sweeping_after_rejection(
    janitor_context: JanitorContext,
    fake_runtime: FakeResourceClient,
) {
    let _ = (janitor_context, fake_runtime);
}

#[scenario(
    path = "tests/features/janitor.feature",
    name = "Running the sweep twice is a no-op the second time"
)]
fn scenario_idempotent_sweep(
    janitor_context: JanitorContext,
    fake_runtime: FakeResourceClient,
) {
    let _ = (janitor_context, fake_runtime);
}

#[scenario(
    path = "tests/features/janitor.feature",
    name = "Surface listing failures"
)]
fn scenario_surface_listing_failures(
    janitor_context: JanitorContext,
    fake_runtime: FakeResourceClient,
) {
    let _ = (janitor_context, fake_runtime);
}
