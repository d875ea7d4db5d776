mod common;

use cdc_core::{
    allowed_transitions, validate_transition, CommitError, CommitPipeline, CommitState, Phase,
    RecomputeSettings, StoreError,
};
use cdc_model::{DatasetConfigId, FieldChange, FieldChanges};
use common::{chart_id, harness};
use proptest::prelude::*;
use std::num::NonZeroU32;

fn pipeline(harness: &cdc_core::test_harness::TestHarness, dataset: u64) -> CommitPipeline {
    CommitPipeline::new(
        harness.store.clone(),
        harness.engine.clone(),
        chart_id(),
        DatasetConfigId(dataset),
        RecomputeSettings::default(),
    )
}

#[tokio::test]
async fn failed_persist_never_recomputes() {
    let harness = harness(cdc_model::ChartType::Bar, 3);
    harness.store.fail_next_updates(1);
    let pipeline = pipeline(&harness, 3);

    let err = pipeline
        .commit(FieldChange::MaxRecords(NonZeroU32::new(50)).into())
        .await
        .unwrap_err();

    assert!(matches!(err, CommitError::Persist(StoreError::Unavailable(_))));
    assert!(err.is_retryable());
    assert_eq!(harness.store.update_count(), 1);
    assert_eq!(harness.engine.run_count(), 0);
    assert_eq!(pipeline.state(), CommitState::Failed(Phase::Persist));
}

#[tokio::test]
async fn unknown_dataset_is_not_retryable() {
    let harness = harness(cdc_model::ChartType::Bar, 3);
    let pipeline = pipeline(&harness, 42);

    let err = pipeline
        .commit(FieldChange::Fill(true).into())
        .await
        .unwrap_err();

    assert!(matches!(err, CommitError::Persist(StoreError::NotFound { .. })));
    assert!(!err.is_retryable());
    assert_eq!(harness.engine.run_count(), 0);
}

#[tokio::test]
async fn state_feed_ends_settled() {
    let harness = harness(cdc_model::ChartType::Bar, 3);
    let pipeline = pipeline(&harness, 7);
    let feed = pipeline.subscribe_state();
    assert_eq!(*feed.borrow(), CommitState::Idle);

    let outcome = pipeline
        .commit(FieldChange::Legend("Revenue".into()).into())
        .await
        .unwrap();

    assert!(outcome.recomputed);
    assert_eq!(outcome.updated.legend, "Revenue");
    assert_eq!(*feed.borrow(), CommitState::Settled);
}

#[tokio::test]
async fn recompute_sees_persisted_change() {
    let harness = harness(cdc_model::ChartType::Bar, 4);
    let pipeline = pipeline(&harness, 7);

    pipeline
        .commit(FieldChange::MaxRecords(NonZeroU32::new(1)).into())
        .await
        .unwrap();

    let chart = harness.store.chart(chart_id()).unwrap();
    let computed = chart.computed_series.unwrap();
    assert_eq!(computed.values[0], vec![70.0]);
    assert_eq!(computed.values[1].len(), 4);
}

#[tokio::test]
async fn concurrent_commits_on_one_field_both_settle() {
    let harness = harness(cdc_model::ChartType::Bar, 3);
    let pipeline = pipeline(&harness, 3);

    let (a, b) = tokio::join!(
        pipeline.commit(FieldChanges::single(FieldChange::Legend("A".into()))),
        pipeline.commit(FieldChanges::single(FieldChange::Legend("B".into()))),
    );
    assert!(a.is_ok() && b.is_ok());

    let chart = harness.store.chart(chart_id()).unwrap();
    let legend = &chart.dataset(DatasetConfigId(3)).unwrap().legend;
    assert!(legend == "A" || legend == "B");
    assert_eq!(harness.store.update_count(), 2);
    assert_eq!(harness.engine.run_count(), 2);
    assert_eq!(pipeline.state(), CommitState::Settled);
}

#[test]
fn test_persisting_transitions() {
    assert!(validate_transition(CommitState::Persisting, CommitState::Recomputing).is_ok());
    assert!(validate_transition(CommitState::Persisting, CommitState::Settled).is_ok());
    assert!(validate_transition(CommitState::Persisting, CommitState::Failed(Phase::Persist)).is_ok());

    // Invalid
    assert!(validate_transition(CommitState::Persisting, CommitState::Idle).is_err());
    assert!(validate_transition(CommitState::Recomputing, CommitState::Failed(Phase::Persist)).is_err());
}

fn any_state() -> impl Strategy<Value = CommitState> {
    prop_oneof![
        Just(CommitState::Idle),
        Just(CommitState::Persisting),
        Just(CommitState::Recomputing),
        Just(CommitState::Settled),
        Just(CommitState::Failed(Phase::Persist)),
        Just(CommitState::Failed(Phase::Recompute)),
    ]
}

proptest! {
    #[test]
    fn prop_validation_matches_table(from in any_state(), to in any_state()) {
        let allowed = allowed_transitions(from);
        prop_assert_eq!(validate_transition(from, to).is_ok(), allowed.contains(&to));
    }

    #[test]
    fn prop_recompute_only_reachable_through_persist(from in any_state()) {
        if allowed_transitions(from).contains(&CommitState::Recomputing) {
            prop_assert_eq!(from, CommitState::Persisting);
        }
    }

    #[test]
    fn prop_terminal_states_have_no_exits(from in any_state()) {
        prop_assert_eq!(from.is_terminal(), allowed_transitions(from).is_empty());
    }
}
