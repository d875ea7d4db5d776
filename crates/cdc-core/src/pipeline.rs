//! Commit-requery pipeline
//!
//! One user confirm is one logical operation in two ordered phases:
//! 1. **Persist**: write the change set to the canonical record
//! 2. **Recompute**: rerun the chart engine on previously fetched data
//!
//! # Critical Invariant
//!
//! Phase 2 never starts before phase 1 has succeeded, and never runs at all
//! after a phase-1 failure. Each invocation walks its own state machine:
//!
//! ```text
//! Idle -> Persisting -> Recomputing -> Settled
//!             |              |
//!             +-> Settled    +-> Failed(Recompute)
//!             +-> Failed(Persist)
//! ```
//!
//! Two commits racing on the same field are not ordered relative to each
//! other; the store keeps whichever write lands last.

use crate::collaborators::{CanonicalStore, Recompute};
use crate::config::RecomputeSettings;
use crate::error::{CommitError, Phase};
use cdc_model::{ChartId, DatasetConfig, DatasetConfigId, FieldChanges};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Pipeline state of a single commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommitState {
    Idle,
    Persisting,
    Recomputing,
    Settled,
    Failed(Phase),
}

impl CommitState {
    /// No further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Failed(_))
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: CommitState) -> Vec<CommitState> {
    use CommitState::{Failed, Idle, Persisting, Recomputing, Settled};
    match from {
        Idle => vec![Persisting],
        Persisting => vec![Recomputing, Settled, Failed(Phase::Persist)],
        Recomputing => vec![Settled, Failed(Phase::Recompute)],
        Settled | Failed(_) => vec![],
    }
}

/// Validates a state transition
///
/// # Errors
/// `CommitError::IllegalTransition` if `to` is not reachable from `from`.
pub fn validate_transition(from: CommitState, to: CommitState) -> Result<(), CommitError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(CommitError::IllegalTransition { from, to })
    }
}

/// Result of a settled commit
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    /// Changes that were persisted
    pub changes: FieldChanges,
    /// Canonical record returned by the store
    pub updated: DatasetConfig,
    /// Whether phase 2 ran
    pub recomputed: bool,
}

/// Per-invocation state machine, publishing each step
struct CommitRun<'a> {
    current: CommitState,
    publisher: &'a watch::Sender<CommitState>,
}

impl<'a> CommitRun<'a> {
    fn new(publisher: &'a watch::Sender<CommitState>) -> Self {
        Self {
            current: CommitState::Idle,
            publisher,
        }
    }

    fn advance(&mut self, to: CommitState) -> Result<(), CommitError> {
        validate_transition(self.current, to)?;
        self.current = to;
        self.publisher.send_replace(to);
        Ok(())
    }
}

/// Two-phase commit for one dataset configuration
pub struct CommitPipeline {
    store: Arc<dyn CanonicalStore>,
    recompute: Arc<dyn Recompute>,
    chart_id: ChartId,
    dataset_id: DatasetConfigId,
    settings: RecomputeSettings,
    state: watch::Sender<CommitState>,
}

impl CommitPipeline {
    /// Create a pipeline bound to one dataset
    #[must_use]
    pub fn new(
        store: Arc<dyn CanonicalStore>,
        recompute: Arc<dyn Recompute>,
        chart_id: ChartId,
        dataset_id: DatasetConfigId,
        settings: RecomputeSettings,
    ) -> Self {
        let (state, _) = watch::channel(CommitState::Idle);
        Self {
            store,
            recompute,
            chart_id,
            dataset_id,
            settings,
            state,
        }
    }

    /// State of the most recently advanced commit
    #[must_use]
    pub fn state(&self) -> CommitState {
        *self.state.borrow()
    }

    /// Observe state changes
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<CommitState> {
        self.state.subscribe()
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RecomputeSettings {
        &self.settings
    }

    /// Persist `changes`, then recompute
    ///
    /// # Errors
    /// - `CommitError::NothingToCommit` for an empty change set; nothing is
    ///   called
    /// - `CommitError::Persist` if phase 1 fails; phase 2 is skipped
    /// - `CommitError::Recompute` if phase 2 fails; the persisted record is
    ///   carried in the error
    pub async fn commit(&self, changes: FieldChanges) -> Result<CommitOutcome, CommitError> {
        if changes.is_empty() {
            return Err(CommitError::NothingToCommit);
        }

        let mut run = CommitRun::new(&self.state);
        tracing::info!(
            chart_id = %self.chart_id,
            dataset_id = %self.dataset_id,
            %changes,
            "committing dataset changes"
        );

        // Phase 1
        run.advance(CommitState::Persisting)?;
        let updated = match self
            .store
            .update(self.chart_id, self.dataset_id, &changes)
            .await
        {
            Ok(updated) => updated,
            Err(err) => {
                tracing::warn!(dataset_id = %self.dataset_id, "persist failed: {}", err);
                run.advance(CommitState::Failed(Phase::Persist))?;
                return Err(CommitError::Persist(err));
            }
        };

        if !self.settings.policy.should_recompute(&changes) {
            tracing::debug!(%changes, "recompute not required");
            run.advance(CommitState::Settled)?;
            return Ok(CommitOutcome {
                changes,
                updated,
                recomputed: false,
            });
        }

        // Phase 2
        run.advance(CommitState::Recomputing)?;
        if let Err(source) = self
            .recompute
            .run(self.chart_id, self.dataset_id, self.settings.options())
            .await
        {
            tracing::warn!(dataset_id = %self.dataset_id, "recompute failed: {}", source);
            run.advance(CommitState::Failed(Phase::Recompute))?;
            return Err(CommitError::Recompute {
                persisted: Box::new(updated),
                source,
            });
        }

        run.advance(CommitState::Settled)?;
        tracing::info!(dataset_id = %self.dataset_id, "commit settled");
        Ok(CommitOutcome {
            changes,
            updated,
            recomputed: true,
        })
    }
}

impl std::fmt::Debug for CommitPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitPipeline")
            .field("chart_id", &self.chart_id)
            .field("dataset_id", &self.dataset_id)
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockCanonicalStore, MockRecompute, RecomputeOptions};
    use crate::config::RecomputePolicy;
    use crate::error::{RecomputeError, StoreError};
    use cdc_model::{FieldChange, SortOrder};
    use std::num::NonZeroU32;

    fn max_records_50() -> FieldChanges {
        FieldChanges::single(FieldChange::MaxRecords(NonZeroU32::new(50)))
    }

    fn pipeline(
        store: MockCanonicalStore,
        recompute: MockRecompute,
        settings: RecomputeSettings,
    ) -> CommitPipeline {
        CommitPipeline::new(Arc::new(store), Arc::new(recompute), 1u64.into(), 7u64.into(), settings)
    }

    #[test]
    fn transition_table() {
        assert!(validate_transition(CommitState::Idle, CommitState::Persisting).is_ok());
        assert!(validate_transition(CommitState::Idle, CommitState::Recomputing).is_err());
        assert!(validate_transition(CommitState::Persisting, CommitState::Failed(Phase::Recompute)).is_err());
        assert!(validate_transition(CommitState::Settled, CommitState::Persisting).is_err());
        assert!(allowed_transitions(CommitState::Failed(Phase::Persist)).is_empty());
    }

    #[tokio::test]
    async fn persist_failure_skips_recompute() {
        let mut store = MockCanonicalStore::new();
        store
            .expect_update()
            .times(1)
            .returning(|_, _, _| Err(StoreError::Unavailable("offline".into())));
        let mut recompute = MockRecompute::new();
        recompute.expect_run().times(0);

        let pipeline = pipeline(store, recompute, RecomputeSettings::default());
        let err = pipeline.commit(max_records_50()).await.unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Persist));
        assert_eq!(pipeline.state(), CommitState::Failed(Phase::Persist));
    }

    #[tokio::test]
    async fn success_runs_both_phases_with_cached_options() {
        let mut store = MockCanonicalStore::new();
        store
            .expect_update()
            .withf(|chart, dataset, changes| {
                chart.0 == 1 && dataset.0 == 7 && changes.kinds() == vec![cdc_model::FieldKind::MaxRecords]
            })
            .times(1)
            .returning(|_, _, changes| {
                let mut config = DatasetConfig::new(7u64, 1u64);
                config.apply(changes);
                Ok(config)
            });
        let mut recompute = MockRecompute::new();
        recompute
            .expect_run()
            .withf(|_, _, options| *options == RecomputeOptions::default())
            .times(1)
            .returning(|_, _, _| Ok(()));

        let pipeline = pipeline(store, recompute, RecomputeSettings::default());
        let outcome = pipeline.commit(max_records_50()).await.unwrap();

        assert!(outcome.recomputed);
        assert_eq!(outcome.updated.max_records, NonZeroU32::new(50));
        assert_eq!(pipeline.state(), CommitState::Settled);
    }

    #[tokio::test]
    async fn recompute_failure_keeps_persisted_record() {
        let mut store = MockCanonicalStore::new();
        store
            .expect_update()
            .returning(|_, _, _| Ok(DatasetConfig::new(7u64, 1u64).with_legend("saved")));
        let mut recompute = MockRecompute::new();
        recompute
            .expect_run()
            .times(1)
            .returning(|_, _, _| Err(RecomputeError::Failed("engine".into())));

        let pipeline = pipeline(store, recompute, RecomputeSettings::default());
        let err = pipeline.commit(max_records_50()).await.unwrap_err();

        assert_eq!(err.phase(), Some(Phase::Recompute));
        assert_eq!(err.persisted().unwrap().legend, "saved");
        assert_eq!(pipeline.state(), CommitState::Failed(Phase::Recompute));
    }

    #[tokio::test]
    async fn values_affected_policy_skips_presentation_changes() {
        let mut store = MockCanonicalStore::new();
        store
            .expect_update()
            .times(1)
            .returning(|_, _, _| Ok(DatasetConfig::new(7u64, 1u64)));
        let mut recompute = MockRecompute::new();
        recompute.expect_run().times(0);

        let settings = RecomputeSettings {
            policy: RecomputePolicy::ValuesAffected,
            ..RecomputeSettings::default()
        };
        let pipeline = pipeline(store, recompute, settings);
        let outcome = pipeline
            .commit(FieldChanges::single(FieldChange::Sort(SortOrder::Desc)))
            .await
            .unwrap();

        assert!(!outcome.recomputed);
        assert_eq!(pipeline.state(), CommitState::Settled);
    }

    #[tokio::test]
    async fn empty_change_set_calls_nothing() {
        let mut store = MockCanonicalStore::new();
        store.expect_update().times(0);
        let mut recompute = MockRecompute::new();
        recompute.expect_run().times(0);

        let pipeline = pipeline(store, recompute, RecomputeSettings::default());
        let err = pipeline.commit(FieldChanges::new()).await.unwrap_err();
        assert!(matches!(err, CommitError::NothingToCommit));
        assert_eq!(pipeline.state(), CommitState::Idle);
    }
}
