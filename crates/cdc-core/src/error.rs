//! Error types for CDC Core
//!
//! Provides error handling for:
//! - Canonical store persistence failures
//! - Recomputation failures
//! - The two-phase commit pipeline
//! - Draft parsing
//! - Editor sessions and configuration loading

use crate::draft::DraftField;
use crate::pipeline::CommitState;
use cdc_model::{ChartId, ChartType, DatasetConfig, DatasetConfigId, ModelError};

/// Canonical store failures (phase 1)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No such dataset in the chart
    #[error("dataset {dataset_id} not found in chart {chart_id}")]
    NotFound {
        chart_id: ChartId,
        dataset_id: DatasetConfigId,
    },

    /// Store refused the update
    #[error("update rejected: {0}")]
    Rejected(String),

    /// Store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Recomputation failures (phase 2)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecomputeError {
    /// Chart is unknown to the engine
    #[error("chart {0} not found")]
    ChartNotFound(ChartId),

    /// Engine ran and failed
    #[error("recompute failed: {0}")]
    Failed(String),

    /// Engine could not be reached
    #[error("recompute unavailable: {0}")]
    Unavailable(String),
}

/// Commit phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Write to the canonical record
    Persist,
    /// Refresh computed series
    Recompute,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persist => f.write_str("persist"),
            Self::Recompute => f.write_str("recompute"),
        }
    }
}

/// Commit pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    /// Empty change set
    #[error("nothing to commit")]
    NothingToCommit,

    /// Phase 1 failed; recompute was not attempted
    #[error("persist failed: {0}")]
    Persist(#[from] StoreError),

    /// Phase 2 failed; the canonical change stands
    #[error("recompute failed after persisting: {source}")]
    Recompute {
        /// Record as persisted by phase 1
        persisted: Box<DatasetConfig>,
        /// Underlying failure
        source: RecomputeError,
    },

    /// Internal state machine misuse
    #[error("illegal commit transition: {from:?} -> {to:?}")]
    IllegalTransition { from: CommitState, to: CommitState },
}

impl CommitError {
    /// Phase that failed, if any
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Persist(_) => Some(Phase::Persist),
            Self::Recompute { .. } => Some(Phase::Recompute),
            Self::NothingToCommit | Self::IllegalTransition { .. } => None,
        }
    }

    /// Whether a later confirm is likely to succeed unchanged
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Persist(StoreError::Unavailable(_))
                | Self::Recompute {
                    source: RecomputeError::Unavailable(_),
                    ..
                }
        )
    }

    /// Canonical record written before a phase-2 failure
    #[must_use]
    pub fn persisted(&self) -> Option<&DatasetConfig> {
        match self {
            Self::Recompute { persisted, .. } => Some(persisted),
            _ => None,
        }
    }
}

/// Draft confirmation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    /// Draft text did not parse
    #[error("invalid draft: {0}")]
    Invalid(#[from] ModelError),

    /// Nothing typed into a field that cannot be empty
    #[error("draft {0} is empty")]
    Empty(DraftField),
}

/// Editor session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Chart not published by the store
    #[error("chart {0} not found")]
    ChartNotFound(ChartId),

    /// Dataset missing from the chart snapshot
    #[error("dataset {dataset_id} not found in chart {chart_id}")]
    DatasetNotFound {
        chart_id: ChartId,
        dataset_id: DatasetConfigId,
    },

    /// Draft could not be turned into a change
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// Commit failed
    #[error(transparent)]
    Commit(#[from] CommitError),

    /// Action not offered for this chart type
    #[error("{action} is not available for {chart_type:?} charts")]
    Unsupported {
        action: &'static str,
        chart_type: ChartType,
    },

    /// Store dropped the chart feed
    #[error("chart feed closed")]
    Closed,
}

impl SessionError {
    /// Commit error, if this is one
    #[must_use]
    pub fn as_commit(&self) -> Option<&CommitError> {
        match self {
            Self::Commit(err) => Some(err),
            _ => None,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML did not parse
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed but semantically invalid
    #[error("invalid config: {0}")]
    Invalid(String),
}
