//! External collaborators
//!
//! The editor core owns no transport. It talks to two async services:
//! - [`CanonicalStore`]: persists field changes and publishes chart snapshots
//! - [`Recompute`]: reruns the chart engine, which then refreshes the
//!   chart's computed series through the store's feed

use crate::error::{RecomputeError, StoreError};
use cdc_model::{Chart, ChartId, DatasetConfig, DatasetConfigId, FieldChanges};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Flags passed to the recompute trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecomputeOptions {
    /// Reuse previously fetched source data (no re-fetch from origin)
    pub reuse_source: bool,
    /// Skip re-parsing source data
    pub skip_parsing: bool,
    /// Accept a cached computation if one exists
    pub prefer_cache: bool,
}

impl Default for RecomputeOptions {
    fn default() -> Self {
        Self {
            reuse_source: true,
            skip_parsing: true,
            prefer_cache: true,
        }
    }
}

/// Server-held source of truth for dataset configurations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CanonicalStore: Send + Sync {
    /// Persist field changes and return the updated record
    async fn update(
        &self,
        chart_id: ChartId,
        dataset_id: DatasetConfigId,
        changes: &FieldChanges,
    ) -> Result<DatasetConfig, StoreError>;

    /// Reactive read of a chart; `None` if the chart is unknown
    fn subscribe(&self, chart_id: ChartId) -> Option<watch::Receiver<Chart>>;
}

/// Chart engine trigger
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Recompute: Send + Sync {
    /// Recompute the chart's series; on success the store publishes them
    async fn run(
        &self,
        chart_id: ChartId,
        dataset_id: DatasetConfigId,
        options: RecomputeOptions,
    ) -> Result<(), RecomputeError>;
}
