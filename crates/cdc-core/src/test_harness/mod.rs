// Test harness module
// In-memory collaborators and the editing-session simulator

pub mod memory;
pub mod simulator;

pub use memory::*;
pub use simulator::*;

use crate::collaborators::{Recompute, RecomputeOptions};
use crate::config::EditorConfig;
use crate::error::{RecomputeError, SessionError};
use crate::session::EditorSession;
use cdc_model::{Chart, ChartId, DatasetConfigId};
use std::sync::Arc;

/// Store and engine wired together
#[derive(Debug, Clone)]
pub struct TestHarness {
    pub store: Arc<InMemoryStore>,
    pub engine: Arc<InMemoryRecompute>,
}

impl TestHarness {
    /// Harness publishing `chart`
    #[must_use]
    pub fn new(chart: Chart) -> Self {
        let store = Arc::new(InMemoryStore::with_chart(chart));
        let engine = Arc::new(InMemoryRecompute::new(Arc::clone(&store)));
        Self { store, engine }
    }

    /// Set source rows for several datasets
    pub fn with_sources(
        self,
        sources: impl IntoIterator<Item = (DatasetConfigId, Vec<SourceRow>)>,
    ) -> Self {
        for (dataset_id, rows) in sources {
            self.engine.set_source(dataset_id, rows);
        }
        self
    }

    /// Compute the chart's series once, outside any commit
    ///
    /// # Errors
    /// Whatever the engine reports.
    pub async fn recompute(&self, chart_id: ChartId) -> Result<(), RecomputeError> {
        let dataset_id = self
            .store
            .chart(chart_id)
            .and_then(|chart| chart.dataset_configs.first().map(|d| d.id))
            .ok_or(RecomputeError::ChartNotFound(chart_id))?;
        self.engine
            .run(chart_id, dataset_id, RecomputeOptions::default())
            .await
    }

    /// Open an editor session on the harness collaborators
    ///
    /// # Errors
    /// See [`EditorSession::open`].
    pub fn open(
        &self,
        chart_id: ChartId,
        dataset_id: DatasetConfigId,
        config: EditorConfig,
    ) -> Result<EditorSession, SessionError> {
        EditorSession::open(
            self.store.clone(),
            self.engine.clone(),
            chart_id,
            dataset_id,
            config,
        )
    }
}
