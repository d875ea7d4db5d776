//! In-memory collaborators
//!
//! [`InMemoryStore`] keeps one `watch` channel per chart as its reactive
//! read. [`InMemoryRecompute`] computes series positionally from per-dataset
//! source rows and publishes them back through the store.

use crate::collaborators::{CanonicalStore, Recompute, RecomputeOptions};
use crate::error::{RecomputeError, StoreError};
use cdc_model::{
    Chart, ChartId, ComputedSeries, DatasetConfig, DatasetConfigId, FieldChanges, SortOrder,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use moka::future::Cache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Consume one armed failure, if any
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// A recorded `update` call
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub chart_id: ChartId,
    pub dataset_id: DatasetConfigId,
    pub changes: FieldChanges,
    pub succeeded: bool,
}

/// Canonical store backed by `watch` channels
#[derive(Debug, Default)]
pub struct InMemoryStore {
    charts: DashMap<ChartId, watch::Sender<Chart>>,
    failures: AtomicUsize,
    calls: Mutex<Vec<StoreCall>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with one chart already published
    #[must_use]
    pub fn with_chart(chart: Chart) -> Self {
        let store = Self::new();
        store.insert_chart(chart);
        store
    }

    /// Publish a chart, replacing any previous snapshot
    pub fn insert_chart(&self, chart: Chart) {
        match self.charts.entry(chart.id) {
            Entry::Occupied(entry) => {
                entry.get().send_replace(chart);
            }
            Entry::Vacant(entry) => {
                let (sender, _) = watch::channel(chart);
                entry.insert(sender);
            }
        }
    }

    /// Current snapshot
    #[must_use]
    pub fn chart(&self, chart_id: ChartId) -> Option<Chart> {
        self.charts.get(&chart_id).map(|sender| sender.borrow().clone())
    }

    /// Mutate a chart and notify subscribers, as a remote editor would
    ///
    /// Returns `false` for an unknown chart.
    pub fn modify_chart(&self, chart_id: ChartId, modify: impl FnOnce(&mut Chart)) -> bool {
        let Some(sender) = self.charts.get(&chart_id) else {
            return false;
        };
        sender.send_modify(modify);
        true
    }

    /// Replace the computed series
    pub fn publish_series(&self, chart_id: ChartId, series: ComputedSeries) -> bool {
        self.modify_chart(chart_id, |chart| chart.computed_series = Some(series))
    }

    /// Fail the next `n` updates with `StoreError::Unavailable`
    pub fn fail_next_updates(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Every `update` call so far
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn update_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn apply(
        &self,
        chart_id: ChartId,
        dataset_id: DatasetConfigId,
        changes: &FieldChanges,
    ) -> Result<DatasetConfig, StoreError> {
        let not_found = StoreError::NotFound {
            chart_id,
            dataset_id,
        };
        let sender = self.charts.get(&chart_id).ok_or_else(|| not_found.clone())?;

        let mut updated = None;
        sender.send_if_modified(|chart| match chart.dataset_mut(dataset_id) {
            Some(dataset) => {
                dataset.apply(changes);
                updated = Some(dataset.clone());
                true
            }
            None => false,
        });
        updated.ok_or(not_found)
    }
}

#[async_trait::async_trait]
impl CanonicalStore for InMemoryStore {
    async fn update(
        &self,
        chart_id: ChartId,
        dataset_id: DatasetConfigId,
        changes: &FieldChanges,
    ) -> Result<DatasetConfig, StoreError> {
        let result = if take_failure(&self.failures) {
            Err(StoreError::Unavailable("injected failure".into()))
        } else {
            self.apply(chart_id, dataset_id, changes)
        };

        self.calls.lock().push(StoreCall {
            chart_id,
            dataset_id,
            changes: changes.clone(),
            succeeded: result.is_ok(),
        });
        result
    }

    fn subscribe(&self, chart_id: ChartId) -> Option<watch::Receiver<Chart>> {
        self.charts.get(&chart_id).map(|sender| sender.subscribe())
    }
}

/// One fetched source record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    pub label: String,
    pub value: f64,
}

impl SourceRow {
    #[must_use]
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// A recorded `run` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeCall {
    pub chart_id: ChartId,
    pub dataset_id: DatasetConfigId,
    pub options: RecomputeOptions,
}

/// Chart engine over in-memory source rows
///
/// Row `i` of the output is computed from the dataset at position `i` of the
/// chart's dataset list: source rows are sorted per the dataset's order, then
/// capped at its max records. Labels come from the first dataset. Formulas
/// are not evaluated. Results are cached by a BLAKE3 hash of the dataset
/// configurations and their source rows.
pub struct InMemoryRecompute {
    store: Arc<InMemoryStore>,
    sources: DashMap<DatasetConfigId, Vec<SourceRow>>,
    cache: Cache<blake3::Hash, ComputedSeries>,
    failures: AtomicUsize,
    calls: Mutex<Vec<RecomputeCall>>,
    computations: AtomicUsize,
}

impl InMemoryRecompute {
    /// Engine publishing into `store`, with a 1,000 entry cache
    #[must_use]
    pub fn new(store: Arc<InMemoryStore>) -> Self {
        Self {
            store,
            sources: DashMap::new(),
            cache: Cache::new(1_000),
            failures: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            computations: AtomicUsize::new(0),
        }
    }

    /// Set the fetched records of one dataset
    pub fn set_source(&self, dataset_id: DatasetConfigId, rows: Vec<SourceRow>) {
        self.sources.insert(dataset_id, rows);
    }

    /// Fail the next `n` runs with `RecomputeError::Unavailable`
    pub fn fail_next_runs(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Every `run` call so far
    #[must_use]
    pub fn calls(&self) -> Vec<RecomputeCall> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn run_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Series computed without a cache hit
    #[must_use]
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }

    fn source_rows(&self, configs: &[DatasetConfig]) -> Vec<Vec<SourceRow>> {
        configs
            .iter()
            .map(|config| {
                self.sources
                    .get(&config.id)
                    .map(|rows| rows.clone())
                    .unwrap_or_default()
            })
            .collect()
    }

    fn compute(&self, configs: &[DatasetConfig], sources: Vec<Vec<SourceRow>>) -> ComputedSeries {
        self.computations.fetch_add(1, Ordering::SeqCst);

        let mut labels = None;
        let values: Vec<Vec<f64>> = configs
            .iter()
            .zip(sources)
            .map(|(config, mut rows)| {
                match config.sort {
                    SortOrder::Asc => rows.sort_by(|a, b| a.value.total_cmp(&b.value)),
                    SortOrder::Desc => rows.sort_by(|a, b| b.value.total_cmp(&a.value)),
                    SortOrder::Unset => {}
                }
                if let Some(max) = config.max_records {
                    rows.truncate(usize::try_from(max.get()).unwrap_or(usize::MAX));
                }
                if labels.is_none() {
                    labels = Some(rows.iter().map(|row| row.label.clone()).collect());
                }
                rows.into_iter().map(|row| row.value).collect()
            })
            .collect();

        ComputedSeries::new(values, labels.unwrap_or_default())
    }
}

fn content_key(
    configs: &[DatasetConfig],
    sources: &[Vec<SourceRow>],
) -> Result<blake3::Hash, RecomputeError> {
    let bytes = serde_json::to_vec(&(configs, sources))
        .map_err(|e| RecomputeError::Failed(format!("failed to hash inputs: {e}")))?;
    Ok(blake3::hash(&bytes))
}

#[async_trait::async_trait]
impl Recompute for InMemoryRecompute {
    async fn run(
        &self,
        chart_id: ChartId,
        dataset_id: DatasetConfigId,
        options: RecomputeOptions,
    ) -> Result<(), RecomputeError> {
        self.calls.lock().push(RecomputeCall {
            chart_id,
            dataset_id,
            options,
        });
        if take_failure(&self.failures) {
            return Err(RecomputeError::Unavailable("injected failure".into()));
        }

        let chart = self
            .store
            .chart(chart_id)
            .ok_or(RecomputeError::ChartNotFound(chart_id))?;
        let sources = self.source_rows(&chart.dataset_configs);
        let key = content_key(&chart.dataset_configs, &sources)?;

        let cached = if options.prefer_cache {
            self.cache.get(&key).await
        } else {
            None
        };
        let series = if let Some(series) = cached {
            tracing::debug!(%chart_id, "recompute served from cache");
            series
        } else {
            let series = self.compute(&chart.dataset_configs, sources);
            self.cache.insert(key, series.clone()).await;
            series
        };

        if !self.store.publish_series(chart_id, series) {
            return Err(RecomputeError::ChartNotFound(chart_id));
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryRecompute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecompute")
            .field("sources", &self.sources.len())
            .field("cached", &self.cache.entry_count())
            .field("computations", &self.computations())
            .finish_non_exhaustive()
    }
}
