//! Series alignment
//!
//! The chart engine returns one value row per dataset with no identifier
//! attached; row `i` belongs to whatever dataset sat at position `i` of the
//! chart's `dataset_configs` when the engine ran. Resolution therefore goes
//! through the position, never through a stored index, and must be redone
//! from the current snapshot every time either side changes. Reordering
//! datasets without recomputing breaks the pairing.

use cdc_model::{Chart, DatasetConfigId};
use serde::Serialize;

/// Borrowed slice of computed output for one dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSlice<'a> {
    /// The dataset's value row
    pub values: &'a [f64],
    /// Category labels shared by the whole chart
    pub labels: &'a [String],
}

impl SeriesSlice<'_> {
    /// Number of categories
    #[inline]
    #[must_use]
    pub fn category_count(&self) -> usize {
        self.labels.len()
    }

    /// Owned copy
    #[must_use]
    pub fn to_resolved(&self) -> ResolvedSeries {
        ResolvedSeries {
            values: self.values.to_vec(),
            labels: self.labels.to_vec(),
        }
    }
}

/// Owned computed output for one dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedSeries {
    pub values: Vec<f64>,
    pub labels: Vec<String>,
}

/// Find a dataset's computed values and the chart's labels
///
/// Returns `None` when the dataset is not in the chart, when the chart has
/// not been computed yet, or when the computed rows are shorter than the
/// dataset list (output produced for an older dataset list). `None` is a
/// normal state: render an empty series.
#[must_use]
pub fn resolve_series_for_dataset(chart: &Chart, dataset_id: DatasetConfigId) -> Option<SeriesSlice<'_>> {
    let position = chart.position_of(dataset_id)?;
    let computed = chart.computed_series.as_ref()?;

    let Some(values) = computed.values.get(position) else {
        tracing::warn!(
            chart_id = %chart.id,
            %dataset_id,
            position,
            rows = computed.values.len(),
            "computed series shorter than dataset list"
        );
        return None;
    };

    Some(SeriesSlice {
        values,
        labels: &computed.labels,
    })
}

/// Row count mismatch between datasets and computed output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlignmentDrift {
    pub datasets: usize,
    pub rows: usize,
}

/// Detect a broken parallel-array pairing
///
/// `None` when the chart is uncomputed or the row count matches.
#[must_use]
pub fn alignment_drift(chart: &Chart) -> Option<AlignmentDrift> {
    let computed = chart.computed_series.as_ref()?;
    let datasets = chart.dataset_configs.len();
    let rows = computed.values.len();
    (datasets != rows).then_some(AlignmentDrift { datasets, rows })
}
