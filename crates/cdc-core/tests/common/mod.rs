//! Shared setup for cdc-core integration tests

#![allow(dead_code)]

use cdc_core::test_harness::{SourceRow, TestHarness};
use cdc_core::{EditorConfig, EditorSession};
use cdc_model::{ChartId, ChartType, DatasetConfigId};
use cdc_test_utils::{chart_with_datasets, SAMPLE_CHART_ID};

pub const DATASETS: [u64; 3] = [7, 3, 9];

pub fn chart_id() -> ChartId {
    ChartId(SAMPLE_CHART_ID)
}

/// `categories` rows labelled `c0..`, valued `id * 10 + i`
pub fn source_rows(id: u64, categories: usize) -> Vec<SourceRow> {
    (0..categories)
        .map(|i| SourceRow::new(format!("c{i}"), (id * 10 + i as u64) as f64))
        .collect()
}

/// Chart `[7, 3, 9]` with source rows, not yet computed
pub fn harness(chart_type: ChartType, categories: usize) -> TestHarness {
    let chart = chart_with_datasets(SAMPLE_CHART_ID, chart_type, &DATASETS);
    TestHarness::new(chart).with_sources(
        DATASETS.map(|id| (DatasetConfigId(id), source_rows(id, categories))),
    )
}

/// Compute the chart, then open a session on `dataset`
pub async fn open(harness: &TestHarness, dataset: u64, config: EditorConfig) -> EditorSession {
    harness.recompute(chart_id()).await.unwrap();
    harness.open(chart_id(), DatasetConfigId(dataset), config).unwrap()
}
