//! Testing utilities for CDC workspace
//!
//! Shared fixtures: charts, dataset configurations and palettes.

#![allow(missing_docs)]

use cdc_model::{Chart, ChartType, Color, ComputedSeries, DatasetConfig};
use cdc_palette::Palette;

pub const SAMPLE_CHART_ID: u64 = 1;

/// Chart with datasets `[7, 3, 9]`, series `[[1,2],[3,4],[5,6]]`, labels `["a","b"]`
pub fn sample_chart() -> Chart {
    chart_with_datasets(SAMPLE_CHART_ID, ChartType::Bar, &[7, 3, 9]).with_computed_series(
        ComputedSeries::new(
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
            labels(&["a", "b"]),
        ),
    )
}

/// Chart holding fresh dataset configs in the given order, no computed series
pub fn chart_with_datasets(chart_id: u64, chart_type: ChartType, ids: &[u64]) -> Chart {
    let mut chart = Chart::new(chart_id, chart_type);
    for id in ids {
        chart.push_dataset(dataset(*id, chart_id));
    }
    chart
}

pub fn dataset(id: u64, chart_id: u64) -> DatasetConfig {
    DatasetConfig::new(id, chart_id).with_legend(format!("Dataset {id}"))
}

pub fn labels(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|l| (*l).to_string()).collect()
}

pub fn colors(raw: &[&str]) -> Vec<Color> {
    raw.iter().map(|c| Color::new(*c)).collect()
}

/// `["#111", "#222"]`
pub fn two_tone_palette() -> Palette {
    Palette::new(colors(&["#111", "#222"])).expect("non-empty palette")
}
