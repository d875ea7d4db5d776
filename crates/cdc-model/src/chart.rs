//! Charts and their computed series

use crate::dataset::DatasetConfig;
use crate::error::ModelError;
use crate::ids::{ChartId, DatasetConfigId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Chart kinds with editor-relevant capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// Line chart
    Line,
    /// Bar chart
    Bar,
    /// Pie chart
    Pie,
    /// Doughnut chart
    Doughnut,
    /// Radar chart
    Radar,
    /// Polar area chart
    Polar,
    /// Data table
    Table,
    /// Single-number KPI
    Kpi,
    /// Average KPI
    Avg,
    /// Gauge
    Gauge,
}

impl ChartType {
    /// Goals render as progress bars; tables have nowhere to show them
    #[inline]
    #[must_use]
    pub fn supports_goal(self) -> bool {
        self != Self::Table
    }

    /// Per-category fill colors make no sense for a single line
    #[inline]
    #[must_use]
    pub fn supports_multi_fill(self) -> bool {
        self != Self::Line
    }
}

impl FromStr for ChartType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "line" => Self::Line,
            "bar" => Self::Bar,
            "pie" => Self::Pie,
            "doughnut" => Self::Doughnut,
            "radar" => Self::Radar,
            "polar" => Self::Polar,
            "table" => Self::Table,
            "kpi" => Self::Kpi,
            "avg" => Self::Avg,
            "gauge" => Self::Gauge,
            other => return Err(ModelError::UnknownChartType(other.to_string())),
        })
    }
}

/// Output of the chart engine
///
/// `values[i]` belongs to the dataset at position `i` of the chart's
/// `dataset_configs` at the time of computation. `labels` are the category
/// names shared by every dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedSeries {
    /// One value row per dataset, positionally aligned
    pub values: Vec<Vec<f64>>,
    /// Shared category labels
    pub labels: Vec<String>,
}

impl ComputedSeries {
    /// Create computed series
    #[inline]
    #[must_use]
    pub fn new(values: Vec<Vec<f64>>, labels: Vec<String>) -> Self {
        Self { values, labels }
    }
}

/// A chart and its ordered dataset configurations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    /// Identity
    pub id: ChartId,
    /// Chart kind
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    /// Ordered dataset configurations
    #[serde(default)]
    pub dataset_configs: Vec<DatasetConfig>,
    /// Engine output, absent until the first run
    #[serde(default)]
    pub computed_series: Option<ComputedSeries>,
}

impl Chart {
    /// Empty chart
    #[must_use]
    pub fn new(id: impl Into<ChartId>, chart_type: ChartType) -> Self {
        Self {
            id: id.into(),
            chart_type,
            dataset_configs: Vec::new(),
            computed_series: None,
        }
    }

    /// Append a dataset configuration, re-homing it onto this chart
    pub fn push_dataset(&mut self, mut dataset: DatasetConfig) {
        dataset.chart_id = self.id;
        self.dataset_configs.push(dataset);
    }

    /// With computed series
    #[inline]
    #[must_use]
    pub fn with_computed_series(mut self, series: ComputedSeries) -> Self {
        self.computed_series = Some(series);
        self
    }

    /// Zero-based position of a dataset configuration
    #[must_use]
    pub fn position_of(&self, id: DatasetConfigId) -> Option<usize> {
        self.dataset_configs.iter().position(|d| d.id == id)
    }

    /// Dataset configuration by identity
    #[must_use]
    pub fn dataset(&self, id: DatasetConfigId) -> Option<&DatasetConfig> {
        self.dataset_configs.iter().find(|d| d.id == id)
    }

    /// Mutable dataset configuration by identity
    pub fn dataset_mut(&mut self, id: DatasetConfigId) -> Option<&mut DatasetConfig> {
        self.dataset_configs.iter_mut().find(|d| d.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_by_type() {
        assert!(!ChartType::Table.supports_goal());
        assert!(ChartType::Kpi.supports_goal());
        assert!(!ChartType::Line.supports_multi_fill());
        assert!(ChartType::Pie.supports_multi_fill());
    }

    #[test]
    fn position_zero_is_a_position() {
        let mut chart = Chart::new(1u64, ChartType::Bar);
        chart.push_dataset(DatasetConfig::new(7u64, 99u64));
        chart.push_dataset(DatasetConfig::new(3u64, 99u64));

        assert_eq!(chart.position_of(7u64.into()), Some(0));
        assert_eq!(chart.position_of(3u64.into()), Some(1));
        assert_eq!(chart.position_of(5u64.into()), None);
        assert_eq!(chart.dataset(3u64.into()).unwrap().chart_id, ChartId(1));
    }

    #[test]
    fn chart_type_round_trips_through_str() {
        assert_eq!("doughnut".parse::<ChartType>().unwrap(), ChartType::Doughnut);
        assert!("scatter".parse::<ChartType>().is_err());
    }
}
