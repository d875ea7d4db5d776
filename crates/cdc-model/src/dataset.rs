//! Canonical dataset configuration record

use crate::changes::{FieldChange, FieldChanges};
use crate::color::{Color, FillColor};
use crate::error::ModelError;
use crate::formula::Formula;
use crate::ids::{ChartId, DatasetConfigId};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::str::FromStr;

/// Record ordering applied before the cap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending by value
    #[serde(rename = "asc")]
    Asc,
    /// Descending by value
    #[serde(rename = "desc")]
    Desc,
    /// Source order
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl SortOrder {
    /// Sort buttons act as toggles: pressing the active order clears it
    #[inline]
    #[must_use]
    pub fn toggled(self, pressed: SortOrder) -> SortOrder {
        if self == pressed {
            SortOrder::Unset
        } else {
            pressed
        }
    }

    /// Wire string (`asc`, `desc` or empty)
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
            Self::Unset => "",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            "" => Ok(Self::Unset),
            other => Err(ModelError::UnknownSortOrder(other.to_string())),
        }
    }
}

/// Editable settings governing how one data series is computed and rendered
///
/// Owned by the canonical store; clients only ever hold snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetConfig {
    /// Identity
    pub id: DatasetConfigId,
    /// Owning chart
    pub chart_id: ChartId,
    /// Series name shown in the legend
    #[serde(default)]
    pub legend: String,
    /// Value transform template, empty for none
    #[serde(default)]
    pub formula: Formula,
    /// Record cap, absent for unlimited
    #[serde(default)]
    pub max_records: Option<NonZeroU32>,
    /// Progress goal for KPI-style charts
    #[serde(default)]
    pub goal: Option<f64>,
    /// Record ordering
    #[serde(default)]
    pub sort: SortOrder,
    /// Primary (border/line) color
    pub dataset_color: Color,
    /// Whether the area under the series is filled
    #[serde(default)]
    pub fill: bool,
    /// Fill color, a sequence when `multi_fill` is on
    #[serde(default)]
    pub fill_color: FillColor,
    /// One fill color per category
    #[serde(default)]
    pub multi_fill: bool,
}

impl DatasetConfig {
    /// New record with editor defaults
    #[must_use]
    pub fn new(id: impl Into<DatasetConfigId>, chart_id: impl Into<ChartId>) -> Self {
        Self {
            id: id.into(),
            chart_id: chart_id.into(),
            legend: String::new(),
            formula: Formula::none(),
            max_records: None,
            goal: None,
            sort: SortOrder::Unset,
            dataset_color: Color::new("rgba(0,0,0,0)"),
            fill: false,
            fill_color: FillColor::default(),
            multi_fill: false,
        }
    }

    /// With legend
    #[inline]
    #[must_use]
    pub fn with_legend(mut self, legend: impl Into<String>) -> Self {
        self.legend = legend.into();
        self
    }

    /// With formula
    #[inline]
    #[must_use]
    pub fn with_formula(mut self, formula: impl Into<Formula>) -> Self {
        self.formula = formula.into();
        self
    }

    /// With record cap
    #[inline]
    #[must_use]
    pub fn with_max_records(mut self, max_records: Option<NonZeroU32>) -> Self {
        self.max_records = max_records;
        self
    }

    /// With goal
    #[inline]
    #[must_use]
    pub fn with_goal(mut self, goal: Option<f64>) -> Self {
        self.goal = goal;
        self
    }

    /// With sort order
    #[inline]
    #[must_use]
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// With fill color and multi-fill flag
    #[inline]
    #[must_use]
    pub fn with_fill_color(mut self, fill_color: impl Into<FillColor>, multi_fill: bool) -> Self {
        self.fill_color = fill_color.into();
        self.multi_fill = multi_fill;
        self
    }

    /// Fill color as consumed by renderers
    ///
    /// With multi-fill off a one-element sequence is reported as a scalar.
    #[must_use]
    pub fn effective_fill_color(&self) -> FillColor {
        if self.multi_fill {
            self.fill_color.clone()
        } else {
            self.fill_color.normalized()
        }
    }

    /// Apply a single field change in place
    pub fn apply_change(&mut self, change: &FieldChange) {
        match change {
            FieldChange::Legend(legend) => self.legend.clone_from(legend),
            FieldChange::Formula(formula) => self.formula = formula.clone(),
            FieldChange::MaxRecords(max) => self.max_records = *max,
            FieldChange::Goal(goal) => self.goal = *goal,
            FieldChange::Sort(sort) => self.sort = *sort,
            FieldChange::DatasetColor(color) => self.dataset_color = color.clone(),
            FieldChange::Fill(fill) => self.fill = *fill,
            FieldChange::FillColor(fill_color) => self.fill_color = fill_color.clone(),
            FieldChange::MultiFill(multi) => self.multi_fill = *multi,
        }
    }

    /// Apply every change in order
    pub fn apply(&mut self, changes: &FieldChanges) {
        for change in changes.iter() {
            self.apply_change(change);
        }
    }
}

/// Parse a max-records input (positive integer, surrounding whitespace allowed)
///
/// # Errors
/// `ModelError::InvalidMaxRecords` for zero, negatives or non-integers.
pub fn parse_max_records(text: &str) -> Result<NonZeroU32, ModelError> {
    text.trim()
        .parse::<NonZeroU32>()
        .map_err(|_| ModelError::InvalidMaxRecords(text.to_string()))
}

/// Parse a goal input (plain finite number, `1000` rather than `1k`)
///
/// # Errors
/// `ModelError::InvalidGoal` for anything that is not a finite number.
pub fn parse_goal(text: &str) -> Result<f64, ModelError> {
    match text.trim().parse::<f64>() {
        Ok(goal) if goal.is_finite() => Ok(goal),
        _ => Err(ModelError::InvalidGoal(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sort_toggle_clears_active_order() {
        assert_eq!(SortOrder::Asc.toggled(SortOrder::Asc), SortOrder::Unset);
        assert_eq!(SortOrder::Asc.toggled(SortOrder::Desc), SortOrder::Desc);
        assert_eq!(SortOrder::Unset.toggled(SortOrder::Desc), SortOrder::Desc);
    }

    #[test]
    fn sort_order_wire_strings() {
        assert_eq!(serde_json::to_string(&SortOrder::Unset).unwrap(), "\"\"");
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn max_records_must_be_positive() {
        assert_eq!(parse_max_records(" 50 ").unwrap().get(), 50);
        assert!(parse_max_records("0").is_err());
        assert!(parse_max_records("-3").is_err());
        assert!(parse_max_records("1.5").is_err());
    }

    #[test]
    fn goal_rejects_suffixes() {
        assert_eq!(parse_goal("1000").unwrap(), 1000.0);
        assert_eq!(parse_goal("12.5").unwrap(), 12.5);
        assert!(parse_goal("1k").is_err());
        assert!(parse_goal("inf").is_err());
    }

    #[test]
    fn effective_fill_normalizes_single_mode() {
        let config = DatasetConfig::new(1u64, 1u64)
            .with_fill_color(vec![Color::new("#fff")], false);
        assert_eq!(config.effective_fill_color(), FillColor::Single(Color::new("#fff")));

        let multi = config.with_fill_color(vec![Color::new("#fff")], true);
        assert_eq!(multi.effective_fill_color(), FillColor::Multi(vec![Color::new("#fff")]));
    }

    #[test]
    fn canonical_record_camel_case() {
        let config = DatasetConfig::new(3u64, 1u64).with_max_records(NonZeroU32::new(10));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["maxRecords"], 10);
        assert_eq!(json["chartId"], 1);
        assert_eq!(json["multiFill"], false);
    }
}
