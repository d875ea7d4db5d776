//! Partial updates to a dataset configuration
//!
//! A [`FieldChanges`] set holds at most one change per field; inserting a
//! second change for the same field replaces the first.

use crate::color::{Color, FillColor};
use crate::dataset::SortOrder;
use crate::formula::Formula;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Which field a change targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    /// `legend`
    Legend,
    /// `formula`
    Formula,
    /// `maxRecords`
    MaxRecords,
    /// `goal`
    Goal,
    /// `sort`
    Sort,
    /// `datasetColor`
    DatasetColor,
    /// `fill`
    Fill,
    /// `fillColor`
    FillColor,
    /// `multiFill`
    MultiFill,
}

impl FieldKind {
    /// Whether a change to this field alters computed values
    ///
    /// Formula, cap and goal feed the value pipeline. Colors, sort and legend
    /// are presentation-level.
    #[inline]
    #[must_use]
    pub fn affects_values(self) -> bool {
        matches!(self, Self::Formula | Self::MaxRecords | Self::Goal)
    }

    /// Canonical record field name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legend => "legend",
            Self::Formula => "formula",
            Self::MaxRecords => "maxRecords",
            Self::Goal => "goal",
            Self::Sort => "sort",
            Self::DatasetColor => "datasetColor",
            Self::Fill => "fill",
            Self::FillColor => "fillColor",
            Self::MultiFill => "multiFill",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A new value for one field; `None` clears optional fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldChange {
    /// Set legend
    Legend(String),
    /// Set formula (empty removes it)
    Formula(Formula),
    /// Set or clear the record cap
    MaxRecords(Option<NonZeroU32>),
    /// Set or clear the goal
    Goal(Option<f64>),
    /// Set sort order
    Sort(SortOrder),
    /// Set primary color
    DatasetColor(Color),
    /// Toggle fill
    Fill(bool),
    /// Replace fill color(s)
    FillColor(FillColor),
    /// Toggle per-category fill
    MultiFill(bool),
}

impl FieldChange {
    /// Targeted field
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Legend(_) => FieldKind::Legend,
            Self::Formula(_) => FieldKind::Formula,
            Self::MaxRecords(_) => FieldKind::MaxRecords,
            Self::Goal(_) => FieldKind::Goal,
            Self::Sort(_) => FieldKind::Sort,
            Self::DatasetColor(_) => FieldKind::DatasetColor,
            Self::Fill(_) => FieldKind::Fill,
            Self::FillColor(_) => FieldKind::FillColor,
            Self::MultiFill(_) => FieldKind::MultiFill,
        }
    }
}

/// An ordered set of field changes committed together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldChanges(Vec<FieldChange>);

impl FieldChanges {
    /// Empty change set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Change set with one entry
    #[inline]
    #[must_use]
    pub fn single(change: FieldChange) -> Self {
        Self(vec![change])
    }

    /// Add a change, replacing any earlier change to the same field
    #[must_use]
    pub fn with(mut self, change: FieldChange) -> Self {
        self.insert(change);
        self
    }

    /// Add a change in place, replacing any earlier change to the same field
    pub fn insert(&mut self, change: FieldChange) {
        let kind = change.kind();
        match self.0.iter_mut().find(|c| c.kind() == kind) {
            Some(existing) => *existing = change,
            None => self.0.push(change),
        }
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, FieldChange> {
        self.0.iter()
    }

    /// Fields touched, in insertion order
    #[must_use]
    pub fn kinds(&self) -> Vec<FieldKind> {
        self.0.iter().map(FieldChange::kind).collect()
    }

    /// Whether a given field is touched
    #[must_use]
    pub fn touches(&self, kind: FieldKind) -> bool {
        self.0.iter().any(|c| c.kind() == kind)
    }

    /// Whether any touched field feeds the value pipeline
    #[must_use]
    pub fn affects_values(&self) -> bool {
        self.0.iter().any(|c| c.kind().affects_values())
    }

    /// Number of changes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No changes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<FieldChange> for FieldChanges {
    fn from(change: FieldChange) -> Self {
        Self::single(change)
    }
}

impl<'a> IntoIterator for &'a FieldChanges {
    type Item = &'a FieldChange;
    type IntoIter = std::slice::Iter<'a, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for FieldChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|c| c.kind().as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
