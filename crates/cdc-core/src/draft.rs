//! Draft/canonical synchronization
//!
//! Drafts are the text the user is typing into the legend, formula, max
//! records and goal inputs. They are never written through to the canonical
//! record; only an explicit confirm turns a draft into a [`FieldChanges`].
//!
//! Reconciliation rule, applied on every canonical update and nowhere else:
//!
//! > For each tracked field, a truthy canonical value overwrites the draft;
//! > a falsy canonical value (empty text, absent, zero) leaves the draft
//! > untouched.
//!
//! The asymmetry is intentional. A field cleared remotely therefore leaves
//! its last draft in place, which then shows as pending.

use crate::error::DraftError;
use cdc_model::{
    parse_goal, parse_max_records, DatasetConfig, FieldChange, FieldChanges, FieldKind, Formula,
};
use serde::{Deserialize, Serialize};

/// A draft-backed field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DraftField {
    Legend,
    Formula,
    MaxRecords,
    Goal,
}

impl DraftField {
    /// Every draft-backed field
    pub const ALL: [DraftField; 4] = [
        DraftField::Legend,
        DraftField::Formula,
        DraftField::MaxRecords,
        DraftField::Goal,
    ];

    /// Canonical field this draft shadows
    #[inline]
    #[must_use]
    pub fn kind(self) -> FieldKind {
        match self {
            Self::Legend => FieldKind::Legend,
            Self::Formula => FieldKind::Formula,
            Self::MaxRecords => FieldKind::MaxRecords,
            Self::Goal => FieldKind::Goal,
        }
    }

    /// Reconciliation flag for this field
    #[inline]
    #[must_use]
    pub fn flag(self) -> FieldMask {
        match self {
            Self::Legend => FieldMask::LEGEND,
            Self::Formula => FieldMask::FORMULA,
            Self::MaxRecords => FieldMask::MAX_RECORDS,
            Self::Goal => FieldMask::GOAL,
        }
    }

    /// Canonical value as draft text, `None` when falsy
    #[must_use]
    pub fn canonical_text(self, canonical: &DatasetConfig) -> Option<String> {
        match self {
            Self::Legend => (!canonical.legend.is_empty()).then(|| canonical.legend.clone()),
            Self::Formula => {
                (!canonical.formula.is_empty()).then(|| canonical.formula.as_str().to_string())
            }
            Self::MaxRecords => canonical.max_records.map(|max| max.to_string()),
            Self::Goal => canonical
                .goal
                .filter(|goal| *goal != 0.0 && !goal.is_nan())
                .map(|goal| goal.to_string()),
        }
    }

    /// Whether `draft` differs from the canonical value
    ///
    /// Numeric drafts compare by value, so `050` matches a cap of 50. An
    /// empty draft matches an absent value; a non-empty draft never does,
    /// and neither does text that fails to parse.
    #[must_use]
    pub fn differs(self, draft: &str, canonical: &DatasetConfig) -> bool {
        match self {
            Self::Legend => draft != canonical.legend,
            Self::Formula => draft != canonical.formula.as_str(),
            Self::MaxRecords => {
                if draft.trim().is_empty() {
                    canonical.max_records.is_some()
                } else {
                    match (parse_max_records(draft), canonical.max_records) {
                        (Ok(parsed), Some(max)) => parsed != max,
                        _ => true,
                    }
                }
            }
            Self::Goal => {
                if draft.trim().is_empty() {
                    canonical.goal.is_some()
                } else {
                    match (parse_goal(draft), canonical.goal) {
                        (Ok(parsed), Some(goal)) => parsed != goal,
                        _ => true,
                    }
                }
            }
        }
    }

    /// Turn draft text into a field change
    ///
    /// # Errors
    /// `DraftError::Empty` for an empty legend, max records or goal;
    /// `DraftError::Invalid` when the numeric text does not parse. An empty
    /// formula is valid and removes the transform.
    pub fn parse(self, draft: &str) -> Result<FieldChange, DraftError> {
        if self != Self::Formula && draft.trim().is_empty() {
            return Err(DraftError::Empty(self));
        }
        Ok(match self {
            Self::Legend => FieldChange::Legend(draft.to_string()),
            Self::Formula => FieldChange::Formula(Formula::new(draft)),
            Self::MaxRecords => FieldChange::MaxRecords(Some(parse_max_records(draft)?)),
            Self::Goal => FieldChange::Goal(Some(parse_goal(draft)?)),
        })
    }

    /// Change that clears the canonical field
    #[must_use]
    pub fn cleared(self) -> FieldChange {
        match self {
            Self::Legend => FieldChange::Legend(String::new()),
            Self::Formula => FieldChange::Formula(Formula::none()),
            Self::MaxRecords => FieldChange::MaxRecords(None),
            Self::Goal => FieldChange::Goal(None),
        }
    }
}

impl std::fmt::Display for DraftField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind().fmt(f)
    }
}

bitflags::bitflags! {
    /// Set of draft fields subject to reconciliation
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct FieldMask: u8 {
        const LEGEND      = 0b0001;
        const FORMULA     = 0b0010;
        const MAX_RECORDS = 0b0100;
        const GOAL        = 0b1000;
    }
}

impl FieldMask {
    /// Whether `field` is reconciled
    #[inline]
    #[must_use]
    pub fn tracks(self, field: DraftField) -> bool {
        self.contains(field.flag())
    }

    /// Tracked fields in declaration order
    pub fn fields(self) -> impl Iterator<Item = DraftField> {
        DraftField::ALL.into_iter().filter(move |f| self.tracks(*f))
    }
}

impl From<DraftField> for FieldMask {
    fn from(field: DraftField) -> Self {
        field.flag()
    }
}

/// Local, non-persisted shadow of the draft-backed fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftFields {
    pub legend: String,
    pub formula: String,
    pub max_records: String,
    pub goal: String,
}

impl DraftFields {
    #[must_use]
    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Legend => &self.legend,
            DraftField::Formula => &self.formula,
            DraftField::MaxRecords => &self.max_records,
            DraftField::Goal => &self.goal,
        }
    }

    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let slot = match field {
            DraftField::Legend => &mut self.legend,
            DraftField::Formula => &mut self.formula,
            DraftField::MaxRecords => &mut self.max_records,
            DraftField::Goal => &mut self.goal,
        };
        *slot = value.into();
    }
}

/// Merge a canonical record into drafts
///
/// Truthy canonical values overwrite masked drafts; everything else is kept.
#[must_use]
pub fn merge_canonical(draft: &DraftFields, canonical: &DatasetConfig, mask: FieldMask) -> DraftFields {
    let mut merged = draft.clone();
    for field in mask.fields() {
        if let Some(text) = field.canonical_text(canonical) {
            merged.set(field, text);
        }
    }
    merged
}

/// Holds drafts for one editing view
///
/// Created empty when the view opens and dropped when it closes.
#[derive(Debug, Clone, Default)]
pub struct DraftController {
    drafts: DraftFields,
    mask: FieldMask,
}

impl DraftController {
    /// Empty drafts reconciling the given fields
    #[inline]
    #[must_use]
    pub fn new(mask: FieldMask) -> Self {
        Self {
            drafts: DraftFields::default(),
            mask,
        }
    }

    #[inline]
    #[must_use]
    pub fn drafts(&self) -> &DraftFields {
        &self.drafts
    }

    #[inline]
    #[must_use]
    pub fn draft(&self, field: DraftField) -> &str {
        self.drafts.get(field)
    }

    #[inline]
    #[must_use]
    pub fn mask(&self) -> FieldMask {
        self.mask
    }

    /// External update of the canonical record
    pub fn on_canonical_update(&mut self, canonical: &DatasetConfig) {
        let merged = merge_canonical(&self.drafts, canonical, self.mask);
        if merged != self.drafts {
            tracing::debug!(dataset_id = %canonical.id, "drafts reconciled with canonical record");
        }
        self.drafts = merged;
    }

    /// User keystroke; never touches canonical state
    pub fn edit(&mut self, field: DraftField, value: impl Into<String>) {
        self.drafts.set(field, value);
    }

    /// Whether the field shows as pending save
    #[must_use]
    pub fn is_pending(&self, field: DraftField, canonical: &DatasetConfig) -> bool {
        field.differs(self.drafts.get(field), canonical)
    }

    /// All pending fields
    #[must_use]
    pub fn pending_fields(&self, canonical: &DatasetConfig) -> Vec<DraftField> {
        DraftField::ALL
            .into_iter()
            .filter(|f| self.is_pending(*f, canonical))
            .collect()
    }

    /// Change set for confirming exactly one field
    ///
    /// # Errors
    /// See [`DraftField::parse`].
    pub fn confirm(&self, field: DraftField) -> Result<FieldChanges, DraftError> {
        field.parse(self.drafts.get(field)).map(FieldChanges::single)
    }

    /// Empty the draft and return the change that clears the canonical field
    pub fn clear(&mut self, field: DraftField) -> FieldChanges {
        self.drafts.set(field, String::new());
        FieldChanges::single(field.cleared())
    }
}
