//! CDC Model
//!
//! Leaf types shared by every other crate in the workspace:
//! - [`DatasetConfig`]: the canonical per-dataset settings record
//! - [`Chart`]: ordered dataset configurations plus the computed series
//! - [`FieldChange`] / [`FieldChanges`]: partial updates sent to the store
//! - [`Formula`]: the transform template grammar contract
//!
//! Nothing in this crate performs I/O or holds mutable shared state.
//!
//! # Example
//!
//! ```rust
//! use cdc_model::{Chart, ChartType, DatasetConfig, FieldChange, FieldChanges, SortOrder};
//!
//! let mut chart = Chart::new(1u64, ChartType::Bar);
//! chart.push_dataset(DatasetConfig::new(7u64, 1u64).with_legend("Signups"));
//!
//! let changes = FieldChanges::single(FieldChange::Sort(SortOrder::Desc));
//! let dataset = chart.dataset_mut(7u64.into()).unwrap();
//! dataset.apply(&changes);
//! assert_eq!(dataset.sort, SortOrder::Desc);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod changes;
mod chart;
mod color;
mod dataset;
mod error;
mod formula;
mod ids;

pub use changes::{FieldChange, FieldChanges, FieldKind};
pub use chart::{Chart, ChartType, ComputedSeries};
pub use color::{Color, FillColor};
pub use dataset::{parse_goal, parse_max_records, DatasetConfig, SortOrder};
pub use error::ModelError;
pub use formula::{Formula, FormulaTemplate};
pub use ids::{ChartId, DatasetConfigId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
