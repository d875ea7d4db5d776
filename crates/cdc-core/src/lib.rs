//! CDC Core - dataset settings editor
//!
//! The stateful side of editing one dataset of a chart:
//! - Reconciles locally edited drafts with the canonical record
//! - Resolves the dataset's slice of the chart's computed series
//! - Commits changes in two ordered phases: persist, then recompute
//!
//! # Example
//!
//! ```rust,ignore
//! use cdc_core::prelude::*;
//!
//! # async fn example(store: Arc<dyn CanonicalStore>, engine: Arc<dyn Recompute>) -> Result<(), SessionError> {
//! let mut session = EditorSession::open(store, engine, ChartId(1), DatasetConfigId(7), EditorConfig::new())?;
//!
//! session.edit(DraftField::MaxRecords, "50");
//! let outcome = session.save_max_records().await?;
//! assert!(outcome.recomputed);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod alignment;
pub mod collaborators;
pub mod config;
pub mod draft;
pub mod error;
pub mod pipeline;
pub mod session;

// In-memory collaborators and simulator
pub mod test_harness;

// Re-exports for convenience
pub use alignment::{alignment_drift, resolve_series_for_dataset, AlignmentDrift, ResolvedSeries, SeriesSlice};
pub use collaborators::{CanonicalStore, Recompute, RecomputeOptions};
pub use config::{ColorSettings, DraftSettings, EditorConfig, RecomputePolicy, RecomputeSettings};
pub use draft::{merge_canonical, DraftController, DraftField, DraftFields, FieldMask};
pub use error::{
    CommitError, ConfigError, DraftError, Phase, RecomputeError, SessionError, StoreError,
};
pub use pipeline::{allowed_transitions, validate_transition, CommitOutcome, CommitPipeline, CommitState};
pub use session::EditorSession;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with CDC Core
    pub use crate::{
        CanonicalStore, CommitError, CommitOutcome, CommitPipeline, DraftField, EditorConfig,
        EditorSession, Recompute, RecomputeOptions, SessionError,
    };
    pub use cdc_model::{ChartId, Color, DatasetConfigId, FieldChange, FieldChanges, SortOrder};
    pub use std::sync::Arc;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
