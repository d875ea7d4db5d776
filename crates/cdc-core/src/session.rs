//! Editor session for one dataset of one chart
//!
//! Binds the canonical store's reactive chart feed to a [`DraftController`]
//! and a [`CommitPipeline`]. Every user action of the dataset settings panel
//! maps to one method producing exactly one change set.

use crate::alignment::{alignment_drift, resolve_series_for_dataset, AlignmentDrift, ResolvedSeries};
use crate::collaborators::{CanonicalStore, Recompute};
use crate::config::EditorConfig;
use crate::draft::{DraftController, DraftField, DraftFields};
use crate::error::SessionError;
use crate::pipeline::{CommitOutcome, CommitPipeline, CommitState};
use cdc_model::{
    Chart, ChartId, ChartType, Color, DatasetConfig, DatasetConfigId, FieldChange, FieldChanges,
    FillColor, Formula, SortOrder,
};
use cdc_palette::{category_colors, derive_palette, set_category_color, swatch, Palette};
use std::sync::Arc;
use tokio::sync::watch;

/// Editing view over a single dataset configuration
#[derive(Debug)]
pub struct EditorSession {
    chart_id: ChartId,
    dataset_id: DatasetConfigId,
    chart: watch::Receiver<Chart>,
    drafts: DraftController,
    pipeline: CommitPipeline,
    palette: Palette,
    config: EditorConfig,
}

impl EditorSession {
    /// Subscribe to the chart and reconcile drafts with the dataset's record
    ///
    /// # Errors
    /// `SessionError::ChartNotFound` if the store does not publish the chart,
    /// `SessionError::DatasetNotFound` if the dataset is not part of it.
    pub fn open(
        store: Arc<dyn CanonicalStore>,
        recompute: Arc<dyn Recompute>,
        chart_id: ChartId,
        dataset_id: DatasetConfigId,
        config: EditorConfig,
    ) -> Result<Self, SessionError> {
        let chart = store
            .subscribe(chart_id)
            .ok_or(SessionError::ChartNotFound(chart_id))?;
        let pipeline = CommitPipeline::new(store, recompute, chart_id, dataset_id, config.recompute);

        let mut session = Self {
            chart_id,
            dataset_id,
            chart,
            drafts: DraftController::new(config.field_mask()),
            pipeline,
            palette: config.palette(),
            config,
        };
        session.sync()?;

        tracing::info!(%chart_id, %dataset_id, "editor session opened");
        Ok(session)
    }

    #[inline]
    #[must_use]
    pub fn chart_id(&self) -> ChartId {
        self.chart_id
    }

    #[inline]
    #[must_use]
    pub fn dataset_id(&self) -> DatasetConfigId {
        self.dataset_id
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Latest chart snapshot
    #[must_use]
    pub fn chart(&self) -> Chart {
        self.chart.borrow().clone()
    }

    #[must_use]
    pub fn chart_type(&self) -> ChartType {
        self.chart.borrow().chart_type
    }

    /// Canonical record of this dataset in the latest snapshot
    ///
    /// # Errors
    /// `SessionError::DatasetNotFound` if the dataset was removed.
    pub fn canonical(&self) -> Result<DatasetConfig, SessionError> {
        let chart = self.chart.borrow();
        chart
            .dataset(self.dataset_id)
            .cloned()
            .ok_or(SessionError::DatasetNotFound {
                chart_id: self.chart_id,
                dataset_id: self.dataset_id,
            })
    }

    #[inline]
    #[must_use]
    pub fn drafts(&self) -> &DraftFields {
        self.drafts.drafts()
    }

    #[inline]
    #[must_use]
    pub fn draft(&self, field: DraftField) -> &str {
        self.drafts.draft(field)
    }

    /// State of the last commit
    #[must_use]
    pub fn commit_state(&self) -> CommitState {
        self.pipeline.state()
    }

    /// Re-run reconciliation against the latest snapshot
    ///
    /// # Errors
    /// `SessionError::DatasetNotFound` if the dataset was removed.
    pub fn sync(&mut self) -> Result<(), SessionError> {
        self.chart.mark_unchanged();
        let canonical = self.canonical()?;
        self.drafts.on_canonical_update(&canonical);
        Ok(())
    }

    /// Wait for the next published snapshot, then sync
    ///
    /// # Errors
    /// `SessionError::Closed` when the store drops the feed.
    pub async fn wait_for_update(&mut self) -> Result<(), SessionError> {
        self.chart.changed().await.map_err(|_| SessionError::Closed)?;
        self.sync()
    }

    /// Keystroke into a draft field
    pub fn edit(&mut self, field: DraftField, text: impl Into<String>) {
        self.drafts.edit(field, text);
    }

    /// Dirty drafts
    ///
    /// # Errors
    /// `SessionError::DatasetNotFound` if the dataset was removed.
    pub fn pending_fields(&self) -> Result<Vec<DraftField>, SessionError> {
        Ok(self.drafts.pending_fields(&self.canonical()?))
    }

    // Legend

    /// Commit the legend draft
    ///
    /// # Errors
    /// Draft or commit failures.
    pub async fn save_legend(&mut self) -> Result<CommitOutcome, SessionError> {
        let changes = self.drafts.confirm(DraftField::Legend)?;
        self.commit(changes).await
    }

    // Formula

    /// Seed the formula draft with the identity template; nothing is committed
    pub fn add_formula(&mut self) {
        self.drafts.edit(DraftField::Formula, Formula::IDENTITY);
    }

    /// Commit the formula draft
    ///
    /// # Errors
    /// Commit failures.
    pub async fn apply_formula(&mut self) -> Result<CommitOutcome, SessionError> {
        let changes = self.drafts.confirm(DraftField::Formula)?;
        self.commit(changes).await
    }

    /// Seed and commit the example percentage formula
    ///
    /// # Errors
    /// Commit failures.
    pub async fn use_example_formula(&mut self) -> Result<CommitOutcome, SessionError> {
        self.drafts.edit(DraftField::Formula, Formula::EXAMPLE);
        self.apply_formula().await
    }

    /// Clear the formula draft and the canonical formula
    ///
    /// # Errors
    /// Commit failures.
    pub async fn remove_formula(&mut self) -> Result<CommitOutcome, SessionError> {
        let changes = self.drafts.clear(DraftField::Formula);
        self.commit(changes).await
    }

    // Max records

    /// Commit the max-records draft
    ///
    /// # Errors
    /// `DraftError` for empty or non-positive text, or commit failures.
    pub async fn save_max_records(&mut self) -> Result<CommitOutcome, SessionError> {
        let changes = self.drafts.confirm(DraftField::MaxRecords)?;
        self.commit(changes).await
    }

    /// Remove the record cap
    ///
    /// # Errors
    /// Commit failures.
    pub async fn clear_max_records(&mut self) -> Result<CommitOutcome, SessionError> {
        let changes = self.drafts.clear(DraftField::MaxRecords);
        self.commit(changes).await
    }

    // Goal

    /// Seed the goal draft with the configured default
    ///
    /// # Errors
    /// `SessionError::Unsupported` for table charts.
    pub fn start_goal(&mut self) -> Result<(), SessionError> {
        self.require("goal", ChartType::supports_goal)?;
        let seed = self.config.drafts.default_goal.to_string();
        self.drafts.edit(DraftField::Goal, seed);
        Ok(())
    }

    /// Commit the goal draft
    ///
    /// # Errors
    /// `SessionError::Unsupported` for table charts, draft or commit failures.
    pub async fn save_goal(&mut self) -> Result<CommitOutcome, SessionError> {
        self.require("goal", ChartType::supports_goal)?;
        let changes = self.drafts.confirm(DraftField::Goal)?;
        self.commit(changes).await
    }

    /// Remove the goal
    ///
    /// # Errors
    /// `SessionError::Unsupported` for table charts, or commit failures.
    pub async fn remove_goal(&mut self) -> Result<CommitOutcome, SessionError> {
        self.require("goal", ChartType::supports_goal)?;
        let changes = self.drafts.clear(DraftField::Goal);
        self.commit(changes).await
    }

    // Sort

    /// Press a sort button; pressing the active order unsets it
    ///
    /// # Errors
    /// Commit failures.
    pub async fn toggle_sort(&mut self, order: SortOrder) -> Result<CommitOutcome, SessionError> {
        let next = self.canonical()?.sort.toggled(order);
        self.commit(FieldChange::Sort(next).into()).await
    }

    /// Unset the sort order
    ///
    /// # Errors
    /// Commit failures.
    pub async fn clear_sort(&mut self) -> Result<CommitOutcome, SessionError> {
        self.commit(FieldChange::Sort(SortOrder::Unset).into()).await
    }

    // Colors

    /// Set the dataset (line/border) color
    ///
    /// # Errors
    /// Commit failures.
    pub async fn set_dataset_color(&mut self, color: Color) -> Result<CommitOutcome, SessionError> {
        self.commit(FieldChange::DatasetColor(color).into()).await
    }

    /// Flip `fill`; the fill color restarts as transparent
    ///
    /// # Errors
    /// Commit failures.
    pub async fn toggle_fill(&mut self) -> Result<CommitOutcome, SessionError> {
        let fill = !self.canonical()?.fill;
        let changes = FieldChanges::single(FieldChange::Fill(fill)).with(FieldChange::FillColor(
            FillColor::Single(self.config.colors.transparent.clone()),
        ));
        self.commit(changes).await
    }

    /// Replace the whole fill color, or one category's color
    ///
    /// Returns `Ok(None)` without committing when `index` is past the end
    /// of the current colors.
    ///
    /// # Errors
    /// Commit failures.
    pub async fn set_fill_color(
        &mut self,
        color: Color,
        index: Option<usize>,
    ) -> Result<Option<CommitOutcome>, SessionError> {
        let fill_color = match index {
            None => FillColor::Single(color),
            Some(index) => {
                let current = self.canonical()?.fill_color;
                let Some(edited) = set_category_color(&current, index, color) else {
                    tracing::debug!(
                        dataset_id = %self.dataset_id,
                        index,
                        len = current.len(),
                        "category color index out of bounds"
                    );
                    return Ok(None);
                };
                edited
            }
        };
        self.commit(FieldChange::FillColor(fill_color).into())
            .await
            .map(Some)
    }

    /// Toggle one-color-per-category fill
    ///
    /// Enabling extends the fill colors to the number of categories in the
    /// resolved series (zero when the series is absent); disabling collapses
    /// them to the first color. Both fields are committed together.
    ///
    /// # Errors
    /// `SessionError::Unsupported` for line charts, or commit failures.
    pub async fn toggle_multi_fill(&mut self) -> Result<CommitOutcome, SessionError> {
        self.require("multi-fill", ChartType::supports_multi_fill)?;
        let canonical = self.canonical()?;
        let enabling = !canonical.multi_fill;
        let category_count = self.series().map_or(0, |series| series.labels.len());
        let fill_color = derive_palette(&canonical.fill_color, enabling, category_count, &self.palette);

        let changes = FieldChanges::single(FieldChange::MultiFill(enabling))
            .with(FieldChange::FillColor(fill_color));
        self.commit(changes).await
    }

    // Rendering

    /// This dataset's computed values and the chart labels
    #[must_use]
    pub fn series(&self) -> Option<ResolvedSeries> {
        resolve_series_for_dataset(&self.chart.borrow(), self.dataset_id).map(|s| s.to_resolved())
    }

    /// Label and rendered color of every category
    ///
    /// # Errors
    /// `SessionError::DatasetNotFound` if the dataset was removed.
    pub fn category_colors(&self) -> Result<Vec<(String, Color)>, SessionError> {
        let fill_color = self.canonical()?.fill_color;
        let Some(series) = self.series() else {
            return Ok(Vec::new());
        };
        Ok(category_colors(&fill_color, &series.labels, &self.config.colors.neutral)
            .into_iter()
            .map(|(label, color)| (label.to_string(), color))
            .collect())
    }

    /// Color shown on a picker swatch
    #[must_use]
    pub fn swatch(&self, color: &Color) -> Color {
        swatch(color, &self.config.colors.primary).clone()
    }

    /// Row count mismatch in the latest snapshot
    #[must_use]
    pub fn alignment_drift(&self) -> Option<AlignmentDrift> {
        alignment_drift(&self.chart.borrow())
    }

    fn require(&self, action: &'static str, supported: fn(ChartType) -> bool) -> Result<(), SessionError> {
        let chart_type = self.chart_type();
        if supported(chart_type) {
            Ok(())
        } else {
            Err(SessionError::Unsupported { action, chart_type })
        }
    }

    async fn commit(&mut self, changes: FieldChanges) -> Result<CommitOutcome, SessionError> {
        let result = self.pipeline.commit(changes).await;
        let persisted = match &result {
            Ok(_) => true,
            Err(err) => err.persisted().is_some(),
        };
        // The canonical record is untouched when phase 1 fails, so syncing
        // would put the old value back over the user's draft.
        if persisted {
            if let Err(err) = self.sync() {
                tracing::warn!(dataset_id = %self.dataset_id, "sync after commit failed: {}", err);
            }
        }
        Ok(result?)
    }
}
