//! Editing-session simulator
//!
//! Drives an [`EditorSession`] over the in-memory collaborators with a
//! seeded stream of user actions, injected collaborator failures and remote
//! edits, checking after every step:
//! - no recompute runs after a failed persist
//! - the resolver agrees with the positional computed rows
//! - enabling multi-fill leaves at least one color per category
//! - a remotely cleared field never clears its draft
//! - a persisted draft no longer shows as pending

use super::{SourceRow, TestHarness};
use crate::alignment::{alignment_drift, resolve_series_for_dataset};
use crate::config::EditorConfig;
use crate::draft::DraftField;
use crate::error::{Phase, SessionError};
use crate::pipeline::{CommitOutcome, CommitState};
use crate::session::EditorSession;
use cdc_model::{Chart, ChartId, ChartType, Color, DatasetConfig, DatasetConfigId, SortOrder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

const CHART_ID: u64 = 1;

/// Simulator configuration
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of user actions
    pub edits: u64,
    /// Probability that a step's persist fails
    pub persist_failure_rate: f64,
    /// Probability that a step's recompute fails
    pub recompute_failure_rate: f64,
    /// Probability of a remote edit before a step
    pub remote_edit_rate: f64,
    pub datasets: usize,
    pub categories: usize,
    pub chart_type: ChartType,
    pub stop_on_first_violation: bool,
    /// Editor configuration under test
    pub editor: EditorConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            edits: 1_000,
            persist_failure_rate: 0.1,
            recompute_failure_rate: 0.1,
            remote_edit_rate: 0.05,
            datasets: 3,
            categories: 5,
            chart_type: ChartType::Bar,
            stop_on_first_violation: false,
            editor: EditorConfig::default(),
        }
    }
}

/// A simulated user action or remote edit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimulatedAction {
    EditLegend(String),
    SaveLegend,
    AddFormula,
    ApplyFormula,
    UseExampleFormula,
    RemoveFormula,
    EditMaxRecords(String),
    SaveMaxRecords,
    ClearMaxRecords,
    StartGoal,
    EditGoal(String),
    SaveGoal,
    RemoveGoal,
    ToggleSort(SortOrder),
    ClearSort,
    SetDatasetColor(Color),
    ToggleFill,
    SetFillColor { color: Color, index: Option<usize> },
    ToggleMultiFill,
    /// Another editor clears a draft-backed field
    RemoteClear(DraftField),
    /// Another editor moves the last dataset to the front
    RemoteReorder,
}

impl SimulatedAction {
    /// Action name for statistics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::EditLegend(_) => "edit_legend",
            Self::SaveLegend => "save_legend",
            Self::AddFormula => "add_formula",
            Self::ApplyFormula => "apply_formula",
            Self::UseExampleFormula => "use_example_formula",
            Self::RemoveFormula => "remove_formula",
            Self::EditMaxRecords(_) => "edit_max_records",
            Self::SaveMaxRecords => "save_max_records",
            Self::ClearMaxRecords => "clear_max_records",
            Self::StartGoal => "start_goal",
            Self::EditGoal(_) => "edit_goal",
            Self::SaveGoal => "save_goal",
            Self::RemoveGoal => "remove_goal",
            Self::ToggleSort(_) => "toggle_sort",
            Self::ClearSort => "clear_sort",
            Self::SetDatasetColor(_) => "set_dataset_color",
            Self::ToggleFill => "toggle_fill",
            Self::SetFillColor { .. } => "set_fill_color",
            Self::ToggleMultiFill => "toggle_multi_fill",
            Self::RemoteClear(_) => "remote_clear",
            Self::RemoteReorder => "remote_reorder",
        }
    }

    /// Draft field this action persists, if any
    #[must_use]
    pub fn confirms(&self) -> Option<DraftField> {
        match self {
            Self::SaveLegend => Some(DraftField::Legend),
            Self::ApplyFormula | Self::UseExampleFormula | Self::RemoveFormula => {
                Some(DraftField::Formula)
            }
            Self::SaveMaxRecords | Self::ClearMaxRecords => Some(DraftField::MaxRecords),
            Self::SaveGoal | Self::RemoveGoal => Some(DraftField::Goal),
            _ => None,
        }
    }
}

/// A violation detected during simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Harness could not be set up
    Setup { details: String },
    /// Recompute ran although the persist failed
    RecomputeAfterPersistFailure { step: u64, action: SimulatedAction },
    /// Commit state does not reflect the failed phase
    CommitState {
        step: u64,
        expected: CommitState,
        actual: CommitState,
    },
    /// Collaborator failure that was not injected
    UnexpectedFailure {
        step: u64,
        action: SimulatedAction,
        error: String,
    },
    /// Resolver disagrees with the positional computed rows
    Misaligned { step: u64, details: String },
    /// Fewer fill colors than categories after enabling multi-fill
    PaletteTooShort {
        step: u64,
        categories: usize,
        colors: usize,
    },
    /// Draft changed by a falsy canonical value
    DraftClobbered {
        step: u64,
        field: DraftField,
        before: String,
        after: String,
    },
    /// Persisted draft still differs from the canonical record
    StillPending { step: u64, field: DraftField },
}

/// Statistics collected during simulation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulatorStats {
    pub steps: u64,
    pub commits: u64,
    pub recomputes: u64,
    pub persist_failures: u64,
    pub recompute_failures: u64,
    /// Draft parse failures and unsupported actions
    pub rejected: u64,
    /// Actions that committed nothing by design
    pub skipped: u64,
    pub local: u64,
    pub remote_edits: u64,
    pub actions_by_type: BTreeMap<String, u64>,
}

/// Final report from the simulator
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    pub config: SimulatorConfig,
    pub stats: SimulatorStats,
    pub violations: Vec<Violation>,
    pub final_canonical: Option<DatasetConfig>,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate a text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Dataset Editor Simulator Report ===\n\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Chart Type: {:?}", self.config.chart_type);
        let _ = writeln!(report, "Steps: {}", self.stats.steps);
        let _ = writeln!(report, "Commits: {}", self.stats.commits);
        let _ = writeln!(report, "Recomputes: {}", self.stats.recomputes);
        let _ = writeln!(report, "Persist Failures: {}", self.stats.persist_failures);
        let _ = writeln!(report, "Recompute Failures: {}", self.stats.recompute_failures);
        let _ = writeln!(report, "Rejected: {}", self.stats.rejected);
        let _ = writeln!(report, "Skipped: {}", self.stats.skipped);
        let _ = writeln!(report, "Remote Edits: {}", self.stats.remote_edits);
        let _ = writeln!(report, "Violations: {}", self.violations.len());

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {:?}", i + 1, v);
            }
        }

        let _ = write!(
            report,
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

enum ActionResult {
    Committed(CommitOutcome),
    Local,
    Skipped,
}

/// Run the simulator
pub async fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    let (harness, mut session) = match setup(&config, &mut rng).await {
        Ok(pair) => pair,
        Err(details) => {
            return SimulatorReport {
                config,
                stats,
                violations: vec![Violation::Setup { details }],
                final_canonical: None,
            }
        }
    };

    for step in 0..config.edits {
        let before = violations.len();

        if chance(&mut rng, config.remote_edit_rate) {
            let action = generate_remote(&mut rng);
            stats.remote_edits += 1;
            *stats.actions_by_type.entry(action.name().to_string()).or_insert(0) += 1;
            remote_edit(&harness, &mut session, step, &action, &mut violations);
        }

        let action = generate_action(&mut rng, &config);
        let persist_armed = chance(&mut rng, config.persist_failure_rate);
        let recompute_armed = chance(&mut rng, config.recompute_failure_rate);
        harness.store.fail_next_updates(usize::from(persist_armed));
        harness.engine.fail_next_runs(usize::from(recompute_armed));

        let updates_before = harness.store.update_count();
        let runs_before = harness.engine.run_count();
        let categories_before = session.series().map_or(0, |s| s.labels.len());

        tracing::debug!(step, ?action, persist_armed, recompute_armed, "simulated action");
        let result = execute(&mut session, &action).await;

        harness.store.fail_next_updates(0);
        harness.engine.fail_next_runs(0);
        stats.steps += 1;
        *stats.actions_by_type.entry(action.name().to_string()).or_insert(0) += 1;

        // Phase 2 never follows a failed phase 1
        let failed_persist = harness.store.calls()[updates_before..]
            .iter()
            .any(|call| !call.succeeded);
        if failed_persist {
            if harness.engine.run_count() > runs_before {
                violations.push(Violation::RecomputeAfterPersistFailure {
                    step,
                    action: action.clone(),
                });
            }
            let expected = CommitState::Failed(Phase::Persist);
            if session.commit_state() != expected {
                violations.push(Violation::CommitState {
                    step,
                    expected,
                    actual: session.commit_state(),
                });
            }
        }

        let mut persisted = false;
        match &result {
            Ok(ActionResult::Committed(outcome)) => {
                stats.commits += 1;
                persisted = true;
                if outcome.recomputed {
                    stats.recomputes += 1;
                    if let Some(details) = check_alignment(&session.chart()) {
                        violations.push(Violation::Misaligned { step, details });
                    }
                }
                if action == SimulatedAction::ToggleMultiFill && outcome.updated.multi_fill {
                    let colors = outcome.updated.fill_color.len();
                    if colors < categories_before {
                        violations.push(Violation::PaletteTooShort {
                            step,
                            categories: categories_before,
                            colors,
                        });
                    }
                }
            }
            Ok(ActionResult::Local) => stats.local += 1,
            Ok(ActionResult::Skipped) => stats.skipped += 1,
            Err(SessionError::Commit(err)) => {
                let injected = match err.phase() {
                    Some(Phase::Persist) => {
                        stats.persist_failures += 1;
                        persist_armed
                    }
                    Some(Phase::Recompute) => {
                        stats.recompute_failures += 1;
                        persisted = true;
                        recompute_armed
                    }
                    None => false,
                };
                if !injected {
                    violations.push(Violation::UnexpectedFailure {
                        step,
                        action: action.clone(),
                        error: err.to_string(),
                    });
                }
            }
            Err(SessionError::Draft(_) | SessionError::Unsupported { .. }) => stats.rejected += 1,
            Err(err) => violations.push(Violation::UnexpectedFailure {
                step,
                action: action.clone(),
                error: err.to_string(),
            }),
        }

        if persisted {
            if let Some(field) = action.confirms() {
                if session.pending_fields().is_ok_and(|p| p.contains(&field)) {
                    violations.push(Violation::StillPending { step, field });
                }
            }
        }

        if config.stop_on_first_violation && violations.len() > before {
            break;
        }
    }

    SimulatorReport {
        config,
        stats,
        violations,
        final_canonical: session.canonical().ok(),
    }
}

async fn setup(
    config: &SimulatorConfig,
    rng: &mut StdRng,
) -> Result<(TestHarness, EditorSession), String> {
    let datasets = config.datasets.max(1);
    let mut chart = Chart::new(CHART_ID, config.chart_type);
    for id in 1..=datasets as u64 {
        chart.push_dataset(DatasetConfig::new(id, CHART_ID).with_legend(format!("Series {id}")));
    }
    let ids: Vec<DatasetConfigId> = chart.dataset_configs.iter().map(|d| d.id).collect();

    let harness = TestHarness::new(chart);
    for id in &ids {
        let rows = (0..config.categories)
            .map(|c| SourceRow::new(format!("c{c}"), f64::from(rng.random_range(0..1_000u32))))
            .collect();
        harness.engine.set_source(*id, rows);
    }

    let chart_id = ChartId(CHART_ID);
    harness
        .recompute(chart_id)
        .await
        .map_err(|e| format!("initial recompute failed: {e}"))?;

    let target = ids[rng.random_range(0..ids.len())];
    let session = harness
        .open(chart_id, target, config.editor.clone())
        .map_err(|e| format!("failed to open session: {e}"))?;
    Ok((harness, session))
}

fn chance(rng: &mut StdRng, probability: f64) -> bool {
    rng.random::<f64>() < probability
}

fn pick<T: Clone>(rng: &mut StdRng, choices: &[T]) -> T {
    choices[rng.random_range(0..choices.len())].clone()
}

fn random_color(rng: &mut StdRng) -> Color {
    Color::from_rgba(rng.random(), rng.random(), rng.random(), pick(rng, &[0.0, 0.5, 1.0]))
}

fn generate_action(rng: &mut StdRng, config: &SimulatorConfig) -> SimulatedAction {
    match rng.random_range(0..19) {
        0 => SimulatedAction::EditLegend(format!("Series {}", rng.random_range(0..100))),
        1 => SimulatedAction::SaveLegend,
        2 => SimulatedAction::AddFormula,
        3 => SimulatedAction::ApplyFormula,
        4 => SimulatedAction::UseExampleFormula,
        5 => SimulatedAction::RemoveFormula,
        6 => SimulatedAction::EditMaxRecords(pick(rng, &["25", "050", "3", "0", "many", ""]).into()),
        7 => SimulatedAction::SaveMaxRecords,
        8 => SimulatedAction::ClearMaxRecords,
        9 => SimulatedAction::StartGoal,
        10 => SimulatedAction::EditGoal(pick(rng, &["1000", "250.5", "-3", "1k", ""]).into()),
        11 => SimulatedAction::SaveGoal,
        12 => SimulatedAction::RemoveGoal,
        13 => SimulatedAction::ToggleSort(pick(rng, &[SortOrder::Asc, SortOrder::Desc])),
        14 => SimulatedAction::ClearSort,
        15 => SimulatedAction::SetDatasetColor(random_color(rng)),
        16 => SimulatedAction::ToggleFill,
        17 => {
            let index = rng
                .random_bool(0.7)
                .then(|| rng.random_range(0..config.categories + 2));
            SimulatedAction::SetFillColor {
                color: random_color(rng),
                index,
            }
        }
        _ => SimulatedAction::ToggleMultiFill,
    }
}

fn generate_remote(rng: &mut StdRng) -> SimulatedAction {
    if rng.random_bool(0.7) {
        SimulatedAction::RemoteClear(pick(rng, &DraftField::ALL))
    } else {
        SimulatedAction::RemoteReorder
    }
}

async fn execute(
    session: &mut EditorSession,
    action: &SimulatedAction,
) -> Result<ActionResult, SessionError> {
    use ActionResult::{Committed, Local, Skipped};

    Ok(match action {
        SimulatedAction::EditLegend(text) => {
            session.edit(DraftField::Legend, text.as_str());
            Local
        }
        SimulatedAction::SaveLegend => Committed(session.save_legend().await?),
        SimulatedAction::AddFormula => {
            session.add_formula();
            Local
        }
        SimulatedAction::ApplyFormula => Committed(session.apply_formula().await?),
        SimulatedAction::UseExampleFormula => Committed(session.use_example_formula().await?),
        SimulatedAction::RemoveFormula => Committed(session.remove_formula().await?),
        SimulatedAction::EditMaxRecords(text) => {
            session.edit(DraftField::MaxRecords, text.as_str());
            Local
        }
        SimulatedAction::SaveMaxRecords => Committed(session.save_max_records().await?),
        SimulatedAction::ClearMaxRecords => Committed(session.clear_max_records().await?),
        SimulatedAction::StartGoal => {
            session.start_goal()?;
            Local
        }
        SimulatedAction::EditGoal(text) => {
            session.edit(DraftField::Goal, text.as_str());
            Local
        }
        SimulatedAction::SaveGoal => Committed(session.save_goal().await?),
        SimulatedAction::RemoveGoal => Committed(session.remove_goal().await?),
        SimulatedAction::ToggleSort(order) => Committed(session.toggle_sort(*order).await?),
        SimulatedAction::ClearSort => Committed(session.clear_sort().await?),
        SimulatedAction::SetDatasetColor(color) => {
            Committed(session.set_dataset_color(color.clone()).await?)
        }
        SimulatedAction::ToggleFill => Committed(session.toggle_fill().await?),
        SimulatedAction::SetFillColor { color, index } => {
            match session.set_fill_color(color.clone(), *index).await? {
                Some(outcome) => Committed(outcome),
                None => Skipped,
            }
        }
        SimulatedAction::ToggleMultiFill => Committed(session.toggle_multi_fill().await?),
        SimulatedAction::RemoteClear(_) | SimulatedAction::RemoteReorder => Skipped,
    })
}

fn remote_edit(
    harness: &TestHarness,
    session: &mut EditorSession,
    step: u64,
    action: &SimulatedAction,
    violations: &mut Vec<Violation>,
) {
    let chart_id = session.chart_id();
    let dataset_id = session.dataset_id();

    match action {
        SimulatedAction::RemoteClear(field) => {
            let before = session.draft(*field).to_string();
            harness.store.modify_chart(chart_id, |chart| {
                if let Some(dataset) = chart.dataset_mut(dataset_id) {
                    dataset.apply_change(&field.cleared());
                }
            });
            if let Err(err) = session.sync() {
                tracing::warn!(step, "sync after remote edit failed: {}", err);
            }
            let after = session.draft(*field);
            if after != before {
                violations.push(Violation::DraftClobbered {
                    step,
                    field: *field,
                    after: after.to_string(),
                    before,
                });
            }
        }
        SimulatedAction::RemoteReorder => {
            harness.store.modify_chart(chart_id, |chart| {
                chart.dataset_configs.rotate_right(1);
            });
            if let Err(err) = session.sync() {
                tracing::warn!(step, "sync after remote edit failed: {}", err);
            }
        }
        _ => {}
    }
}

/// Resolver output against the positional rows of a freshly computed chart
fn check_alignment(chart: &Chart) -> Option<String> {
    if let Some(drift) = alignment_drift(chart) {
        return Some(format!(
            "{} datasets but {} computed rows",
            drift.datasets, drift.rows
        ));
    }
    let computed = chart.computed_series.as_ref()?;
    for (position, dataset) in chart.dataset_configs.iter().enumerate() {
        let resolved = resolve_series_for_dataset(chart, dataset.id).map(|s| s.values);
        let expected = computed.values.get(position).map(Vec::as_slice);
        if resolved != expected {
            return Some(format!(
                "dataset {} at position {position} resolved to {resolved:?}, expected {expected:?}",
                dataset.id
            ));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_run_passes() {
        let report = run_simulator(SimulatorConfig {
            edits: 300,
            ..SimulatorConfig::default()
        })
        .await;
        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.stats.steps, 300);
    }

    #[tokio::test]
    async fn same_seed_same_report() {
        let config = SimulatorConfig {
            seed: 7,
            edits: 150,
            ..SimulatorConfig::default()
        };
        let a = run_simulator(config.clone()).await;
        let b = run_simulator(config).await;
        assert_eq!(a.stats.actions_by_type, b.stats.actions_by_type);
        assert_eq!(a.stats.commits, b.stats.commits);
        assert_eq!(a.final_canonical, b.final_canonical);
    }

    #[test]
    fn report_text_marks_failure() {
        let report = SimulatorReport {
            config: SimulatorConfig::default(),
            stats: SimulatorStats::default(),
            violations: vec![Violation::Setup {
                details: "boom".into(),
            }],
            final_canonical: None,
        };
        assert!(!report.passed());
        assert!(report.generate_text().contains("FAIL"));
    }
}
