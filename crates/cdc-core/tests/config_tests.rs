mod common;

use cdc_core::{ConfigError, DraftField, EditorConfig, RecomputePolicy};
use cdc_model::{ChartType, Color, SortOrder};
use common::{harness, open};
use std::io::Write;

fn config_file(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn loads_from_file() {
    let file = config_file(
        r##"
[recompute]
policy = "values-affected"

[colors]
neutral = "#eeeeee"
palette = ["#111", "#222"]

[drafts]
default_goal = 500
"##,
    );

    let config = EditorConfig::load(file.path()).unwrap();
    assert_eq!(config.recompute.policy, RecomputePolicy::ValuesAffected);
    assert_eq!(config.colors.neutral, Color::new("#eeeeee"));
    assert_eq!(config.palette().len(), 2);
    assert!((config.drafts.default_goal - 500.0).abs() < f64::EPSILON);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EditorConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn bad_policy_is_parse_error() {
    let file = config_file("[recompute]\npolicy = \"sometimes\"\n");
    assert!(matches!(
        EditorConfig::load(file.path()).unwrap_err(),
        ConfigError::Parse(_)
    ));
}

#[test]
fn non_finite_goal_is_invalid() {
    let err = EditorConfig::from_toml_str("[drafts]\ndefault_goal = nan\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[tokio::test]
async fn values_affected_policy_skips_presentation_recompute() {
    let harness = harness(ChartType::Bar, 4);
    let config = EditorConfig::new().with_policy(RecomputePolicy::ValuesAffected);
    let mut session = open(&harness, 3, config).await;
    let runs = harness.engine.run_count();

    let outcome = session.toggle_sort(SortOrder::Asc).await.unwrap();
    assert!(!outcome.recomputed);
    assert_eq!(harness.engine.run_count(), runs);

    session.edit(DraftField::MaxRecords, "2");
    let outcome = session.save_max_records().await.unwrap();
    assert!(outcome.recomputed);
    assert_eq!(harness.engine.run_count(), runs + 1);
}

#[tokio::test]
async fn configured_default_goal_seeds_draft() {
    let harness = harness(ChartType::Gauge, 4);
    let config = EditorConfig::from_toml_str("[drafts]\ndefault_goal = 250.5\n").unwrap();
    let mut session = open(&harness, 3, config).await;

    session.start_goal().unwrap();
    assert_eq!(session.draft(DraftField::Goal), "250.5");
}

#[tokio::test]
async fn untracked_fields_are_not_reconciled() {
    let harness = harness(ChartType::Bar, 4);
    let mut writer = open(&harness, 3, EditorConfig::default()).await;
    writer.use_example_formula().await.unwrap();

    let reader = harness
        .open(
            common::chart_id(),
            cdc_model::DatasetConfigId(3),
            EditorConfig::new().with_tracked([DraftField::Legend]),
        )
        .unwrap();
    assert_eq!(reader.draft(DraftField::Legend), "Dataset 3");
    assert_eq!(reader.draft(DraftField::Formula), "");
    assert_eq!(reader.pending_fields().unwrap(), vec![DraftField::Formula]);
}

#[test]
fn print_round_trip() {
    let config = EditorConfig::new()
        .with_policy(RecomputePolicy::ValuesAffected)
        .with_palette(cdc_test_utils::two_tone_palette());
    let text = config.to_toml_string().unwrap();
    assert_eq!(EditorConfig::from_toml_str(&text).unwrap(), config);
}
