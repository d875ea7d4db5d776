use cdc_core::test_harness::{run_simulator, SimulatorConfig};
use cdc_core::{EditorConfig, RecomputePolicy};
use cdc_model::ChartType;

#[tokio::test]
async fn several_seeds_pass() {
    for seed in 0..5 {
        let report = run_simulator(SimulatorConfig {
            seed,
            edits: 200,
            ..SimulatorConfig::default()
        })
        .await;
        assert!(report.passed(), "seed {seed}:\n{}", report.generate_text());
        assert!(report.stats.commits > 0);
    }
}

#[tokio::test]
async fn every_persist_failing_never_recomputes() {
    let report = run_simulator(SimulatorConfig {
        edits: 200,
        persist_failure_rate: 1.0,
        ..SimulatorConfig::default()
    })
    .await;

    assert!(report.passed(), "{}", report.generate_text());
    assert_eq!(report.stats.commits, 0);
    assert_eq!(report.stats.recomputes, 0);
    assert!(report.stats.persist_failures > 0);
}

#[tokio::test]
async fn restricted_chart_types_pass() {
    for chart_type in [ChartType::Line, ChartType::Table, ChartType::Pie] {
        let report = run_simulator(SimulatorConfig {
            edits: 200,
            chart_type,
            ..SimulatorConfig::default()
        })
        .await;
        assert!(report.passed(), "{chart_type:?}:\n{}", report.generate_text());
    }
}

#[tokio::test]
async fn values_affected_policy_passes() {
    let report = run_simulator(SimulatorConfig {
        edits: 300,
        remote_edit_rate: 0.2,
        editor: EditorConfig::new().with_policy(RecomputePolicy::ValuesAffected),
        ..SimulatorConfig::default()
    })
    .await;
    assert!(report.passed(), "{}", report.generate_text());
    assert!(report.stats.commits > report.stats.recomputes);
}

#[tokio::test]
async fn report_serializes_to_json() {
    let report = run_simulator(SimulatorConfig {
        edits: 50,
        ..SimulatorConfig::default()
    })
    .await;

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["stats"]["steps"], 50);
    assert!(json["violations"].as_array().unwrap().is_empty());
    assert_eq!(json["config"]["chart_type"], "bar");
}
