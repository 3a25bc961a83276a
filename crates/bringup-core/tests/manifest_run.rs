//! Manifest-driven runs and persisted reports.

use std::sync::Arc;

use bringup_core::{
    write_run_report_json, write_run_summary_md, ArgValue, DeploymentOrchestrator,
    DeploymentStatus, Manifest, ManifestError, MemoryDeployer, OrderPolicy, RunReport, RunStatus,
};

const SORTED_MANIFEST: &str = r#"
[parameters]
initial_ledger_supply = "2_000"

[deploy]
order = "sort"
timeout_secs = 120

[[components]]
name = "TaxPool"
kind = "TaxPool"
args = [{ ref = "Government" }, { ref = "Token" }]

[[components]]
name = "Token"
kind = "DreamToken"
args = [{ param = "initial_ledger_supply" }, { ref = "Government" }]

[[components]]
name = "Government"
kind = "DreamGovernment"
"#;

fn write_manifest(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("bringup.toml");
    std::fs::write(&path, content).expect("write manifest");
    path
}

#[tokio::test]
async fn sorted_manifest_deploys_dependencies_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = Manifest::load(&write_manifest(&dir, SORTED_MANIFEST)).expect("load");
    let config = manifest.config().expect("config");
    assert_eq!(config.order, OrderPolicy::Sort);
    assert_eq!(config.timeout_secs, Some(120));

    let specs = manifest.component_specs(&config).expect("specs");
    let env = Arc::new(MemoryDeployer::new());
    let run = DeploymentOrchestrator::new(env.clone())
        .with_policy(config.order)
        .run(&specs)
        .await;

    assert!(run.is_succeeded());
    let names: Vec<&str> = run.records().iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["Government", "Token", "TaxPool"]);
    assert_eq!(
        run.record("Token").unwrap().constructor_args()[0],
        ArgValue::Uint(2000)
    );
}

#[tokio::test]
async fn same_manifest_fails_validation_in_declared_order() {
    let manifest = Manifest::from_toml_str(SORTED_MANIFEST).expect("parse");
    let config = manifest.config().expect("config");
    let specs = manifest.component_specs(&config).expect("specs");

    let env = Arc::new(MemoryDeployer::new());
    let run = DeploymentOrchestrator::new(env.clone())
        .with_policy(OrderPolicy::Validate)
        .run(&specs)
        .await;
    assert_eq!(run.status(), RunStatus::Aborted);
    assert_eq!(env.call_count(), 0);
}

#[test]
fn missing_manifest_file_reports_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nope.toml");
    let err = Manifest::load(&path).unwrap_err();
    assert!(matches!(err, ManifestError::Read { .. }));
    assert!(err.to_string().contains("nope.toml"));
}

#[tokio::test]
async fn aborted_run_report_shows_how_far_it_got() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = Manifest::default();
    let config = manifest.config().expect("config");
    let specs = manifest.component_specs(&config).expect("specs");

    let run = DeploymentOrchestrator::new(Arc::new(MemoryDeployer::new().rejecting("DreamToken")))
        .run(&specs)
        .await;
    let report = RunReport::from_run(&run, &specs);

    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!(report.deployed_count(), 1);
    assert_eq!(report.components[1].status, DeploymentStatus::Failed);
    assert_eq!(report.not_attempted, vec!["TaxPool".to_string()]);
    let failure = report.failure.as_ref().expect("failure");
    assert_eq!(failure.component.as_deref(), Some("Token"));
    assert!(failure.message.contains("reverted"));
    // Quantities are kept exact as text.
    assert_eq!(
        report.components[1].constructor_args[0],
        "1000000000000000000000"
    );

    let json_path = dir.path().join("run.json");
    write_run_report_json(&json_path, &report).expect("write report");
    let loaded: RunReport =
        serde_json::from_str(&std::fs::read_to_string(&json_path).expect("read"))
            .expect("parse report");
    assert_eq!(loaded, report);

    let md_path = dir.path().join("run.md");
    write_run_summary_md(&md_path, &report).expect("write summary");
    let md = std::fs::read_to_string(&md_path).expect("read");
    assert!(md.contains("status: **aborted**"));
    assert!(md.contains("- TaxPool"));
}

#[test]
fn report_write_fails_for_missing_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let report_path = dir.path().join("missing").join("run.json");
    let manifest = Manifest::default();
    let specs = manifest
        .component_specs(&manifest.config().expect("config"))
        .expect("specs");
    let run = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(DeploymentOrchestrator::new(Arc::new(MemoryDeployer::new())).run(&specs));
    let report = RunReport::from_run(&run, &specs);
    assert!(write_run_report_json(&report_path, &report).is_err());
}
