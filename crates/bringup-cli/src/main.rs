//! bringup - first-time deployment of interdependent components
//!
//! ## Commands
//!
//! - `plan`: Show the order components would be deployed in, and what each needs
//! - `rehearse`: Run the deployment against an in-memory environment

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

use bringup_core::config::parse_uint;
use bringup_core::{
    write_run_report_json, write_run_summary_md, ArgDescriptor, ComponentGraph, ComponentSpec,
    DeployConfig, DeploymentOrchestrator, DeploymentRun, DeploymentStatus, Manifest,
    MemoryDeployer, OrderPolicy, RunReport,
};

#[derive(Parser)]
#[command(name = "bringup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ordered first-time deployment of interdependent components", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the deployment plan without deploying anything
    Plan {
        #[command(flatten)]
        input: ManifestArgs,
    },

    /// Deploy against an in-memory environment and report how far it got
    Rehearse {
        #[command(flatten)]
        input: ManifestArgs,

        /// Reject every deploy call for this component kind (repeatable)
        #[arg(long = "reject", value_name = "KIND")]
        reject: Vec<String>,

        /// Fail the n-th deploy call (1-based)
        #[arg(long, value_name = "N")]
        fail_on_call: Option<u64>,

        /// Simulated duration of each deploy call
        #[arg(long, default_value = "0")]
        latency_ms: u64,

        /// Write the JSON run report here ("-" for stdout)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Write a markdown summary here
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct ManifestArgs {
    /// Deployment manifest (TOML); the standard stack is used when omitted
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// How declaration order is treated: validate, trust or sort
    #[arg(long)]
    order: Option<OrderPolicy>,

    /// Initial ledger supply in base units
    #[arg(long, env = "BRINGUP_INITIAL_LEDGER_SUPPLY", value_parser = parse_supply)]
    initial_supply: Option<u128>,

    /// Stop issuing deploy calls after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn parse_supply(value: &str) -> Result<u128, String> {
    parse_uint(value).ok_or_else(|| format!("not an unsigned integer: {:?}", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    bringup_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Plan { input } => cmd_plan(&input),
        Commands::Rehearse {
            input,
            reject,
            fail_on_call,
            latency_ms,
            report,
            summary,
        } => {
            let mut env = MemoryDeployer::new().with_latency(Duration::from_millis(latency_ms));
            for kind in reject {
                env = env.rejecting(kind);
            }
            if let Some(n) = fail_on_call {
                env = env.failing_on_call(n);
            }
            cmd_rehearse(&input, env, report.as_deref(), summary.as_deref()).await
        }
    }
}

/// Resolve config and component specs: defaults, then manifest, then flags.
fn load_inputs(args: &ManifestArgs) -> Result<(DeployConfig, Vec<ComponentSpec>)> {
    let manifest = match &args.manifest {
        Some(path) => Manifest::load(path)
            .with_context(|| format!("Failed to load manifest {:?}", path))?,
        None => Manifest::default(),
    };

    let mut config = manifest.config().context("Invalid manifest parameters")?;
    if let Some(supply) = args.initial_supply {
        config.initial_ledger_supply = supply;
    }
    if let Some(order) = args.order {
        config.order = order;
    }
    if args.timeout_secs.is_some() {
        config.timeout_secs = args.timeout_secs;
    }

    let specs = manifest
        .component_specs(&config)
        .context("Invalid manifest components")?;
    Ok((config, specs))
}

fn describe_args(spec: &ComponentSpec) -> String {
    let args: Vec<String> = spec
        .constructor_args
        .iter()
        .map(|arg| match arg {
            ArgDescriptor::Literal(value) => value.to_string(),
            ArgDescriptor::Ref(name) => format!("<{}>", name),
        })
        .collect();
    args.join(", ")
}

fn cmd_plan(args: &ManifestArgs) -> Result<()> {
    let (config, specs) = load_inputs(args)?;

    let ordered =
        DeploymentOrchestrator::order_for(config.order, &specs).context("Plan rejected")?;
    // Under `trust` the graph may not build; dependents are then omitted.
    let graph = ComponentGraph::from_specs(&specs).ok();

    println!("Deployment plan ({} order):", config.order);
    for (position, spec) in ordered.iter().enumerate() {
        println!(
            "  {}. {} [{}]({})",
            position + 1,
            spec.name,
            spec.kind,
            describe_args(spec)
        );
        let deps = spec.dependencies();
        if !deps.is_empty() {
            println!("       needs: {}", deps.join(", "));
        }
        if let Some(users) = graph.as_ref().and_then(|g| g.dependents_of(&spec.name)) {
            if !users.is_empty() {
                println!("       used by: {}", users.join(", "));
            }
        }
    }
    if let Some(secs) = config.timeout_secs {
        println!("Timeout: {}s", secs);
    }
    Ok(())
}

async fn cmd_rehearse(
    args: &ManifestArgs,
    env: MemoryDeployer,
    report_path: Option<&Path>,
    summary_path: Option<&Path>,
) -> Result<()> {
    let (config, specs) = load_inputs(args)?;

    let orchestrator = DeploymentOrchestrator::new(Arc::new(env)).with_policy(config.order);
    let run = match config.timeout_secs {
        Some(secs) => {
            orchestrator
                .run_with_timeout(&specs, Duration::from_secs(secs))
                .await
        }
        None => orchestrator.run(&specs).await,
    };

    print_run(&run);

    let report = RunReport::from_run(&run, &specs);
    if let Some(path) = report_path {
        if path == Path::new("-") {
            let json = serde_json::to_string_pretty(&report).context("serialize run report")?;
            println!("{}", json);
        } else {
            write_run_report_json(path, &report)?;
            info!("Report written to {:?}", path);
        }
    }
    if let Some(path) = summary_path {
        write_run_summary_md(path, &report)?;
        info!("Summary written to {:?}", path);
    }

    if let Some(err) = run.failure() {
        bail!("Deployment aborted: {}", err);
    }
    Ok(())
}

fn print_run(run: &DeploymentRun) {
    println!("Run {}", run.run_id());
    for record in run.records() {
        let status = match record.status() {
            DeploymentStatus::Deployed => "deployed",
            DeploymentStatus::Failed => "FAILED",
            DeploymentStatus::Pending => "pending",
        };
        match record.identity_handle() {
            Some(handle) => println!("  {:<12} {:<9} {}", record.name(), status, handle),
            None => println!("  {:<12} {}", record.name(), status),
        }
    }
    println!(
        "{} of {} attempted components deployed",
        run.deployed().count(),
        run.records().len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bringup_core::{ArgValue, DEFAULT_INITIAL_LEDGER_SUPPLY};

    #[test]
    fn test_parse_rehearse_flags() {
        let cli = Cli::try_parse_from([
            "bringup",
            "--verbose",
            "rehearse",
            "--order",
            "sort",
            "--reject",
            "DreamToken",
            "--reject",
            "TaxPool",
            "--fail-on-call",
            "2",
            "--initial-supply",
            "1_000",
        ])
        .expect("parse");
        assert!(cli.verbose);
        match cli.command {
            Commands::Rehearse {
                input,
                reject,
                fail_on_call,
                ..
            } => {
                assert_eq!(input.order, Some(OrderPolicy::Sort));
                assert_eq!(input.initial_supply, Some(1000));
                assert_eq!(reject, vec!["DreamToken", "TaxPool"]);
                assert_eq!(fail_on_call, Some(2));
            }
            Commands::Plan { .. } => panic!("expected rehearse"),
        }
    }

    #[test]
    fn test_bad_supply_is_rejected() {
        assert!(Cli::try_parse_from(["bringup", "plan", "--initial-supply", "1e21"]).is_err());
    }

    #[test]
    fn test_flags_override_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bringup.toml");
        std::fs::write(
            &path,
            "[parameters]\ninitial_ledger_supply = 7\n\n[deploy]\norder = \"trust\"\ntimeout_secs = 30\n",
        )
        .expect("write manifest");

        let (config, specs) = load_inputs(&ManifestArgs {
            manifest: Some(path.clone()),
            ..ManifestArgs::default()
        })
        .expect("load");
        assert_eq!(config.initial_ledger_supply, 7);
        assert_eq!(config.order, OrderPolicy::Trust);
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(
            specs[1].constructor_args[0],
            ArgDescriptor::Literal(ArgValue::Uint(7))
        );

        let (config, specs) = load_inputs(&ManifestArgs {
            manifest: Some(path),
            order: Some(OrderPolicy::Validate),
            initial_supply: Some(DEFAULT_INITIAL_LEDGER_SUPPLY),
            timeout_secs: None,
        })
        .expect("load");
        assert_eq!(config.order, OrderPolicy::Validate);
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(
            specs[1].constructor_args[0],
            ArgDescriptor::Literal(ArgValue::Uint(DEFAULT_INITIAL_LEDGER_SUPPLY))
        );
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_inputs(&ManifestArgs {
            manifest: Some(dir.path().join("absent.toml")),
            ..ManifestArgs::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_describe_args_marks_references() {
        let spec = ComponentSpec::new("TaxPool", "TaxPool")
            .with_literal(ArgValue::Bool(true))
            .with_ref("Token");
        assert_eq!(describe_args(&spec), "true, <Token>");
    }

    #[tokio::test]
    async fn test_rehearse_rejection_returns_error() {
        let result = cmd_rehearse(
            &ManifestArgs::default(),
            MemoryDeployer::new().rejecting("DreamToken"),
            None,
            None,
        )
        .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Token"));
    }

    #[tokio::test]
    async fn test_rehearse_writes_report_and_summary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = dir.path().join("run.json");
        let summary = dir.path().join("run.md");
        cmd_rehearse(
            &ManifestArgs::default(),
            MemoryDeployer::new(),
            Some(&report),
            Some(&summary),
        )
        .await
        .expect("rehearse");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report).expect("read report"))
                .expect("parse report");
        assert_eq!(json["status"], "succeeded");
        assert_eq!(json["components"].as_array().map(Vec::len), Some(3));
        assert!(std::fs::read_to_string(&summary)
            .expect("read summary")
            .contains("deployed: 3/3"));
    }
}
