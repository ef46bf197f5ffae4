// Copyright (c) 2025 - Cowboy AI, Inc.
//! Transit Gateway Planner
//!
//! Plans a hub-and-spoke deployment from a JSON configuration and prints the
//! result as JSON on stdout.
//!
//! Run with: cargo run --bin tgw-planner -- <plan|apply|destroy> [config.json]
//!
//! - `plan` prints the named outputs and the change set
//! - `apply` realizes the change set with the simulated executor, persists
//!   the realized state and prints the named outputs
//! - `destroy` tears down the persisted deployment and cleans local state
//!
//! Environment:
//! - `TGW_PLANNER_CONFIG` - configuration path when none is given
//! - `TGW_PLANNER_STATE_DIR` - local state directory (default `.tgw-planner`)
//! - `RUST_LOG` - log filter (logs go to stderr)

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tgw_topology::{
    apply::{SimulatedExecutor, StateStore},
    config::DeploymentConfig,
    service::{DeploymentService, PlanningService},
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Plan,
    Apply,
    Destroy,
}

/// Configuration for the planner CLI
#[derive(Debug, Clone)]
struct PlannerConfig {
    command: Command,
    /// Deployment configuration; not needed by `destroy`
    config_path: Option<PathBuf>,
    state_dir: PathBuf,
}

impl PlannerConfig {
    /// Load configuration from arguments and environment variables
    fn from_env() -> Result<Self> {
        let mut args = std::env::args().skip(1);

        let command = match args.next().as_deref() {
            None | Some("plan") => Command::Plan,
            Some("apply") => Command::Apply,
            Some("destroy") => Command::Destroy,
            Some(other) => bail!("unknown command '{}', expected plan, apply or destroy", other),
        };

        let config_path = args
            .next()
            .or_else(|| std::env::var("TGW_PLANNER_CONFIG").ok())
            .map(PathBuf::from);

        let state_dir = std::env::var("TGW_PLANNER_STATE_DIR")
            .unwrap_or_else(|_| ".tgw-planner".to_string())
            .into();

        Ok(Self {
            command,
            config_path,
            state_dir,
        })
    }

    fn deployment(&self) -> Result<DeploymentConfig> {
        let path = self
            .config_path
            .as_ref()
            .context("No configuration given. Pass a path or set TGW_PLANNER_CONFIG")?;
        DeploymentConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = PlannerConfig::from_env()?;
    info!("🚀 Starting Transit Gateway Planner");
    info!("📋 Configuration loaded:");
    info!("  - Command: {:?}", config.command);
    if let Some(path) = &config.config_path {
        info!("  - Config: {}", path.display());
    }
    info!("  - State dir: {}", config.state_dir.display());

    let mut service = PlanningService::new(
        SimulatedExecutor::new(),
        StateStore::new(config.state_dir.clone()),
    );

    match config.command {
        Command::Plan => {
            let deployment = config.deployment()?;
            let planned = service.plan(&deployment).await.context("Planning failed")?;
            info!(
                "✅ Planned {} changes, {} route tables",
                planned.emission.changes.len(),
                planned.plan.route_tables.len()
            );
            println!("{}", serde_json::to_string_pretty(&planned.emission)?);
        }
        Command::Apply => {
            let deployment = config.deployment()?;
            let state = service.apply(&deployment).await.context("Apply failed")?;
            info!("✅ Applied {} resources", state.resources.len());
            println!("{}", serde_json::to_string_pretty(&state.outputs)?);
        }
        Command::Destroy => {
            if service.destroy().await.context("Destroy failed")? {
                info!("🧹 Deployment destroyed and local state cleaned");
            } else {
                info!("🧹 Nothing to destroy; local state cleaned");
            }
        }
    }

    Ok(())
}
