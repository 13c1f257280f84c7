// Copyright (c) 2025 - Cowboy AI, Inc.
//! Analytics platform synthesizer
//!
//! Composes the platform and prints every stack template as JSON, in
//! realization order.
//!
//! Run with: cargo run --bin cim-stacks [config.json] [synth|deploy]
//!
//! - `synth` (default): print the templates
//! - `deploy`: realize the stacks through NATS (`NATS_URL`, default localhost:4222)
//!
//! Secrets are read from `REDASH_DB_PASSWORD` and `REDASH_COOKIE_SECRET`.

use anyhow::{bail, Context, Result};
use cim_stacks::provision::NatsConfig;
use cim_stacks::{deploy, AnalyticsPlatform, DeploymentConfig, EnvSecretStore, NatsProvisioner};
use tracing::info;

enum Action {
    Synth,
    Deploy,
}

fn parse_args() -> Result<(Option<String>, Action)> {
    let mut config_path = None;
    let mut action = Action::Synth;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "synth" => action = Action::Synth,
            "deploy" => action = Action::Deploy,
            path if path.ends_with(".json") => config_path = Some(path.to_string()),
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok((config_path, action))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let (config_path, action) = parse_args()?;

    let config = match &config_path {
        Some(path) => DeploymentConfig::from_json_file(path)
            .and_then(|config| config.with_env_overrides())
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => DeploymentConfig::from_env().context("Invalid CIM_STACKS_* configuration")?,
    };

    let platform = AnalyticsPlatform::compose(&config, &EnvSecretStore::new())
        .context("Failed to compose the analytics platform")?;

    match action {
        Action::Synth => {
            let templates = platform.root.synth()?;
            info!("Synthesized {} stacks", templates.len());
            println!("{}", serde_json::to_string_pretty(&templates)?);
        }
        Action::Deploy => {
            let provisioner = NatsProvisioner::connect(NatsConfig::from_env())
                .await
                .context("Failed to connect to the provisioning service")?;
            let report = deploy(&platform.root, &provisioner).await?;
            info!(
                "Deployment {} realized {} stacks",
                report.deployment_id,
                report.realized.len()
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
