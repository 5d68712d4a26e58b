use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use arns_observer::assessment::{HostAssessor, NameAssessor};
use arns_observer::config::ObserverConfig;
use arns_observer::interfaces::{
    StaticArnsNamesSource, StaticEpochHeightSource, StaticGatewayHostsSource,
};
use arns_observer::ownership::GatewayInfoProbe;
use arns_observer::report::{ReportBuilder, ReportSources};
use arns_observer::resolver::RemoteGatewayResolver;

#[derive(Parser)]
#[command(author, version, about = "ArNS gateway fleet observer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an audit report using the provided configuration file
    Run {
        #[arg(short, long, default_value = "config/observer.toml")]
        config: PathBuf,
    },
    /// Generate a default observer configuration file
    GenerateConfig {
        #[arg(short, long, default_value = "config/observer.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run(config).await?,
        Commands::GenerateConfig { path } => generate_config(path)?,
    }

    Ok(())
}

async fn run(config_path: PathBuf) -> Result<()> {
    let config = ObserverConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let resolver = Arc::new(RemoteGatewayResolver::new().context("failed to build resolver")?);
    let ownership = Arc::new(GatewayInfoProbe::new().context("failed to build ownership probe")?);
    let name_assessor = NameAssessor::new(resolver, config.reference_gateway_host.clone());
    let host_assessor = HostAssessor::new(
        name_assessor,
        ownership,
        config.name_assessment_concurrency,
    );
    let sources = ReportSources {
        epoch_heights: Arc::new(StaticEpochHeightSource::new(
            config.epoch_start_height,
            config.epoch_end_height,
        )),
        prescribed_names: Arc::new(StaticArnsNamesSource::new(config.prescribed_names.clone())),
        chosen_names: Arc::new(StaticArnsNamesSource::new(config.chosen_names.clone())),
        gateway_hosts: Arc::new(StaticGatewayHostsSource::new(config.gateway_hosts.clone())),
    };
    let builder = ReportBuilder::new(
        config.observer_address.clone(),
        sources,
        host_assessor,
        config.gateway_assessment_concurrency,
    );

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, aborting report generation");
            signal_token.cancel();
        }
    });

    let report = builder.generate_report(&cancel).await?;

    fs::create_dir_all(&config.report_dir).with_context(|| {
        format!(
            "failed to create report directory {}",
            config.report_dir.display()
        )
    })?;
    let report_path = config
        .report_dir
        .join(format!("report-{}.json", report.epoch_start_height));
    let encoded = serde_json::to_string_pretty(&report).context("failed to encode report")?;
    fs::write(&report_path, encoded)
        .with_context(|| format!("failed to write report to {}", report_path.display()))?;

    info!(
        gateways = report.gateway_assessments.len(),
        path = %report_path.display(),
        "report generated"
    );
    Ok(())
}

fn generate_config(path: PathBuf) -> Result<()> {
    let config = ObserverConfig::default();
    config
        .save(&path)
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}
