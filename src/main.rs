//! APM Exporter CLI
//!
//! Builds the metric catalog for an APM server and evaluates it once
//! against a snapshot file, printing either the declared series or the
//! Prometheus text exposition.

use apm_exporter::{
    apm_server_catalog, ApmServerStats, Collector, ExporterConfig, ExporterRegistry,
    FileSnapshotProvider, SnapshotProvider, StaticSnapshot,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "apm-exporter", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured series namespace.
    #[arg(short, long)]
    namespace: Option<String>,

    /// Overrides the configured snapshot file.
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every declared series identity.
    Describe,
    /// Evaluate the catalog once and print the text exposition.
    Collect,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("APM Exporter v{}", apm_exporter::VERSION);

    let mut config = match &cli.config {
        Some(path) => match ExporterConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => ExporterConfig::default(),
    };
    if let Some(namespace) = cli.namespace {
        config.exporter.namespace = namespace;
    }
    if let Some(snapshot) = cli.snapshot {
        config.snapshot.path = Some(snapshot);
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let catalog = match apm_server_catalog(&config.exporter.namespace) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Failed to build metric catalog: {}", e);
            std::process::exit(1);
        }
    };

    let provider: Arc<dyn SnapshotProvider<ApmServerStats>> = match &config.snapshot.path {
        Some(path) => {
            info!(path = %path.display(), "Reading snapshots from file");
            Arc::new(FileSnapshotProvider::new(path))
        }
        None => {
            info!("No snapshot source configured, all series read zero");
            Arc::new(StaticSnapshot::<ApmServerStats>::default())
        }
    };
    let collector = Collector::new(catalog, provider);

    match cli.command {
        Command::Describe => {
            for descriptor in collector.describe() {
                let keys: Vec<_> = descriptor.label_keys().collect();
                println!(
                    "{} {}{{{}}} {}",
                    descriptor.kind(),
                    descriptor.name(),
                    keys.join(","),
                    descriptor.help()
                );
            }
        }
        Command::Collect => {
            let registry = ExporterRegistry::new();
            if let Err(e) = registry.register(collector) {
                eprintln!("Failed to register collector: {}", e);
                std::process::exit(1);
            }
            match registry.encode() {
                Ok(output) => print!("{}", output),
                Err(e) => {
                    eprintln!("Failed to encode metrics: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
