use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use substitution_engine::{
    dataset::load_dataset_path,
    orchestrator::SubstitutionOrchestrator,
    query::{BandingRequest, ProductAttributes, SubstitutionQuery},
    settings::{load_settings_env, load_settings_path},
    snapshot::SnapshotStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(version, about = "Panel stock substitution CLI")]
struct Cli {
    /// Engine settings (TOML). Defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Dataset to import (TOML).
    #[arg(long, value_name = "FILE")]
    data: PathBuf,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run one substitution query and print the result as JSON.
    Query(QueryArgs),
    /// Normalize and import the dataset, print the import report.
    Check,
}

#[derive(Args)]
struct QueryArgs {
    /// Requested product code.
    #[arg(long)]
    product: Option<String>,
    /// Sheets wanted.
    #[arg(long, default_value_t = 1)]
    quantity: u64,
    /// Requested location; defaults to the primary location.
    #[arg(long)]
    location: Option<String>,
    /// Pre-resolved identity as CODE=SCORE (repeatable).
    #[arg(long = "resolved", value_name = "CODE=SCORE", value_parser = parse_resolved)]
    resolved: Vec<(String, f64)>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    thickness_mm: Option<f64>,
    #[arg(long)]
    finish: Option<String>,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    material: Option<String>,
    /// Long edges per board to band (enables banding advice).
    #[arg(long)]
    long_edges: Option<u8>,
    /// Short edges per board to band (enables banding advice).
    #[arg(long)]
    short_edges: Option<u8>,
    #[arg(long)]
    length_mm: Option<u32>,
    #[arg(long)]
    width_mm: Option<u32>,
}

fn parse_resolved(s: &str) -> Result<(String, f64), String> {
    let (code, score) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=SCORE, got {s:?}"))?;
    let score: f64 = score
        .trim()
        .parse()
        .map_err(|e| format!("bad score in {s:?}: {e}"))?;
    Ok((code.trim().to_string(), score))
}

impl QueryArgs {
    fn into_query(self) -> SubstitutionQuery {
        let banding = (self.long_edges.is_some() || self.short_edges.is_some()).then(|| BandingRequest {
            long_edges: self.long_edges.unwrap_or(0),
            short_edges: self.short_edges.unwrap_or(0),
            length_mm: self.length_mm,
            width_mm: self.width_mm,
        });
        let mut query = SubstitutionQuery {
            product: self.product.map(Into::into),
            attributes: ProductAttributes {
                name: self.name,
                brand: self.brand,
                thickness_mm: self.thickness_mm,
                finish: self.finish,
                color: self.color,
                material_class: self.material,
            },
            quantity: self.quantity,
            location: self.location.map(Into::into),
            banding,
            ..SubstitutionQuery::default()
        };
        for (code, score) in self.resolved {
            query = query.with_resolved(code, score);
        }
        query
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => load_settings_path(path)?,
        None => load_settings_env()?,
    };

    // 1) Read + normalize dataset
    let (dataset, normalization) = load_dataset_path(&cli.data, settings.import.unknown_reference)?;

    // 2) Publish it
    let store = Arc::new(SnapshotStore::from_settings(&settings));
    let report = store
        .import_dataset(dataset)
        .with_context(|| format!("import {}", cli.data.display()))?;

    match cli.cmd {
        Cmd::Check => {
            let out = serde_json::json!({ "normalization": normalization, "import": report });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Cmd::Query(args) => {
            let orchestrator = SubstitutionOrchestrator::from_settings(&settings, store)
                .context("initialize fallback search provider")?;
            let result = orchestrator.submit(args.into_query()).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
