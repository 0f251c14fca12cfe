//! CLI tool to plan a batch of deliveries.
//!
//! Fleet data comes from a local JSON document or from the upstream drone
//! data service; the plan is printed to stdout as JSON.

use anyhow::Result;
use clap::Parser;
use dispatch_cli::{load_dispatches, load_fleet};
use dispatch_core::{
    plan_to_geojson, DeliveryPlanner, FleetSource, PlannerConfig, RestrictedAreaIndex,
    RestrictedAreaSource,
};
use dispatch_upstream::{IlpClient, DEFAULT_ENDPOINT};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Plan delivery routes for a batch of dispatches
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON array of dispatch requests
    #[arg(long)]
    dispatches: PathBuf,

    /// Fleet document to plan against instead of the upstream service
    #[arg(long)]
    fleet: Option<PathBuf>,

    /// Upstream drone data service URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    ilp_url: String,

    /// Print the plan as a GeoJSON FeatureCollection
    #[arg(long)]
    geojson: bool,

    /// Greedy search iteration cap
    #[arg(long)]
    max_iterations: Option<u32>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dispatch_core=info".parse()?),
        )
        .init();

    let requests = load_dispatches(&args.dispatches)?;

    let (fleet, areas): (Arc<dyn FleetSource>, Arc<dyn RestrictedAreaSource>) = match &args.fleet {
        Some(path) => {
            let fleet = Arc::new(load_fleet(path)?);
            let areas: Arc<dyn RestrictedAreaSource> = fleet.clone();
            (fleet as Arc<dyn FleetSource>, areas)
        }
        None => {
            let client = Arc::new(IlpClient::new(&args.ilp_url)?);
            let areas: Arc<dyn RestrictedAreaSource> = client.clone();
            (client as Arc<dyn FleetSource>, areas)
        }
    };

    let mut config = PlannerConfig::default();
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }

    let index = RestrictedAreaIndex::new(areas);
    let result = DeliveryPlanner::new(fleet.as_ref(), &index)
        .with_config(config)
        .plan(&requests)?;

    let output = if args.geojson {
        plan_to_geojson(&result)
    } else {
        serde_json::to_value(&result)?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !result.is_fully_planned() {
        eprintln!("{} dispatches could not be planned", result.unplanned.len());
    }
    Ok(())
}
