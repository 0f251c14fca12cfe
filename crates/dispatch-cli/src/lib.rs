//! Dispatch CLI - command line tools for the delivery planner.
//!
//! - plan-batch: plan a batch of dispatches from a JSON file

use anyhow::{Context, Result};
use dispatch_core::{DispatchRequest, StaticFleet};
use std::fs;
use std::path::Path;

/// Read a JSON array of dispatch requests.
pub fn load_dispatches(path: &Path) -> Result<Vec<DispatchRequest>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dispatches from {}", path.display()))?;
    parse_dispatches(&raw).with_context(|| format!("Invalid dispatch file {}", path.display()))
}

pub fn parse_dispatches(raw: &str) -> Result<Vec<DispatchRequest>> {
    Ok(serde_json::from_str(raw)?)
}

/// Read a fleet document: drones, service points, restricted areas and availability.
pub fn load_fleet(path: &Path) -> Result<StaticFleet> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fleet from {}", path.display()))?;
    StaticFleet::from_json(&raw).with_context(|| format!("Invalid fleet file {}", path.display()))
}
