//! Upstream REST client.

use anyhow::{Context, Result};
use dispatch_core::{
    Drone, DroneAvailability, FleetSource, RestrictedArea, RestrictedAreaSource, ServicePoint,
    TimeWindow,
};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8081/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Make sure the base URL ends with exactly one `/` so paths can be appended.
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return DEFAULT_ENDPOINT.to_string();
    }
    format!("{}/", trimmed.trim_end_matches('/'))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServicePointDrones {
    service_point_id: Option<u32>,
    #[serde(default)]
    drones: Vec<DroneWithAvailability>,
}

#[derive(Debug, Deserialize)]
struct DroneWithAvailability {
    id: String,
    #[serde(default)]
    availability: Vec<TimeWindow>,
}

/// Blocking client for the drone data service.
///
/// Every fetch degrades to an empty collection on failure; the error is
/// logged and planning carries on with whatever data it has.
pub struct IlpClient {
    client: Client,
    base_url: String,
}

impl IlpClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn try_fetch<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("Failed to reach {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {} returned {}", url, status);
        }

        // A null body is treated as an empty list.
        let items = response
            .json::<Option<Vec<T>>>()
            .with_context(|| format!("Failed to parse response from {}", url))?;
        Ok(items.unwrap_or_default())
    }

    fn fetch<T: DeserializeOwned>(&self, path: &str) -> Vec<T> {
        match self.try_fetch(path) {
            Ok(items) => {
                tracing::debug!("Fetched {} items from /{}", items.len(), path);
                items
            }
            Err(err) => {
                tracing::warn!("Upstream fetch of /{} failed: {:#}", path, err);
                Vec::new()
            }
        }
    }
}

fn flatten_availability(records: Vec<ServicePointDrones>) -> Vec<DroneAvailability> {
    records
        .into_iter()
        .flat_map(|record| {
            let service_point_id = record.service_point_id;
            record.drones.into_iter().map(move |drone| DroneAvailability {
                drone_id: drone.id,
                service_point_id,
                windows: drone.availability,
            })
        })
        .collect()
}

impl FleetSource for IlpClient {
    fn fetch_drones(&self) -> Vec<Drone> {
        self.fetch("drones")
    }

    fn fetch_service_points(&self) -> Vec<ServicePoint> {
        self.fetch("service-points")
    }

    fn fetch_drone_availability(&self) -> Vec<DroneAvailability> {
        flatten_availability(self.fetch("drones-for-service-points"))
    }
}

impl RestrictedAreaSource for IlpClient {
    fn fetch_restricted_areas(&self) -> Vec<RestrictedArea> {
        self.fetch("restricted-areas")
    }
}
