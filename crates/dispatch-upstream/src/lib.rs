//! Dispatch upstream - drone data service client
//!
//! Fetches drones, service points, restricted areas and availability windows
//! from the upstream REST service that owns the fleet data.

pub mod client;

pub use client::{normalize_base_url, IlpClient, DEFAULT_ENDPOINT};
