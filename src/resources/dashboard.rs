//! Aggregate dashboard metrics.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::{decode, ApiClient, Params};

pub const ENDPOINT: &str = "/api/dashboard/metrics";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    #[serde(default)]
    pub agents: u64,
    #[serde(default)]
    pub tools: u64,
    #[serde(default)]
    pub projects: u64,
    #[serde(default)]
    pub collections: u64,
    #[serde(default)]
    pub scheduler_jobs: u64,
    #[serde(default)]
    pub active_runs: u64,
}

pub async fn metrics(api: &ApiClient) -> Result<DashboardMetrics> {
    decode(api.get(ENDPOINT, Params::new()).await, "dashboard metrics")
}
