//! Scheduler job endpoints.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};

use crate::api::{decode, ApiClient, ApiResponse, Params};

pub const ENDPOINT: &str = "/api/scheduler/jobs";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerJob {
    pub id: String,
    pub name: String,
    /// Cron expression controlling when the job fires.
    pub cron: String,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_run_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct JobList {
    jobs: Vec<SchedulerJob>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub name: String,
    pub cron: String,
    pub workflow_id: String,
}

pub async fn list(api: &ApiClient) -> Result<Vec<SchedulerJob>> {
    let list: JobList = decode(api.get(ENDPOINT, Params::new()).await, "job list")?;
    Ok(list.jobs)
}

pub async fn get(api: &ApiClient, id: &str) -> Result<SchedulerJob> {
    decode(
        api.get(&format!("{ENDPOINT}/{id}"), Params::new()).await,
        "job",
    )
}

pub async fn create(api: &ApiClient, draft: &JobDraft) -> Result<SchedulerJob> {
    let body = serde_json::to_value(draft)?;
    let created = decode(api.send(Method::POST, ENDPOINT, Some(body)).await, "job")?;
    api.invalidate(ENDPOINT);
    Ok(created)
}

/// Pause or resume a job.
pub async fn set_enabled(api: &ApiClient, id: &str, enabled: bool) -> Result<SchedulerJob> {
    let action = if enabled { "resume" } else { "pause" };
    let updated = decode(
        api.send(Method::POST, &format!("{ENDPOINT}/{id}/{action}"), None)
            .await,
        "job",
    )?;
    api.invalidate(ENDPOINT);
    Ok(updated)
}

pub async fn delete(api: &ApiClient, id: &str) -> Result<()> {
    match api
        .send(Method::DELETE, &format!("{ENDPOINT}/{id}"), None)
        .await
    {
        ApiResponse::Success { .. } => {
            api.invalidate(ENDPOINT);
            Ok(())
        }
        ApiResponse::Failure { error } => Err(anyhow!("job delete failed: {error}")),
    }
}
