//! Workflow endpoints: list deployed workflows, start runs, inspect runs.
//!
//! The console does not interpret workflow definitions; it starts runs and
//! renders whatever state the backend reports.

use anyhow::Result;
use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{decode, ApiClient, Params};

pub const ENDPOINT: &str = "/api/workflows";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub deployed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct WorkflowList {
    workflows: Vec<Workflow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub id: String,
    #[serde(default)]
    pub workflow_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPage {
    pub runs: Vec<WorkflowRun>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
}

pub async fn list(api: &ApiClient) -> Result<Vec<Workflow>> {
    let list: WorkflowList = decode(api.get(ENDPOINT, Params::new()).await, "workflow list")?;
    Ok(list.workflows)
}

pub async fn get(api: &ApiClient, id: &str) -> Result<Workflow> {
    decode(
        api.get(&format!("{ENDPOINT}/{id}"), Params::new()).await,
        "workflow",
    )
}

/// Start a new run, optionally seeding input variables.
pub async fn start(api: &ApiClient, id: &str, input: Option<Value>) -> Result<WorkflowRun> {
    let body = match input {
        Some(input) => json!({ "input": input }),
        None => json!({}),
    };
    let run = decode(
        api.send(Method::POST, &format!("{ENDPOINT}/{id}/start"), Some(body))
            .await,
        "workflow run",
    )?;
    // Only this workflow's run listings go stale.
    api.invalidate(&format!("{ENDPOINT}/{id}/runs"));
    Ok(run)
}

pub async fn runs(api: &ApiClient, id: &str, page: u32) -> Result<RunPage> {
    let endpoint = format!("{ENDPOINT}/{id}/runs?page={page}");
    let params = Params::from([("page".to_owned(), json!(page))]);
    decode(api.get(&endpoint, params).await, "run list")
}
