//! Project endpoints.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{decode, ApiClient, ApiResponse, Params};

pub const ENDPOINT: &str = "/api/projects";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Number of agents assigned to the project.
    #[serde(default)]
    pub agent_count: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPage {
    pub projects: Vec<Project>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub async fn list(api: &ApiClient, page: u32, page_size: u32) -> Result<ProjectPage> {
    let endpoint = format!("{ENDPOINT}?page={page}&pageSize={page_size}");
    let params = Params::from([
        ("page".to_owned(), json!(page)),
        ("pageSize".to_owned(), json!(page_size)),
    ]);
    decode(api.get(&endpoint, params).await, "project list")
}

pub async fn get(api: &ApiClient, id: &str) -> Result<Project> {
    decode(
        api.get(&format!("{ENDPOINT}/{id}"), Params::new()).await,
        "project",
    )
}

pub async fn create(api: &ApiClient, draft: &ProjectDraft) -> Result<Project> {
    let body = serde_json::to_value(draft)?;
    let created = decode(api.send(Method::POST, ENDPOINT, Some(body)).await, "project")?;
    api.invalidate(ENDPOINT);
    Ok(created)
}

pub async fn update(api: &ApiClient, id: &str, draft: &ProjectDraft) -> Result<Project> {
    let body = serde_json::to_value(draft)?;
    let updated = decode(
        api.send(Method::PUT, &format!("{ENDPOINT}/{id}"), Some(body))
            .await,
        "project",
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
        ApiResponse::Failure { error } => Err(anyhow!("project delete failed: {error}")),
    }
}
