//! Agent registry endpoints.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{decode, ApiClient, ApiResponse, Params};

pub const ENDPOINT: &str = "/api/agents";

/// A configured agent as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Model identifier the agent runs on.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One page of agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPage {
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// Fields accepted when creating or updating an agent.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

pub async fn list(api: &ApiClient, page: u32, page_size: u32) -> Result<AgentPage> {
    let endpoint = format!("{ENDPOINT}?page={page}&pageSize={page_size}");
    let params = Params::from([
        ("page".to_owned(), json!(page)),
        ("pageSize".to_owned(), json!(page_size)),
    ]);
    decode(api.get(&endpoint, params).await, "agent list")
}

pub async fn get(api: &ApiClient, id: &str) -> Result<Agent> {
    decode(
        api.get(&format!("{ENDPOINT}/{id}"), Params::new()).await,
        "agent",
    )
}

pub async fn create(api: &ApiClient, draft: &AgentDraft) -> Result<Agent> {
    let body = serde_json::to_value(draft)?;
    let created = decode(api.send(Method::POST, ENDPOINT, Some(body)).await, "agent")?;
    api.invalidate(ENDPOINT);
    Ok(created)
}

pub async fn update(api: &ApiClient, id: &str, draft: &AgentDraft) -> Result<Agent> {
    let body = serde_json::to_value(draft)?;
    let updated = decode(
        api.send(Method::PUT, &format!("{ENDPOINT}/{id}"), Some(body))
            .await,
        "agent",
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
        ApiResponse::Failure { error } => Err(anyhow!("agent delete failed: {error}")),
    }
}
