//! Knowledge collection endpoints.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};

use crate::api::{decode, ApiClient, ApiResponse, Params};

pub const ENDPOINT: &str = "/api/knowledge/collections";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeCollection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub document_count: u64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CollectionList {
    collections: Vec<KnowledgeCollection>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub async fn list(api: &ApiClient) -> Result<Vec<KnowledgeCollection>> {
    let list: CollectionList = decode(api.get(ENDPOINT, Params::new()).await, "collection list")?;
    Ok(list.collections)
}

pub async fn get(api: &ApiClient, id: &str) -> Result<KnowledgeCollection> {
    decode(
        api.get(&format!("{ENDPOINT}/{id}"), Params::new()).await,
        "collection",
    )
}

pub async fn create(api: &ApiClient, draft: &CollectionDraft) -> Result<KnowledgeCollection> {
    let body = serde_json::to_value(draft)?;
    let created = decode(
        api.send(Method::POST, ENDPOINT, Some(body)).await,
        "collection",
    )?;
    api.invalidate(ENDPOINT);
    Ok(created)
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
        ApiResponse::Failure { error } => Err(anyhow!("collection delete failed: {error}")),
    }
}
