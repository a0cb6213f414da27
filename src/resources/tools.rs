//! Tool definition endpoints.

use anyhow::{anyhow, Result};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{decode, ApiClient, ApiResponse, Params};

pub const ENDPOINT: &str = "/api/tools";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPage {
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

pub async fn list(
    api: &ApiClient,
    page: u32,
    page_size: u32,
    category: Option<&str>,
) -> Result<ToolPage> {
    let mut endpoint = format!("{ENDPOINT}?page={page}&pageSize={page_size}");
    let mut params = Params::from([
        ("page".to_owned(), json!(page)),
        ("pageSize".to_owned(), json!(page_size)),
    ]);
    if let Some(category) = category {
        endpoint.push_str(&format!("&category={}", urlencoding::encode(category)));
        params.insert("category".to_owned(), json!(category));
    }
    decode(api.get(&endpoint, params).await, "tool list")
}

pub async fn get(api: &ApiClient, id: &str) -> Result<Tool> {
    decode(
        api.get(&format!("{ENDPOINT}/{id}"), Params::new()).await,
        "tool",
    )
}

pub async fn create(api: &ApiClient, draft: &ToolDraft) -> Result<Tool> {
    let body = serde_json::to_value(draft)?;
    let created = decode(api.send(Method::POST, ENDPOINT, Some(body)).await, "tool")?;
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
        ApiResponse::Failure { error } => Err(anyhow!("tool delete failed: {error}")),
    }
}
