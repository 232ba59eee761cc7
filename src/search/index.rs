//! Client for the hosted vector index (Azure AI Search REST API).
//!
//! Only nearest-neighbor queries are issued; indexing is done out of band.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SearchConfig;
use crate::models::SearchHit;

const TITLE_FIELD: &str = "page_title";
const DATE_FIELD: &str = "page_date";
const SECTION_FIELD: &str = "chunk_title";
const CONTENT_FIELD: &str = "chunk_content";

const MISSING_TITLE: &str = "Untitled";
const MISSING_DATE: &str = "Unknown date";
const MISSING_SECTION: &str = "Untitled section";
const MISSING_CONTENT: &str = "No content";

/// Nearest-neighbor lookup over a document index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, embedding: &[f32]) -> Result<Vec<SearchHit>>;
}

pub struct AzureSearchIndex {
    client: reqwest::Client,
    config: SearchConfig,
}

impl AzureSearchIndex {
    pub fn new(client: reqwest::Client, config: SearchConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl VectorIndex for AzureSearchIndex {
    async fn search(&self, embedding: &[f32]) -> Result<Vec<SearchHit>> {
        search_vectors(&self.client, &self.config, embedding).await
    }
}

/// Run a pure vector query and map each document to a [`SearchHit`].
pub async fn search_vectors(
    client: &reqwest::Client,
    config: &SearchConfig,
    embedding: &[f32],
) -> Result<Vec<SearchHit>> {
    let req = build_request(config, embedding);

    let resp = client
        .post(search_url(config))
        .header("api-key", config.api_key.as_deref().unwrap_or_default())
        .json(&req)
        .send()
        .await
        .context("Failed to call vector search API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Vector search API returned {status}: {body}");
    }

    let body: SearchResponse = resp
        .json()
        .await
        .context("Failed to parse vector search response")?;

    tracing::debug!("Vector search returned {} documents", body.value.len());
    Ok(body.value.iter().map(to_hit).collect())
}

fn search_url(config: &SearchConfig) -> String {
    format!(
        "{}/indexes/{}/docs/search?api-version={}",
        config.endpoint.trim_end_matches('/'),
        config.index_name,
        config.api_version
    )
}

fn build_request<'a>(config: &'a SearchConfig, embedding: &'a [f32]) -> SearchRequest<'a> {
    SearchRequest {
        vector_queries: vec![VectorQuery {
            kind: "vector",
            vector: embedding,
            k: config.k,
            fields: &config.vector_field,
        }],
        select: [TITLE_FIELD, DATE_FIELD, SECTION_FIELD, CONTENT_FIELD].join(","),
        top: config.top,
    }
}

fn to_hit(doc: &serde_json::Map<String, Value>) -> SearchHit {
    SearchHit {
        title: field_or(doc, TITLE_FIELD, MISSING_TITLE),
        date: field_or(doc, DATE_FIELD, MISSING_DATE),
        section: field_or(doc, SECTION_FIELD, MISSING_SECTION),
        content: field_or(doc, CONTENT_FIELD, MISSING_CONTENT),
    }
}

fn field_or(doc: &serde_json::Map<String, Value>, field: &str, fallback: &str) -> String {
    match doc.get(field) {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => fallback.to_string(),
        Some(other) => other.to_string(),
    }
}

// ─── Request/Response types ────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    vector_queries: Vec<VectorQuery<'a>>,
    select: String,
    top: usize,
}

#[derive(Serialize)]
struct VectorQuery<'a> {
    kind: &'static str,
    vector: &'a [f32],
    k: usize,
    fields: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    value: Vec<serde_json::Map<String, Value>>,
}
