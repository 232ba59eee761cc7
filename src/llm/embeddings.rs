use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Embedder backed by the configured HTTP provider.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpEmbedder {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        embed_single(&self.client, &self.config, text).await
    }
}

/// Generate the embedding for a single text.
pub async fn embed_single(
    client: &reqwest::Client,
    config: &LlmConfig,
    text: &str,
) -> Result<Vec<f32>> {
    let req = EmbedRequest {
        model: (config.provider == "openai").then(|| config.embedding_model.clone()),
        input: vec![text.to_string()],
        dimensions: config.embedding_dim,
    };

    let request = match config.provider.as_str() {
        "azure" => client
            .post(embeddings_url(config))
            .header("api-key", config.api_key.as_deref().unwrap_or_default()),
        "openai" => client.post(embeddings_url(config)).header(
            "Authorization",
            format!("Bearer {}", config.api_key.as_deref().unwrap_or_default()),
        ),
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    };

    let resp = request
        .json(&req)
        .send()
        .await
        .context("Failed to call embedding API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Embedding API returned {status}: {body}");
    }

    let body: EmbedResponse = resp
        .json()
        .await
        .context("Failed to parse embedding response")?;

    let embedding = body
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .context("No embedding returned")?;

    check_dimension(&embedding, config.embedding_dim)?;
    Ok(embedding)
}

fn embeddings_url(config: &LlmConfig) -> String {
    let base = config.endpoint.trim_end_matches('/');
    match config.provider.as_str() {
        "openai" => format!("{base}/v1/embeddings"),
        _ => format!(
            "{base}/openai/deployments/{}/embeddings?api-version={}",
            config.embedding_model, config.api_version
        ),
    }
}

fn check_dimension(embedding: &[f32], expected: Option<usize>) -> Result<()> {
    match expected {
        Some(dim) if embedding.len() != dim => anyhow::bail!(
            "Embedding has {} dimensions, expected {dim}",
            embedding.len()
        ),
        _ => Ok(()),
    }
}

#[derive(Serialize)]
struct EmbedRequest {
    /// Azure routes by deployment name in the URL; only OpenAI wants it here.
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}
