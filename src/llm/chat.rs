use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::LlmConfig;
use crate::models::{ChatMessage, FunctionCall, FunctionSchema, ModelReply};

/// A chat-completion model that can answer in text or ask for a function call.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSchema],
    ) -> Result<ModelReply>;
}

/// Chat model backed by the configured HTTP provider.
pub struct HttpChatModel {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpChatModel {
    pub fn new(client: reqwest::Client, config: LlmConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSchema],
    ) -> Result<ModelReply> {
        complete_with_functions(&self.client, &self.config, messages, functions).await
    }
}

/// Run a single non-streaming chat completion with automatic function-call
/// selection.
pub async fn complete_with_functions(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: &[ChatMessage],
    functions: &[FunctionSchema],
) -> Result<ModelReply> {
    let req = build_request(config, messages, functions);

    let request = match config.provider.as_str() {
        "azure" => client
            .post(chat_url(config))
            .header("api-key", config.api_key.as_deref().unwrap_or_default()),
        "openai" => client.post(chat_url(config)).header(
            "Authorization",
            format!("Bearer {}", config.api_key.as_deref().unwrap_or_default()),
        ),
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    };

    let resp = request
        .json(&req)
        .send()
        .await
        .context("Failed to call chat completions API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Chat completions API returned {status}: {body}");
    }

    let body: ChatResponse = resp
        .json()
        .await
        .context("Failed to parse chat completions response")?;

    parse_chat_response(body)
}

fn chat_url(config: &LlmConfig) -> String {
    let base = config.endpoint.trim_end_matches('/');
    match config.provider.as_str() {
        "openai" => format!("{base}/v1/chat/completions"),
        _ => format!(
            "{base}/openai/deployments/{}/chat/completions?api-version={}",
            config.chat_deployment, config.api_version
        ),
    }
}

fn build_request<'a>(
    config: &LlmConfig,
    messages: &'a [ChatMessage],
    functions: &'a [FunctionSchema],
) -> ChatRequest<'a> {
    // An empty `functions` array is rejected upstream, so omit both fields.
    let (functions, function_call) = if functions.is_empty() {
        (None, None)
    } else {
        (Some(functions), Some("auto"))
    };

    ChatRequest {
        model: (config.provider == "openai").then(|| config.chat_deployment.clone()),
        messages,
        functions,
        function_call,
    }
}

fn parse_chat_response(body: ChatResponse) -> Result<ModelReply> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .context("Chat completion returned no choices")?;

    let content = choice.message.content;

    if choice.finish_reason.as_deref() != Some("function_call") {
        return Ok(ModelReply::Text { content });
    }

    let Some(raw) = choice.message.function_call else {
        tracing::warn!("finish_reason is function_call but no call was returned");
        return Ok(ModelReply::Text { content });
    };

    match parse_arguments(&raw.arguments) {
        Ok(arguments) => Ok(ModelReply::FunctionCall {
            content,
            call: FunctionCall {
                name: raw.name,
                arguments,
            },
        }),
        Err(e) => {
            tracing::warn!("Ignoring call to '{}': {e}", raw.name);
            Ok(ModelReply::Text { content })
        }
    }
}

/// Function arguments arrive as a JSON-encoded object inside a string.
fn parse_arguments(raw: &str) -> Result<Map<String, Value>> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw).context("Malformed function arguments")? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!("Function arguments must be an object, got {other}"),
    }
}

// ─── Request/Response types ────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    functions: Option<&'a [FunctionSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<&'static str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    #[serde(default)]
    finish_reason: Option<String>,
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<RawFunctionCall>,
}

#[derive(Deserialize)]
struct RawFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}
