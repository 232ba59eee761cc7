use anyhow::{Context, Result};
use std::sync::Arc;

use crate::llm::chat::ChatModel;
use crate::llm::embeddings::Embedder;
use crate::llm::tokenizer::TokenCounter;
use crate::models::{ChatMessage, QueryResponse, SearchHit};
use crate::search::index::VectorIndex;
use crate::tools::ToolRegistry;

const PERSONA_PROMPT: &str = "You are an excellent professional psychologist. You help patients \
     and researchers using the information available in the search results. Respond in the \
     language you are spoken to, with kindness and empathy.";

const EMAIL_POLICY_PROMPT: &str =
    "If the user wants an email, do not ask for confirmation, just send it.";

/// Embed → search → prompt → chat → function dispatch.
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chat: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    tokens: Option<TokenCounter>,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn ChatModel>,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            embedder,
            index,
            chat,
            tools,
            tokens: None,
        }
    }

    pub fn with_token_counter(mut self, tokens: TokenCounter) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Answer `query`. Embedding, search and chat failures are returned;
    /// function-call failures are logged and swallowed.
    pub async fn answer(&self, query: &str) -> Result<QueryResponse> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .context("Embedding the query failed")?;

        let hits = self
            .index
            .search(&embedding)
            .await
            .context("Vector search failed")?;
        tracing::info!("Vector search returned {} hits", hits.len());

        let messages = build_messages(query, hits.first());
        self.log_prompt_size(&messages);

        let reply = self
            .chat
            .complete(&messages, &self.tools.schemas())
            .await
            .context("Chat completion failed")?;

        let (content, call) = reply.into_parts();
        if let Some(call) = call {
            tracing::info!("Model requested function '{}'", call.name);
            self.tools.dispatch(&call).await;
        }

        Ok(QueryResponse {
            openai_response: content,
            search_results: hits,
        })
    }

    fn log_prompt_size(&self, messages: &[ChatMessage]) {
        let Some(tokens) = &self.tokens else {
            return;
        };
        let total: Result<usize> = messages.iter().map(|m| tokens.count(&m.content)).sum();
        match total {
            Ok(n) => tracing::debug!("Prompt is {n} tokens"),
            Err(e) => tracing::warn!("Token count failed: {e}"),
        }
    }
}

/// Only the top hit is shown to the model; the caller still gets all of them.
fn build_messages(query: &str, top_hit: Option<&SearchHit>) -> Vec<ChatMessage> {
    let context = match top_hit.map(serde_json::to_string) {
        Some(Ok(hit)) => format!("Search results: {hit}"),
        _ => "Search results: none".to_string(),
    };

    vec![
        ChatMessage::system(PERSONA_PROMPT),
        ChatMessage::user(query),
        ChatMessage::system(context),
        ChatMessage::system(EMAIL_POLICY_PROMPT),
    ]
}
