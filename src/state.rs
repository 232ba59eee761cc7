use std::sync::Arc;
use std::time::Duration;

use crate::accounts::AccountStore;
use crate::config::Config;
use crate::llm::chat::HttpChatModel;
use crate::llm::embeddings::HttpEmbedder;
use crate::llm::tokenizer::TokenCounter;
use crate::rag::RagPipeline;
use crate::search::index::AzureSearchIndex;
use crate::tools::email::{SendEmailTool, SmtpMailer};
use crate::tools::ToolRegistry;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountStore>,
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    /// Wire up the real HTTP/SMTP collaborators from configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        let tools = ToolRegistry::new().with(Arc::new(SendEmailTool::new(Arc::new(
            SmtpMailer::new(config.smtp.clone()),
        ))));

        let mut pipeline = RagPipeline::new(
            Arc::new(HttpEmbedder::new(http_client.clone(), config.llm.clone())),
            Arc::new(AzureSearchIndex::new(http_client.clone(), config.search.clone())),
            Arc::new(HttpChatModel::new(http_client, config.llm.clone())),
            tools,
        );

        if let Some(path) = &config.tokenizer_path {
            match TokenCounter::from_file(path) {
                Ok(tokens) => pipeline = pipeline.with_token_counter(tokens),
                Err(e) => tracing::warn!("Tokenizer disabled: {e:#}"),
            }
        }

        Ok(Self::from_parts(
            AccountStore::new(config.auth.bcrypt_cost),
            pipeline,
        ))
    }

    pub fn from_parts(accounts: AccountStore, pipeline: RagPipeline) -> Self {
        Self {
            accounts: Arc::new(accounts),
            pipeline: Arc::new(pipeline),
        }
    }
}
