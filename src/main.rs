use tracing_subscriber::EnvFilter;

use rag_chat::api;
use rag_chat::config::Config;
use rag_chat::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real env vars still apply.
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        "LLM provider: {} ({}), chat={}, embeddings={}",
        config.llm.provider,
        config.llm.endpoint,
        config.llm.chat_deployment,
        config.llm.embedding_model
    );
    tracing::info!(
        "Vector index: {} at {}",
        config.search.index_name,
        config.search.endpoint
    );
    if config.smtp.host.is_none() || config.smtp.sender.is_none() {
        tracing::warn!("SMTP not configured; send_email requests will fail and be logged");
    }

    let state = AppState::new(&config)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
