use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// Whole-request timeout for outbound HTTP calls, in seconds
    pub http_timeout_secs: u64,
    /// Embedding + chat provider configuration
    pub llm: LlmConfig,
    /// Remote vector index configuration
    pub search: SearchConfig,
    /// Outbound mail relay used by the `send_email` function
    pub smtp: SmtpConfig,
    /// Account store settings
    pub auth: AuthConfig,
    /// Optional path to a `tokenizer.json` used to log prompt sizes
    pub tokenizer_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "azure" or "openai"
    pub provider: String,
    /// Resource endpoint (Azure) or base URL (OpenAI-compatible)
    pub endpoint: String,
    /// API key, sent as `api-key` (Azure) or bearer token (OpenAI)
    pub api_key: Option<String>,
    /// Azure REST api-version query parameter
    pub api_version: String,
    /// Deployment (Azure) or model name (OpenAI) for chat completions
    pub chat_deployment: String,
    /// Deployment (Azure) or model name (OpenAI) for embeddings
    pub embedding_model: String,
    /// Requested embedding vector dimension. When unset the model default is used.
    pub embedding_dim: Option<usize>,
}

/// Configuration for the hosted vector index (Azure AI Search REST API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub api_version: String,
    pub index_name: String,
    /// Name of the vector field queried by the nearest-neighbor search
    pub vector_field: String,
    /// Nearest neighbours requested from the vector query
    pub k: usize,
    /// Documents fetched from the index
    pub top: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    /// Sender address, also used as the SMTP username
    pub sender: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            http_timeout_secs: 120,
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            smtp: SmtpConfig::default(),
            auth: AuthConfig::default(),
            tokenizer_path: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            endpoint: "http://localhost:8080".to_string(),
            api_key: None,
            api_version: "2024-06-01".to_string(),
            chat_deployment: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dim: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081".to_string(),
            api_key: None,
            api_version: "2023-11-01".to_string(),
            index_name: "documents".to_string(),
            vector_field: "vector".to_string(),
            k: 3,
            top: 10,
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            sender: None,
            password: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. Unparsable numbers
    /// leave the default in place.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("RAG_CHAT_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(v) = lookup("HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            config.http_timeout_secs = v;
        }
        if let Some(path) = lookup("TOKENIZER_PATH") {
            config.tokenizer_path = Some(path);
        }

        // LLM
        if let Some(provider) = lookup("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
            config.llm.endpoint = endpoint;
        }
        if let Some(key) = lookup("AZURE_OPENAI_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Some(version) = lookup("AZURE_OPENAI_API_VERSION") {
            config.llm.api_version = version;
        }
        if let Some(name) = lookup("AZURE_OPENAI_CHAT_COMPLETIONS_DEPLOYMENT_NAME") {
            config.llm.chat_deployment = name;
        }
        if let Some(model) = lookup("AZURE_OPENAI_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Some(dim) = lookup("EMBEDDING_VECTOR_DIMENSIONS").and_then(|v| v.parse().ok()) {
            config.llm.embedding_dim = Some(dim);
        }

        // Vector index
        if let Some(endpoint) = lookup("AZURE_SEARCH_SERVICE_ENDPOINT") {
            config.search.endpoint = endpoint;
        }
        if let Some(key) = lookup("AZURE_SEARCH_SERVICE_ADMIN_KEY") {
            config.search.api_key = Some(key);
        }
        if let Some(version) = lookup("AZURE_SEARCH_API_VERSION") {
            config.search.api_version = version;
        }
        if let Some(name) = lookup("SEARCH_INDEX_NAME") {
            config.search.index_name = name;
        }
        if let Some(field) = lookup("SEARCH_VECTOR_FIELD") {
            config.search.vector_field = field;
        }
        if let Some(k) = lookup("SEARCH_K").and_then(|v| v.parse().ok()) {
            config.search.k = k;
        }
        if let Some(top) = lookup("SEARCH_TOP").and_then(|v| v.parse().ok()) {
            config.search.top = top;
        }

        // SMTP
        if let Some(host) = lookup("SMTP_SERVER") {
            config.smtp.host = Some(host);
        }
        if let Some(port) = lookup("SMTP_PORT").and_then(|v| v.parse().ok()) {
            config.smtp.port = port;
        }
        if let Some(sender) = lookup("EMAIL_SENDER") {
            config.smtp.sender = Some(sender);
        }
        if let Some(password) = lookup("EMAIL_PASSWORD") {
            config.smtp.password = Some(password);
        }

        if let Some(cost) = lookup("BCRYPT_COST")
            .and_then(|v| v.parse().ok())
            .filter(|c| (4..=31).contains(c))
        {
            config.auth.bcrypt_cost = cost;
        }

        config
    }
}
