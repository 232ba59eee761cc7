use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document returned by the vector index, reduced to its display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub date: String,
    pub section: String,
    pub content: String,
}

/// Query request. `query` is optional so a missing key maps to a 400 instead
/// of an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// Query response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Text produced by the chat model. `None` when the model replied with
    /// a function call only.
    pub openai_response: Option<String>,
    pub search_results: Vec<SearchHit>,
}

/// A single chat turn (system, user or assistant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A function the model asked us to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// Function schema advertised to the chat model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// What the chat model came back with.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Text {
        content: Option<String>,
    },
    FunctionCall {
        content: Option<String>,
        call: FunctionCall,
    },
}

impl ModelReply {
    pub fn into_parts(self) -> (Option<String>, Option<FunctionCall>) {
        match self {
            ModelReply::Text { content } => (content, None),
            ModelReply::FunctionCall { content, call } => (content, Some(call)),
        }
    }
}

/// Signup request. Every field is optional at the wire level; emptiness is
/// checked by the handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub birthdate: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Public view of an account, echoed back on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub username: String,
    pub birthdate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserProfile,
}
