//! # rag-chat
//!
//! A small retrieval-augmented chat backend. A query is embedded, matched
//! against a hosted vector index, and answered by a hosted chat model that
//! may also ask the backend to send an email on the user's behalf.
//!
//! ## Request flow
//!
//! ```text
//!        POST /search {"query"}
//!                 │
//!                 ▼
//!        ┌─────────────────┐
//!        │    Embedding    │
//!        └────────┬────────┘
//!                 ▼
//!        ┌─────────────────┐
//!        │  Vector search  │  k=3, top=10
//!        └────────┬────────┘
//!                 ▼
//!        ┌─────────────────┐
//!        │ Prompt (top hit)│
//!        └────────┬────────┘
//!                 ▼
//!        ┌─────────────────┐
//!        │ Chat completion │  functions: send_email
//!        └────────┬────────┘
//!                 ▼
//!        ┌─────────────────┐
//!        │ Function call?  │──► ToolRegistry (errors logged only)
//!        └────────┬────────┘
//!                 ▼
//!   {"openai_response", "search_results"}
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the server, LLM, index and SMTP
//! - [`models`] - Shared data types: `SearchHit`, `ModelReply`, request/response bodies
//! - [`llm::embeddings`] - Embedding generation via Azure OpenAI or OpenAI-compatible APIs
//! - [`llm::chat`] - Chat completions with function calling
//! - [`llm::tokenizer`] - Token counting with a HuggingFace tokenizer
//! - [`search::index`] - Azure AI Search vector queries
//! - [`tools`] - Functions the model may call, and the `send_email` SMTP tool
//! - [`rag`] - The query pipeline tying the above together
//! - [`accounts`] - In-memory account store with bcrypt passwords
//! - [`api`] - Axum HTTP handlers and router
//! - [`state`] - Shared application state
//! - [`session`], [`client`] - Front-end session state and a typed API client

pub mod accounts;
pub mod api;
pub mod client;
pub mod config;
pub mod llm;
pub mod models;
pub mod rag;
pub mod search;
pub mod session;
pub mod state;
pub mod tools;
