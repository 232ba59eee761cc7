//! Integration tests for the HTTP surface.
//!
//! The router runs against in-memory stand-ins for the embedding service,
//! vector index, chat model and mail relay, so no network is needed.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use rag_chat::accounts::AccountStore;
use rag_chat::api;
use rag_chat::llm::chat::ChatModel;
use rag_chat::llm::embeddings::Embedder;
use rag_chat::models::{ChatMessage, FunctionCall, FunctionSchema, ModelReply, SearchHit};
use rag_chat::rag::RagPipeline;
use rag_chat::search::index::VectorIndex;
use rag_chat::state::AppState;
use rag_chat::tools::email::{Mailer, OutgoingEmail, SendEmailTool};
use rag_chat::tools::ToolRegistry;

// ─── Fakes ───────────────────────────────────────────────

/// Which upstream service the fakes should fail.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Outage {
    None,
    Embedding,
    Search,
    Chat,
}

struct FakeEmbedder {
    fail: bool,
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        if self.fail {
            anyhow::bail!("embedding service unavailable");
        }
        Ok(vec![0.1, 0.2, 0.3])
    }
}

struct FakeIndex {
    hits: Vec<SearchHit>,
    fail: bool,
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn search(&self, _embedding: &[f32]) -> Result<Vec<SearchHit>> {
        if self.fail {
            anyhow::bail!("search service returned 503");
        }
        Ok(self.hits.clone())
    }
}

struct FakeChat {
    reply: ModelReply,
    fail: bool,
    seen_messages: Mutex<Vec<Vec<ChatMessage>>>,
    seen_functions: Mutex<Vec<String>>,
}

impl FakeChat {
    fn new(reply: ModelReply, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            reply,
            fail,
            seen_messages: Mutex::new(Vec::new()),
            seen_functions: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        functions: &[FunctionSchema],
    ) -> Result<ModelReply> {
        self.seen_messages.lock().push(messages.to_vec());
        self.seen_functions
            .lock()
            .extend(functions.iter().map(|f| f.name.clone()));
        if self.fail {
            anyhow::bail!("chat completion timed out");
        }
        Ok(self.reply.clone())
    }
}

struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        self.sent.lock().push(email.clone());
        if self.fail {
            anyhow::bail!("SMTP relay refused connection");
        }
        Ok(())
    }
}

// ─── Harness ─────────────────────────────────────────────

struct Harness {
    app: Router,
    chat: Arc<FakeChat>,
    mailer: Arc<RecordingMailer>,
}

fn harness_with(
    reply: ModelReply,
    hits: Vec<SearchHit>,
    outage: Outage,
    mail_fails: bool,
) -> Harness {
    let chat = FakeChat::new(reply, outage == Outage::Chat);
    let mailer = Arc::new(RecordingMailer {
        sent: Mutex::new(Vec::new()),
        fail: mail_fails,
    });

    let tools = ToolRegistry::new().with(Arc::new(SendEmailTool::new(mailer.clone())));
    let pipeline = RagPipeline::new(
        Arc::new(FakeEmbedder {
            fail: outage == Outage::Embedding,
        }),
        Arc::new(FakeIndex {
            hits,
            fail: outage == Outage::Search,
        }),
        chat.clone(),
        tools,
    );
    // Lowest bcrypt cost keeps the account tests fast
    let state = AppState::from_parts(AccountStore::new(4), pipeline);

    Harness {
        app: api::router(state),
        chat,
        mailer,
    }
}

fn harness(reply: ModelReply) -> Harness {
    harness_with(reply, sample_hits(3), Outage::None, false)
}

fn text_reply(content: &str) -> ModelReply {
    ModelReply::Text {
        content: Some(content.to_string()),
    }
}

fn call_reply(content: Option<&str>, name: &str, arguments: Value) -> ModelReply {
    let Value::Object(arguments) = arguments else {
        panic!("arguments must be an object");
    };
    ModelReply::FunctionCall {
        content: content.map(str::to_string),
        call: FunctionCall {
            name: name.to_string(),
            arguments,
        },
    }
}

fn sample_hits(n: usize) -> Vec<SearchHit> {
    (0..n)
        .map(|i| SearchHit {
            title: format!("Article {i}"),
            date: format!("2024-01-{:02}", i + 1),
            section: format!("Section {i}"),
            content: format!("Content of chunk {i}"),
        })
        .collect()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn signup_body(email: &str, password: &str) -> Value {
    json!({
        "email": email,
        "password": password,
        "username": "ana",
        "birthdate": "03/14/1992"
    })
}

// ─── /search ─────────────────────────────────────────────

#[tokio::test]
async fn test_search_returns_reply_and_every_hit() {
    let h = harness_with(text_reply("Try a breathing exercise."), sample_hits(5), Outage::None, false);

    let (status, body) = post_json(&h.app, "/search", json!({ "query": "I feel anxious" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openai_response"], "Try a breathing exercise.");
    let results = body["search_results"].as_array().unwrap();
    assert_eq!(results.len(), 5);
    for (i, hit) in results.iter().enumerate() {
        let obj = hit.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(hit["title"], format!("Article {i}"));
        assert!(obj.contains_key("date"));
        assert!(obj.contains_key("section"));
        assert!(obj.contains_key("content"));
    }
}

#[tokio::test]
async fn test_search_with_empty_index() {
    let h = harness_with(text_reply("I could not find anything."), vec![], Outage::None, false);

    let (status, body) = post_json(&h.app, "/search", json!({ "query": "hello" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["search_results"], json!([]));
    let seen = h.chat.seen_messages.lock();
    assert_eq!(seen[0][2].content, "Search results: none");
}

#[tokio::test]
async fn test_prompt_contains_only_the_first_hit() {
    let h = harness(text_reply("ok"));

    post_json(&h.app, "/search", json!({ "query": "sleep problems" })).await;

    let seen = h.chat.seen_messages.lock();
    assert_eq!(seen.len(), 1);
    let messages = &seen[0];
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1], ChatMessage::user("sleep problems"));
    assert!(messages[2].content.contains("Article 0"));
    assert!(!messages[2].content.contains("Article 1"));
    assert_eq!(*h.chat.seen_functions.lock(), vec!["send_email".to_string()]);
}

#[tokio::test]
async fn test_search_missing_query_is_invalid_input() {
    let h = harness(text_reply("unused"));

    for body in [json!({}), json!({ "question": "hi" }), json!({ "query": "   " })] {
        let (status, resp) = post_json(&h.app, "/search", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp, json!({ "error": "Invalid input" }));
    }
    assert!(h.chat.seen_messages.lock().is_empty());
}

#[tokio::test]
async fn test_search_non_json_body_is_invalid_input() {
    let h = harness(text_reply("unused"));

    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header("content-type", "text/plain")
        .body(Body::from("query=hi"))
        .unwrap();
    let (status, bytes) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({ "error": "Invalid input" }));
}

#[tokio::test]
async fn test_upstream_failure_is_server_error() {
    for outage in [Outage::Embedding, Outage::Search, Outage::Chat] {
        let h = harness_with(text_reply("unused"), sample_hits(1), outage, false);

        let request = Request::builder()
            .method("POST")
            .uri("/search")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "query": "hi" }).to_string()))
            .unwrap();
        let (status, bytes) = send(&h.app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{outage:?}");
        assert!(serde_json::from_slice::<Value>(&bytes).is_err(), "{outage:?}");
        let chat_calls = h.chat.seen_messages.lock().len();
        assert_eq!(chat_calls, usize::from(outage == Outage::Chat), "{outage:?}");
    }
}

// ─── Function calls ──────────────────────────────────────

#[tokio::test]
async fn test_send_email_call_reaches_mailer() {
    let h = harness(call_reply(
        Some("I've sent you the summary."),
        "send_email",
        json!({
            "to_email": "patient@example.com",
            "subject": "Session summary",
            "body": "Remember to journal daily."
        }),
    ));

    let (status, body) =
        post_json(&h.app, "/search", json!({ "query": "email me a summary" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openai_response"], "I've sent you the summary.");
    assert_eq!(
        h.mailer.sent.lock().as_slice(),
        &[OutgoingEmail {
            to: "patient@example.com".into(),
            subject: "Session summary".into(),
            body: "Remember to journal daily.".into(),
        }]
    );
}

#[tokio::test]
async fn test_function_call_without_text_returns_null_reply() {
    let h = harness(call_reply(
        None,
        "send_email",
        json!({ "to_email": "a@example.com", "subject": "s", "body": "b" }),
    ));

    let (status, body) = post_json(&h.app, "/search", json!({ "query": "email me" })).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["openai_response"].is_null());
    assert_eq!(body["search_results"].as_array().unwrap().len(), 3);
    assert_eq!(h.mailer.sent.lock().len(), 1);
}

#[tokio::test]
async fn test_other_function_names_send_nothing() {
    let h = harness(call_reply(
        Some("Done."),
        "book_appointment",
        json!({ "to_email": "patient@example.com", "subject": "x", "body": "y" }),
    ));

    let (status, body) = post_json(&h.app, "/search", json!({ "query": "book me" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openai_response"], "Done.");
    assert!(h.mailer.sent.lock().is_empty());
}

#[tokio::test]
async fn test_mail_failure_is_not_surfaced() {
    let h = harness_with(
        call_reply(
            Some("Sent!"),
            "send_email",
            json!({ "to_email": "patient@example.com", "subject": "s", "body": "b" }),
        ),
        sample_hits(2),
        Outage::None,
        true,
    );

    let (status, body) = post_json(&h.app, "/search", json!({ "query": "email me" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openai_response"], "Sent!");
    assert_eq!(h.mailer.sent.lock().len(), 1);
}

#[tokio::test]
async fn test_send_email_with_missing_arguments_is_ignored() {
    let h = harness(call_reply(
        Some("Sure."),
        "send_email",
        json!({ "to_email": "patient@example.com" }),
    ));

    let (status, body) = post_json(&h.app, "/search", json!({ "query": "email me" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["openai_response"], "Sure.");
    assert!(h.mailer.sent.lock().is_empty());
}

// ─── /signup and /login ──────────────────────────────────

#[tokio::test]
async fn test_signup_twice_conflicts_without_mutation() {
    let h = harness(text_reply("unused"));

    let (status, body) =
        post_json(&h.app, "/signup", signup_body("ana@example.com", "first-pw")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "message": "Signup successful!" }));

    let (status, body) =
        post_json(&h.app, "/signup", signup_body("ana@example.com", "second-pw")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "message": "User already exist" }));

    // The original password still works, the second one does not.
    let (status, _) = post_json(
        &h.app,
        "/login",
        json!({ "email": "ana@example.com", "password": "first-pw" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_json(
        &h.app,
        "/login",
        json!({ "email": "ana@example.com", "password": "second-pw" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_requires_every_field() {
    let h = harness(text_reply("unused"));

    let (status, body) = post_json(
        &h.app,
        "/signup",
        json!({ "email": "ana@example.com", "password": "pw", "username": "ana" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Missing required fields" }));
}

#[tokio::test]
async fn test_password_past_bcrypt_limit() {
    let h = harness(text_reply("unused"));

    let too_long = format!("{}RIGHT", "a".repeat(72));
    let (status, body) = post_json(&h.app, "/signup", signup_body("ana@example.com", &too_long)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Password must be at most 72 bytes" }));

    let exact = "a".repeat(72);
    let (status, _) = post_json(&h.app, "/signup", signup_body("ana@example.com", &exact)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = post_json(
        &h.app,
        "/login",
        json!({ "email": "ana@example.com", "password": format!("{exact}WRONG") }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_echoes_profile() {
    let h = harness(text_reply("unused"));
    post_json(&h.app, "/signup", signup_body("ana@example.com", "pw")).await;

    let (status, body) = post_json(
        &h.app,
        "/login",
        json!({ "email": "ana@example.com", "password": "pw" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "message": "Login successful!",
            "user": {
                "email": "ana@example.com",
                "username": "ana",
                "birthdate": "03/14/1992"
            }
        })
    );
}

#[tokio::test]
async fn test_login_mismatch_is_unauthorized() {
    let h = harness(text_reply("unused"));
    post_json(&h.app, "/signup", signup_body("ana@example.com", "pw")).await;

    let attempts = [
        json!({ "email": "ana@example.com", "password": "wrong" }),
        json!({ "email": "ANA@example.com", "password": "pw" }),
        json!({ "email": "bob@example.com", "password": "pw" }),
        json!({ "email": "ana@example.com" }),
    ];
    for attempt in attempts {
        let (status, body) = post_json(&h.app, "/login", attempt).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "message": "Invalid credentials!" }));
    }
}

// ─── UI ──────────────────────────────────────────────────

#[tokio::test]
async fn test_index_page_is_served() {
    let h = harness(text_reply("unused"));

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(bytes).unwrap();
    assert!(html.contains("/search"));
    assert!(html.contains("logged_in"));
}
