//! Functions the chat model may ask the backend to run.
//!
//! Each [`Tool`] advertises a JSON schema that is sent with every chat
//! completion. When the model answers with a function call, the
//! [`ToolRegistry`] looks it up by name and runs it. Failures never reach the
//! HTTP caller; they are only logged.

pub mod email;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::models::{FunctionCall, FunctionSchema};

#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> FunctionSchema;

    async fn invoke(&self, arguments: &Map<String, Value>) -> Result<()>;
}

/// What happened to a dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    UnknownFunction,
    Failed(String),
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        self.tools.retain(|t| t.schema().name != name);
        self.tools.push(tool);
    }

    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn schemas(&self) -> Vec<FunctionSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub async fn dispatch(&self, call: &FunctionCall) -> DispatchOutcome {
        let Some(tool) = self.tools.iter().find(|t| t.schema().name == call.name) else {
            tracing::info!("Model requested unknown function '{}', ignoring", call.name);
            return DispatchOutcome::UnknownFunction;
        };

        match tool.invoke(&call.arguments).await {
            Ok(()) => {
                tracing::info!("Function '{}' completed", call.name);
                DispatchOutcome::Completed
            }
            Err(e) => {
                tracing::error!("Function '{}' failed: {e:#}", call.name);
                DispatchOutcome::Failed(format!("{e:#}"))
            }
        }
    }
}

/// Fetch a required string argument.
pub(crate) fn string_arg<'a>(arguments: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    match arguments.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => anyhow::bail!("Argument '{key}' must be a string, got {other}"),
        None => anyhow::bail!("Missing argument '{key}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        name: &'static str,
        calls: AtomicUsize,
        fail: bool,
    }

    impl Counter {
        fn new(name: &'static str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl Tool for Counter {
        fn schema(&self) -> FunctionSchema {
            FunctionSchema {
                name: self.name.to_string(),
                description: "counts".into(),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
            }
        }

        async fn invoke(&self, _arguments: &Map<String, Value>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(())
        }
    }

    fn call(name: &str) -> FunctionCall {
        FunctionCall {
            name: name.into(),
            arguments: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_name() {
        let a = Counter::new("a", false);
        let b = Counter::new("b", false);
        let registry = ToolRegistry::new().with(a.clone()).with(b.clone());

        assert_eq!(registry.dispatch(&call("b")).await, DispatchOutcome::Completed);
        assert_eq!(a.calls.load(Ordering::SeqCst), 0);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_function_is_ignored() {
        let a = Counter::new("a", false);
        let registry = ToolRegistry::new().with(a.clone());

        assert_eq!(
            registry.dispatch(&call("delete_everything")).await,
            DispatchOutcome::UnknownFunction
        );
        assert_eq!(a.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_raised() {
        let registry = ToolRegistry::new().with(Counter::new("a", true));
        assert_eq!(
            registry.dispatch(&call("a")).await,
            DispatchOutcome::Failed("boom".into())
        );
    }

    #[test]
    fn test_register_replaces_same_name() {
        let registry = ToolRegistry::new()
            .with(Counter::new("a", false))
            .with(Counter::new("a", true));
        assert_eq!(registry.schemas().len(), 1);
    }

    #[test]
    fn test_string_arg() {
        let mut args = Map::new();
        args.insert("to".into(), Value::String("x".into()));
        args.insert("n".into(), serde_json::json!(3));
        assert_eq!(string_arg(&args, "to").unwrap(), "x");
        assert!(string_arg(&args, "n").is_err());
        assert!(string_arg(&args, "missing").is_err());
    }
}
