//! Tool invocation pipeline
//!
//! Routes an [`InvocationRequest`] to its registered tool: registry lookup,
//! argument presence check, schema validation, typed decode, then the handler
//! under a deadline. Every outcome comes back as an [`InvocationResult`].

use std::{sync::Arc, time::Duration};

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{
    content::Content,
    registry::ToolRegistry,
    session::{Session, SessionStore},
};
use crate::errors::InvocationError;

pub type InvocationResult = Result<Vec<Content>, InvocationError>;

#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub tool: String,
    pub arguments: Option<Value>,
}

impl InvocationRequest {
    pub fn new(tool: impl Into<String>, arguments: Option<Value>) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    sessions: Arc<SessionStore>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, sessions: Arc<SessionStore>, timeout: Duration) -> Self {
        Self {
            registry,
            sessions,
            timeout,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn invoke(&self, request: InvocationRequest, session: &Session) -> InvocationResult {
        let Some(descriptor) = self.registry.lookup(&request.tool) else {
            return Err(InvocationError::UnknownTool { name: request.tool });
        };

        let arguments = match request.arguments {
            None | Some(Value::Null) => return Err(InvocationError::MissingArguments),
            Some(arguments) => arguments,
        };

        debug!(tool = %request.tool, session = %session.identity(), "invoking tool");

        match tokio::time::timeout(self.timeout, descriptor.call(arguments, session)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    tool = %request.tool,
                    timeout_ms = self.timeout.as_millis(),
                    "tool execution timed out"
                );
                Err(InvocationError::handler(format!(
                    "tool execution timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }

    /// Resolves the caller's session, creating it on first contact, then invokes.
    pub async fn invoke_as(&self, identity: &str, request: InvocationRequest) -> InvocationResult {
        let session = self.sessions.get_or_create(identity);
        self.invoke(request, &session).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    use super::{Dispatcher, InvocationRequest};
    use crate::domain::{
        content::Content,
        registry::{ToolDescriptor, ToolHandler, ToolRegistry},
        schema::{FieldKind, ToolSchema},
        session::{Session, SessionStore},
        tools::register_builtin_tools,
    };
    use crate::errors::InvocationError;

    #[derive(Deserialize)]
    struct CountParams {
        fail: bool,
    }

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ToolHandler for Counting {
        type Params = CountParams;

        async fn call(&self, params: CountParams, _session: &Session) -> Result<Vec<Content>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if params.fail {
                return Err("counter exploded".to_string());
            }
            Ok(vec![Content::text("counted")])
        }
    }

    #[derive(Deserialize)]
    struct NoParams {}

    struct Sleepy;

    #[async_trait]
    impl ToolHandler for Sleepy {
        type Params = NoParams;

        async fn call(&self, _params: NoParams, _session: &Session) -> Result<Vec<Content>, String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![Content::text("too late")])
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry).expect("builtin tools");
        registry
            .register(ToolDescriptor::new(
                "count",
                "Counts invocations",
                ToolSchema::new().required("fail", FieldKind::Boolean, ""),
                Counting {
                    calls: Arc::clone(&calls),
                },
            ))
            .expect("count tool");
        registry
            .register(ToolDescriptor::new("sleepy", "Never finishes in time", ToolSchema::new(), Sleepy))
            .expect("sleepy tool");

        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            Arc::new(SessionStore::new()),
            Duration::from_secs(1),
        );
        (dispatcher, calls)
    }

    fn text_of(result: &[Content]) -> &str {
        result[0].as_text().expect("text content")
    }

    #[tokio::test]
    async fn add_returns_decimal_sum() {
        let (dispatcher, _) = dispatcher();

        let sum = dispatcher
            .invoke_as("client-A", InvocationRequest::new("add", Some(json!({"x": 2, "y": 3}))))
            .await
            .expect("add succeeds");
        assert_eq!(text_of(&sum), "5");

        let zero = dispatcher
            .invoke_as("client-A", InvocationRequest::new("add", Some(json!({"x": -7, "y": 7}))))
            .await
            .expect("add succeeds");
        assert_eq!(text_of(&zero), "0");
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_without_invoking_anything() {
        let (dispatcher, calls) = dispatcher();

        for payload in [
            None,
            Some(serde_json::Value::Null),
            Some(json!({})),
            Some(json!({"x": 1, "y": 2})),
            Some(json!("junk")),
        ] {
            let error = dispatcher
                .invoke_as("client-A", InvocationRequest::new("multiply", payload))
                .await
                .expect_err("unknown tool");
            assert_eq!(
                error,
                InvocationError::UnknownTool {
                    name: "multiply".to_string()
                }
            );
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_handler() {
        let (dispatcher, calls) = dispatcher();

        let missing = dispatcher
            .invoke_as("client-A", InvocationRequest::new("add", Some(json!({"x": 1}))))
            .await
            .expect_err("missing y");
        assert!(matches!(
            missing,
            InvocationError::InvalidArguments { ref field, .. } if field.as_deref() == Some("y")
        ));

        let mistyped = dispatcher
            .invoke_as("client-A", InvocationRequest::new("add", Some(json!({"x": "2", "y": 3}))))
            .await
            .expect_err("string x");
        assert!(matches!(mistyped, InvocationError::InvalidArguments { .. }));

        let wrong_count = dispatcher
            .invoke_as("client-A", InvocationRequest::new("count", Some(json!({"fail": "no"}))))
            .await
            .expect_err("string fail flag");
        assert!(matches!(wrong_count, InvocationError::InvalidArguments { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn absent_or_null_payload_is_missing_arguments() {
        let (dispatcher, calls) = dispatcher();

        for arguments in [None, Some(serde_json::Value::Null)] {
            let error = dispatcher
                .invoke_as("client-A", InvocationRequest::new("count", arguments))
                .await
                .expect_err("no arguments");
            assert_eq!(error, InvocationError::MissingArguments);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_failure_is_distinguished_from_bad_input() {
        let (dispatcher, calls) = dispatcher();

        let error = dispatcher
            .invoke_as("client-A", InvocationRequest::new("count", Some(json!({"fail": true}))))
            .await
            .expect_err("handler fails");

        assert_eq!(error, InvocationError::handler("counter exploded"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handler_is_cancelled_at_deadline() {
        let (dispatcher, _) = dispatcher();

        let error = dispatcher
            .invoke_as("client-A", InvocationRequest::new("sleepy", Some(json!({}))))
            .await
            .expect_err("deadline exceeded");

        assert_eq!(
            error,
            InvocationError::handler("tool execution timed out after 1000ms")
        );
    }

    #[tokio::test]
    async fn add_records_last_sum_in_callers_session() {
        let (dispatcher, _) = dispatcher();

        dispatcher
            .invoke_as("client-A", InvocationRequest::new("add", Some(json!({"x": 40, "y": 2}))))
            .await
            .expect("add succeeds");

        let session_a = dispatcher.sessions().get_or_create("client-A");
        let session_b = dispatcher.sessions().get_or_create("client-B");
        assert_eq!(session_a.get("last_sum"), Some(json!(42)));
        assert_eq!(session_b.get("last_sum"), None);
    }
}
