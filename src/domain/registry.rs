//! Tool registry
//!
//! Tools are registered once at startup and the registry is then shared
//! read-only behind an `Arc`, so lookups need no locking.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use rust_mcp_sdk::schema::Tool;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::domain::{content::Content, schema::ToolSchema, session::Session};
use crate::errors::{AppError, InvocationError, RegistryError};

/// A tool's behaviour. `Params` is decoded from arguments that already
/// passed the descriptor's schema.
#[async_trait]
pub trait ToolHandler: Send + Sync + 'static {
    type Params: DeserializeOwned + Send;

    async fn call(&self, params: Self::Params, session: &Session) -> Result<Vec<Content>, String>;
}

#[async_trait]
trait ErasedHandler: Send + Sync {
    async fn invoke(&self, arguments: Value, session: &Session) -> Result<Vec<Content>, InvocationError>;
}

struct Typed<H>(H);

#[async_trait]
impl<H: ToolHandler> ErasedHandler for Typed<H> {
    async fn invoke(&self, arguments: Value, session: &Session) -> Result<Vec<Content>, InvocationError> {
        let params: H::Params = serde_json::from_value(arguments)
            .map_err(|err| InvocationError::invalid_arguments(None, err.to_string()))?;

        self.0
            .call(params, session)
            .await
            .map_err(InvocationError::handler)
    }
}

#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    schema: ToolSchema,
    handler: Arc<dyn ErasedHandler>,
}

impl ToolDescriptor {
    pub fn new<H: ToolHandler>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ToolSchema,
        handler: H,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            handler: Arc::new(Typed(handler)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    /// Validates `arguments` against the schema, decodes them and runs the handler.
    pub async fn call(&self, arguments: Value, session: &Session) -> Result<Vec<Content>, InvocationError> {
        self.schema.validate(&arguments)?;
        self.handler.invoke(arguments, session).await
    }

    pub fn to_tool(&self) -> Result<Tool, AppError> {
        serde_json::from_value(json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.schema.to_json_schema(),
        }))
        .map_err(|err| AppError::internal(format!("failed to describe tool {}: {err}", self.name)))
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDescriptor>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        if self.tools.contains_key(descriptor.name()) {
            return Err(RegistryError::DuplicateName(descriptor.name().to_string()));
        }

        self.order.push(descriptor.name().to_string());
        self.tools.insert(descriptor.name().to_string(), descriptor);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Registered tools in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.order.iter().filter_map(|name| self.tools.get(name))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
