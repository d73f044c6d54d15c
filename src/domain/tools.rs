//! Tools exposed via Model Context Protocol
//!
//! Provides the `add` tool, which sums two integers.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::domain::{
    content::Content,
    registry::{ToolDescriptor, ToolHandler, ToolRegistry},
    schema::{FieldKind, ToolSchema},
    session::Session,
};
use crate::errors::RegistryError;

pub const ADD_TOOL_NAME: &str = "add";
pub const LAST_SUM_KEY: &str = "last_sum";

#[derive(Debug, Deserialize)]
pub struct AddParams {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Default)]
pub struct AddTool;

#[async_trait]
impl ToolHandler for AddTool {
    type Params = AddParams;

    async fn call(&self, params: AddParams, session: &Session) -> Result<Vec<Content>, String> {
        let sum = add(params.x, params.y);
        session.set(LAST_SUM_KEY, json!(sum));
        Ok(vec![Content::text(sum.to_string())])
    }
}

/// Two's complement addition; overflow wraps instead of panicking.
pub fn add(x: i64, y: i64) -> i64 {
    x.wrapping_add(y)
}

pub fn add_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        ADD_TOOL_NAME,
        "Add two integers",
        ToolSchema::new()
            .required("x", FieldKind::Integer, "First addend")
            .required("y", FieldKind::Integer, "Second addend"),
        AddTool,
    )
}

pub fn register_builtin_tools(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(add_tool())
}

#[cfg(test)]
mod tests {
    use super::{add, add_tool, register_builtin_tools};
    use crate::domain::registry::ToolRegistry;
    use crate::errors::RegistryError;

    #[test]
    fn add_handles_signs_and_overflow() {
        assert_eq!(add(2, 3), 5);
        assert_eq!(add(-7, 7), 0);
        assert_eq!(add(-4, -6), -10);
        assert_eq!(add(i64::MAX, 1), i64::MIN);
    }

    #[test]
    fn builtin_tools_register_once() {
        let mut registry = ToolRegistry::new();
        register_builtin_tools(&mut registry).expect("first registration");

        assert_eq!(
            register_builtin_tools(&mut registry),
            Err(RegistryError::DuplicateName("add".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn add_schema_requires_both_operands() {
        let descriptor = add_tool();
        let schema = descriptor.schema().to_json_schema();
        assert_eq!(schema["required"], serde_json::json!(["x", "y"]));
        assert_eq!(schema["properties"]["y"]["type"], "integer");
    }
}
