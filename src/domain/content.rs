//! Tool result content items

use rust_mcp_sdk::schema::{ContentBlock, TextContent};
use serde_json::json;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Base64 payload plus its MIME type.
    Image { data: String, mime_type: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Image { .. } => None,
        }
    }

    pub fn to_content_block(&self) -> Result<ContentBlock, AppError> {
        match self {
            Self::Text(text) => Ok(ContentBlock::from(TextContent::new(
                text.clone(),
                None,
                None,
            ))),
            Self::Image { data, mime_type } => serde_json::from_value(json!({
                "type": "image",
                "data": data,
                "mimeType": mime_type,
            }))
            .map_err(|err| AppError::internal(format!("failed to build image content: {err}"))),
        }
    }
}
