//! Tool registry, dispatch and per-client sessions
//!
//! Transport independent: the MCP layer feeds requests in and renders results out.

pub mod content;
pub mod dispatcher;
pub mod registry;
pub mod schema;
pub mod session;
pub mod tools;
