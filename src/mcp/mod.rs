//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Decodes JSON-RPC envelopes, negotiates the protocol version and hands
//! `tools/call` requests to the tool dispatcher.

pub mod rpc;
pub mod server;
