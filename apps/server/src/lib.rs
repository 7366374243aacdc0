//! Finnhub MCP server library
//!
//! Wires the core market data service to an MCP stdio session:
//! - `protocol` - JSON-RPC 2.0 wire types
//! - `server` - read loop, writer task, and notification plumbing
//! - `tools` - tool definitions and dispatch onto the service

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::{McpServer, SERVER_NAME};
