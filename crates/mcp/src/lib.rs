// MCP server exposing the Bexio API as validated tools

pub mod config;
pub mod protocol;
pub mod server;
pub mod tools;

#[cfg(test)]
mod mock;

pub use config::McpConfig;
pub use server::McpServer;
pub use tools::{registry, Dispatcher, ToolRegistry};
