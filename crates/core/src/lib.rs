//! Tool validation and dispatch primitives for the Bexio MCP server.
//!
//! This crate holds everything with actual decisions in it: declarative
//! schemas, argument validation, Swiss payment rules, pagination
//! aggregation, licensed-module gates and the caller-facing error taxonomy.
//! Transport lives in `bexio-sdk`, the tool catalog in `bexio-mcp`.

pub mod api;
pub mod error;
pub mod gate;
pub mod pagination;
pub mod payment;
pub mod schema;
pub mod validation;

pub use api::{Action, BexioApi, Endpoint, FileDownload, FileUpload, Resource, SearchCriterion};
pub use error::{
    ErrorEnvelope, ErrorKind, RemoteError, Rule, ToolError, ToolResult, ValidationError, Violation,
};
pub use gate::{Module, ModuleGate, ModuleGates};
pub use pagination::{collect_all, PageRequest};
pub use payment::{validate_payment, PaymentInstruction, PaymentVariant};
pub use schema::{FieldSchema, ObjectSchema, Safety, ToolDefinition};
pub use validation::{validate, ValidatedParams};
