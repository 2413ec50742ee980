//! Caller-facing error taxonomy.
//!
//! Every failure produced while dispatching a tool ends up as one [`ToolError`]
//! variant. The variant decides the stable [`ErrorKind`] reported to the caller;
//! [`ToolError::envelope`] renders the structured form sent over the wire.

use crate::gate::Module;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for tool handlers.
pub type ToolResult<T> = Result<T, ToolError>;

/// Stable error classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    ModuleUnavailable,
    RemoteFailure,
    UnknownTool,
}

/// The rule a field violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Missing,
    WrongType,
    Minimum,
    ExclusiveMinimum,
    Maximum,
    MinLength,
    MaxLength,
    Length,
    Pattern,
    Enum,
    Format,
    CalendarDate,
    VariantMismatch,
    Checksum,
}

/// A single field-level complaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field_path: String,
    pub rule: Rule,
    pub message: String,
}

impl Violation {
    pub fn new(field_path: impl Into<String>, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
            rule,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field_path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field_path, self.message)
        }
    }
}

/// Every violation found in one argument bag.
#[derive(Debug, Clone, PartialEq, Eq, Default, thiserror::Error)]
#[error("Invalid arguments{}", list_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    /// True if any violation is reported for `field_path`.
    pub fn has(&self, field_path: &str, rule: Rule) -> bool {
        self.violations
            .iter()
            .any(|v| v.field_path == field_path && v.rule == rule)
    }
}

fn list_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .enumerate()
        .map(|(i, violation)| format!("{}{}", if i == 0 { ": " } else { "; " }, violation))
        .collect()
}

/// Failure reported by the remote client collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
    /// HTTP status when the remote service answered at all.
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

/// Error returned from dispatching a tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    Validation(ValidationError),

    #[error("{entity} with ID {id} not found")]
    NotFound { entity: String, id: String },

    #[error("The {} module is not available: {hint}", module.display_name())]
    ModuleUnavailable { module: Module, hint: String },

    #[error("Remote service error: {0}")]
    Remote(RemoteError),

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },
}

impl ToolError {
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn module_unavailable(module: Module) -> Self {
        Self::ModuleUnavailable {
            module,
            hint: module.upgrade_hint().to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ModuleUnavailable { .. } => ErrorKind::ModuleUnavailable,
            Self::Remote(_) => ErrorKind::RemoteFailure,
            Self::UnknownTool { .. } => ErrorKind::UnknownTool,
        }
    }

    /// Structured rendering for the caller.
    pub fn envelope(&self) -> ErrorEnvelope {
        let mut envelope = ErrorEnvelope {
            kind: self.kind(),
            message: self.to_string(),
            entity: None,
            id: None,
            module: None,
            violations: None,
        };
        match self {
            Self::Validation(err) => envelope.violations = Some(err.violations.clone()),
            Self::NotFound { entity, id } => {
                envelope.entity = Some(entity.clone());
                envelope.id = Some(id.clone());
            }
            Self::ModuleUnavailable { module, .. } => {
                envelope.module = Some(module.name().to_string());
            }
            // The remote message is kept; its status and body structure are not.
            Self::Remote(_) | Self::UnknownTool { .. } => {}
        }
        envelope
    }
}

impl From<ValidationError> for ToolError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<RemoteError> for ToolError {
    fn from(err: RemoteError) -> Self {
        Self::Remote(err)
    }
}

/// Wire form of a [`ToolError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_envelope() {
        let err = ToolError::not_found("Invoice", 42);
        let envelope = err.envelope();

        assert_eq!(envelope.kind, ErrorKind::NotFound);
        assert_eq!(envelope.entity.as_deref(), Some("Invoice"));
        assert_eq!(envelope.id.as_deref(), Some("42"));
        assert_eq!(envelope.message, "Invoice with ID 42 not found");
    }

    #[test]
    fn test_validation_envelope_lists_every_violation() {
        let err: ToolError = ValidationError::new(vec![
            Violation::new("invoice_id", Rule::Missing, "is required"),
            Violation::new("limit", Rule::Minimum, "must be at least 1"),
        ])
        .into();

        let json = serde_json::to_value(err.envelope()).unwrap();
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["violations"].as_array().unwrap().len(), 2);
        assert_eq!(json["violations"][0]["rule"], "missing");
        assert_eq!(json["violations"][1]["field_path"], "limit");
        assert!(json.get("entity").is_none());
    }

    #[test]
    fn test_remote_failure_keeps_message_only() {
        let err: ToolError = RemoteError::new(Some(422), "Field 'title' is invalid").into();
        let envelope = err.envelope();

        assert_eq!(envelope.kind, ErrorKind::RemoteFailure);
        assert!(envelope.message.contains("Field 'title' is invalid"));
        assert!(!envelope.message.contains("422"));
    }

    #[test]
    fn test_module_unavailable_envelope() {
        let envelope = ToolError::module_unavailable(Module::Payroll).envelope();

        assert_eq!(envelope.kind, ErrorKind::ModuleUnavailable);
        assert_eq!(envelope.module.as_deref(), Some("payroll"));
        assert!(envelope.message.contains("Payroll"));
    }

    #[test]
    fn test_validation_display() {
        let err = ValidationError::new(vec![
            Violation::new("a", Rule::Missing, "is required"),
            Violation::new("b", Rule::WrongType, "expected integer"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid arguments: a: is required; b: expected integer"
        );
    }
}
