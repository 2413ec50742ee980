// Tool registry: the immutable catalog of tool entries keyed by name

use bexio_core::payment::PaymentVariant;
use bexio_core::{Action, BexioApi, Module, Resource, ToolDefinition, ToolResult, ValidatedParams};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;

/// Hand-written handler for tools that don't fit a generic shape.
pub type Handler = for<'a> fn(&'a dyn BexioApi, ValidatedParams) -> BoxFuture<'a, ToolResult<Value>>;

/// Which validation pipeline a tool's arguments go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rules {
    Generic,
    Payment(PaymentVariant),
}

/// Where a create/update request body comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Body {
    /// The object stored under this argument.
    Field(&'static str),
    /// Every validated argument except the identifiers.
    Params,
}

/// What a tool does once its arguments are valid.
#[derive(Clone, Copy)]
pub enum Operation {
    /// One page; the listed arguments are forwarded as query filters.
    List {
        resource: Resource,
        filters: &'static [&'static str],
    },
    ListAll(Resource),
    Get(Resource),
    Create(Resource, Body),
    Update(Resource, Body),
    Delete(Resource),
    /// Criteria are read from the named array argument.
    Search(Resource, &'static str),
    Act(Resource, Action),
    Custom(Handler),
}

impl Operation {
    pub const fn list(resource: Resource) -> Self {
        Self::List {
            resource,
            filters: &[],
        }
    }

    pub fn resource(&self) -> Option<Resource> {
        match *self {
            Self::List { resource, .. } => Some(resource),
            Self::ListAll(r)
            | Self::Get(r)
            | Self::Create(r, _)
            | Self::Update(r, _)
            | Self::Delete(r)
            | Self::Search(r, _)
            | Self::Act(r, _) => Some(r),
            Self::Custom(_) => None,
        }
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List { resource, filters } => f
                .debug_struct("List")
                .field("resource", resource)
                .field("filters", filters)
                .finish(),
            Self::ListAll(r) => f.debug_tuple("ListAll").field(r).finish(),
            Self::Get(r) => f.debug_tuple("Get").field(r).finish(),
            Self::Create(r, b) => f.debug_tuple("Create").field(r).field(b).finish(),
            Self::Update(r, b) => f.debug_tuple("Update").field(r).field(b).finish(),
            Self::Delete(r) => f.debug_tuple("Delete").field(r).finish(),
            Self::Search(r, field) => f.debug_tuple("Search").field(r).field(field).finish(),
            Self::Act(r, a) => f.debug_tuple("Act").field(r).field(a).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// One catalog entry: metadata, validation rules and the bound operation.
#[derive(Debug, Clone)]
pub struct ToolEntry {
    pub definition: ToolDefinition,
    pub rules: Rules,
    pub operation: Operation,
    /// Licensed module the tool needs, beyond what its resource implies.
    pub module: Option<Module>,
}

impl ToolEntry {
    pub fn new(definition: ToolDefinition, operation: Operation) -> Self {
        Self {
            definition,
            rules: Rules::Generic,
            operation,
            module: None,
        }
    }

    pub fn payment(definition: ToolDefinition, variant: PaymentVariant, operation: Operation) -> Self {
        Self {
            rules: Rules::Payment(variant),
            ..Self::new(definition, operation)
        }
    }

    pub fn requires(mut self, module: Module) -> Self {
        self.module = Some(module);
        self
    }

    pub fn name(&self) -> &'static str {
        self.definition.name
    }

    /// Gate to pass before running, if any.
    pub fn gated_module(&self) -> Option<Module> {
        self.module
            .or_else(|| self.operation.resource().and_then(Resource::module))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),
}

/// Tool registry built once at startup
#[derive(Debug)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    /// Build from catalog order, rejecting name collisions.
    pub fn from_entries(entries: Vec<ToolEntry>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.name(), position).is_some() {
                return Err(RegistryError::DuplicateTool(entry.name().to_string()));
            }
        }
        Ok(Self { entries, index })
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// All entries in catalog order
    pub fn entries(&self) -> &[ToolEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bexio_core::schema::id;
    use bexio_core::ObjectSchema;

    fn get_contact() -> ToolEntry {
        ToolEntry::new(
            ToolDefinition::new(
                "get_contact",
                "Get a contact",
                ObjectSchema::new(vec![id("contact_id", "Contact ID")]),
            )
            .read_only(),
            Operation::Get(Resource::Contacts),
        )
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let err = ToolRegistry::from_entries(vec![get_contact(), get_contact()]).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateTool("get_contact".to_string()));
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = ToolRegistry::from_entries(vec![get_contact()]).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("get_contact"));
        assert!(registry.get("get_invoice").is_none());
        assert!(matches!(
            registry.get("get_contact").map(|e| e.operation),
            Some(Operation::Get(Resource::Contacts))
        ));
    }

    #[test]
    fn test_gated_module_follows_resource() {
        let entry = ToolEntry::new(
            ToolDefinition::new("list_employees", "List employees", ObjectSchema::empty()),
            Operation::list(Resource::Employees),
        );
        assert_eq!(entry.gated_module(), Some(Module::Payroll));
        assert_eq!(get_contact().gated_module(), None);
    }
}
