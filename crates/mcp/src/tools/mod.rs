// Tool catalog: one module per Bexio domain

mod banking;
mod contacts;
pub mod dispatch;
mod files;
mod invoices;
mod items;
mod payroll;
mod projects;
mod purchase;
pub mod registry;
mod reports;
mod users;

pub use dispatch::Dispatcher;
pub use registry::{Body, Operation, RegistryError, Rules, ToolEntry, ToolRegistry};

use bexio_core::schema::{chunk_size, data, id, limit, offset};
use bexio_core::{Action, FieldSchema, ObjectSchema, Resource, ToolDefinition};

/// Every tool in catalog order.
pub fn catalog() -> Vec<ToolEntry> {
    let mut tools = Vec::new();
    tools.extend(contacts::tools());
    tools.extend(invoices::tools());
    tools.extend(items::tools());
    tools.extend(users::tools());
    tools.extend(projects::tools());
    tools.extend(purchase::tools());
    tools.extend(banking::tools());
    tools.extend(payroll::tools());
    tools.extend(files::tools());
    tools.extend(reports::tools());
    tools
}

/// The full registry, failing on duplicate names.
pub fn registry() -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::from_entries(catalog())
}

fn id_description(resource: Resource) -> &'static str {
    match resource {
        Resource::Contacts => "The contact ID",
        Resource::Invoices => "The invoice ID",
        Resource::Items => "The item ID",
        Resource::Taxes => "The tax ID",
        Resource::FictionalUsers => "The fictional user ID",
        Resource::Projects => "The project ID",
        Resource::ProjectTypes => "The project type ID",
        Resource::ProjectStatuses => "The project status ID",
        Resource::Milestones => "The milestone ID",
        Resource::WorkPackages => "The work package ID",
        Resource::Bills => "The bill ID",
        Resource::Expenses => "The expense ID",
        Resource::BankAccounts => "The bank account ID",
        Resource::Currencies => "The currency ID",
        Resource::IbanPayments | Resource::QrPayments => "The payment ID",
        Resource::Employees => "The employee ID",
        Resource::Absences => "The absence ID",
        Resource::PayrollDocuments => "The payroll document ID",
        Resource::Files => "The file ID",
        Resource::AdditionalAddresses => "The additional address ID",
    }
}

/// Parent identifier field for nested resources.
fn parent_fields(resource: Resource) -> Vec<FieldSchema> {
    match resource.parent_field() {
        Some("project_id") => vec![id("project_id", "The parent project ID")],
        Some("contact_id") => vec![id("contact_id", "The contact the record belongs to")],
        _ => Vec::new(),
    }
}

fn identified(resource: Resource) -> Vec<FieldSchema> {
    let mut fields = parent_fields(resource);
    fields.push(id(resource.id_field(), id_description(resource)));
    fields
}

pub(crate) fn list_tool(
    name: &'static str,
    description: &'static str,
    resource: Resource,
    default_limit: u32,
) -> ToolEntry {
    let mut fields = parent_fields(resource);
    fields.extend([limit(default_limit), offset()]);
    ToolEntry::new(
        ToolDefinition::new(name, description, ObjectSchema::new(fields)).read_only(),
        Operation::list(resource),
    )
}

pub(crate) fn list_all_tool(name: &'static str, description: &'static str, resource: Resource) -> ToolEntry {
    let mut fields = parent_fields(resource);
    fields.push(chunk_size());
    ToolEntry::new(
        ToolDefinition::new(name, description, ObjectSchema::new(fields)).read_only(),
        Operation::ListAll(resource),
    )
}

pub(crate) fn get_tool(name: &'static str, description: &'static str, resource: Resource) -> ToolEntry {
    ToolEntry::new(
        ToolDefinition::new(name, description, ObjectSchema::new(identified(resource))).read_only(),
        Operation::Get(resource),
    )
}

/// Create from a free-form object under `data_field`.
pub(crate) fn create_tool(
    name: &'static str,
    description: &'static str,
    resource: Resource,
    data_field: &'static str,
    data_description: &'static str,
) -> ToolEntry {
    let mut fields = parent_fields(resource);
    fields.push(data(data_field, data_description));
    ToolEntry::new(
        ToolDefinition::new(name, description, ObjectSchema::new(fields)),
        Operation::Create(resource, Body::Field(data_field)),
    )
}

/// Create from explicitly declared fields, sent as-is.
pub(crate) fn create_flat_tool(
    name: &'static str,
    description: &'static str,
    resource: Resource,
    declared: Vec<FieldSchema>,
) -> ToolEntry {
    let mut fields = parent_fields(resource);
    fields.extend(declared);
    ToolEntry::new(
        ToolDefinition::new(name, description, ObjectSchema::new(fields)),
        Operation::Create(resource, Body::Params),
    )
}

pub(crate) fn update_tool(
    name: &'static str,
    description: &'static str,
    resource: Resource,
    data_field: &'static str,
) -> ToolEntry {
    let mut fields = identified(resource);
    fields.push(data(data_field, "Fields to change"));
    ToolEntry::new(
        ToolDefinition::new(name, description, ObjectSchema::new(fields)),
        Operation::Update(resource, Body::Field(data_field)),
    )
}

pub(crate) fn delete_tool(name: &'static str, description: &'static str, resource: Resource) -> ToolEntry {
    ToolEntry::new(
        ToolDefinition::new(name, description, ObjectSchema::new(identified(resource))).destructive(),
        Operation::Delete(resource),
    )
}

/// Identifier-only state transition. Irreversible ones are marked destructive.
pub(crate) fn action_tool(
    name: &'static str,
    description: &'static str,
    resource: Resource,
    action: Action,
) -> ToolEntry {
    let definition = ToolDefinition::new(name, description, ObjectSchema::new(identified(resource)));
    let definition = match action {
        Action::Issue | Action::Cancel | Action::MarkAsSent | Action::Send | Action::MarkAsPaid => {
            definition.destructive()
        }
        Action::Archive | Action::Unarchive | Action::Copy => definition,
    };
    ToolEntry::new(definition, Operation::Act(resource, action))
}

/// `{field, value, criteria}` items of a search request.
pub(crate) fn criteria_field(name: &'static str) -> FieldSchema {
    FieldSchema::array(
        name,
        "Search conditions; all must match",
        FieldSchema::object(
            "",
            "One search condition",
            ObjectSchema::new(vec![
                FieldSchema::string("field", "Field to compare").min_len(1),
                FieldSchema::scalar("value", "Value to compare against"),
                FieldSchema::string("criteria", "Comparison operator (=, !=, >, <, like, not_like, is_null, ...)")
                    .default("="),
            ]),
        ),
    )
}

pub(crate) fn search_tool(
    name: &'static str,
    description: &'static str,
    resource: Resource,
    criteria: &'static str,
) -> ToolEntry {
    let schema = ObjectSchema::new(vec![
        criteria_field(criteria),
        FieldSchema::integer("limit", "Maximum number of results")
            .positive()
            .max(2000.0)
            .optional(),
        FieldSchema::integer("offset", "Number of results to skip")
            .non_negative()
            .optional(),
    ]);
    ToolEntry::new(
        ToolDefinition::new(name, description, schema).read_only(),
        Operation::Search(resource, criteria),
    )
}
