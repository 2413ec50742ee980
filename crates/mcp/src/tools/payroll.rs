// Payroll: employees, absences and payroll documents.
//
// Every tool here belongs to the optionally licensed payroll module; the
// dispatcher checks the module once before the first call goes out.

use super::{
    create_flat_tool, delete_tool, get_tool, list_tool, update_tool, Operation, ToolEntry,
};
use bexio_core::schema::{date, limit, offset, Pattern};
use bexio_core::{FieldSchema, ObjectSchema, Resource, ToolDefinition};

/// Page listing with one optional query filter.
fn filtered_list(
    name: &'static str,
    description: &'static str,
    resource: Resource,
    filter: FieldSchema,
    filters: &'static [&'static str],
) -> ToolEntry {
    ToolEntry::new(
        ToolDefinition::new(
            name,
            description,
            ObjectSchema::new(vec![filter, limit(50), offset()]),
        )
        .read_only(),
        Operation::List { resource, filters },
    )
}

pub(crate) fn tools() -> Vec<ToolEntry> {
    vec![
        list_tool(
            "list_employees",
            "List employees (requires the payroll module)",
            Resource::Employees,
            50,
        ),
        get_tool(
            "get_employee",
            "Get a specific employee by ID (requires the payroll module)",
            Resource::Employees,
        ),
        create_flat_tool(
            "create_employee",
            "Create a new employee (requires the payroll module)",
            Resource::Employees,
            vec![
                FieldSchema::integer("user_id", "User the employee record belongs to").positive(),
                FieldSchema::string("first_name", "First name")
                    .min_len(1)
                    .optional(),
                FieldSchema::string("last_name", "Last name")
                    .min_len(1)
                    .optional(),
                FieldSchema::string("email", "Email address")
                    .pattern(Pattern::Email)
                    .optional(),
                FieldSchema::number("hourly_rate", "Hourly rate")
                    .positive()
                    .optional(),
                date("start_date", "Employment start (YYYY-MM-DD)").optional(),
                date("end_date", "Employment end (YYYY-MM-DD)").optional(),
            ],
        ),
        update_tool(
            "update_employee",
            "Update an employee (requires the payroll module)",
            Resource::Employees,
            "employee_data",
        ),
        filtered_list(
            "list_absences",
            "List absences, optionally for one year (requires the payroll module)",
            Resource::Absences,
            FieldSchema::integer("year", "Only absences in this year, e.g. 2024")
                .positive()
                .optional(),
            &["year"],
        ),
        get_tool(
            "get_absence",
            "Get a specific absence by ID (requires the payroll module)",
            Resource::Absences,
        ),
        create_flat_tool(
            "create_absence",
            "Record an absence (requires the payroll module)",
            Resource::Absences,
            vec![
                FieldSchema::integer("user_id", "Absent user").positive(),
                FieldSchema::integer("absence_type_id", "Absence type").positive(),
                date("start_date", "First day (YYYY-MM-DD)"),
                date("end_date", "Last day (YYYY-MM-DD)"),
                FieldSchema::boolean("half_day_start", "Absence starts at midday").default(false),
                FieldSchema::boolean("half_day_end", "Absence ends at midday").default(false),
                FieldSchema::string("note", "Note").optional(),
            ],
        ),
        update_tool(
            "update_absence",
            "Update an absence (requires the payroll module)",
            Resource::Absences,
            "absence_data",
        ),
        delete_tool(
            "delete_absence",
            "Delete an absence (requires the payroll module)",
            Resource::Absences,
        ),
        filtered_list(
            "list_payroll_documents",
            "List payroll documents, optionally for one employee (requires the payroll module)",
            Resource::PayrollDocuments,
            FieldSchema::integer("employee_id", "Only documents of this employee")
                .positive()
                .optional(),
            &["employee_id"],
        ),
    ]
}
