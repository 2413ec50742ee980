// Projects with their types, statuses, milestones and work packages

use super::{
    action_tool, create_flat_tool, delete_tool, get_tool, list_all_tool, list_tool, search_tool,
    update_tool, ToolEntry,
};
use bexio_core::schema::{date, Pattern};
use bexio_core::{Action, FieldSchema, Resource};

pub(crate) fn tools() -> Vec<ToolEntry> {
    vec![
        list_tool(
            "list_projects",
            "List projects with optional pagination",
            Resource::Projects,
            100,
        ),
        list_all_tool(
            "list_all_projects",
            "List every project by paging automatically",
            Resource::Projects,
        ),
        get_tool("get_project", "Get a specific project by ID", Resource::Projects),
        create_flat_tool(
            "create_project",
            "Create a new project",
            Resource::Projects,
            vec![
                FieldSchema::integer("user_id", "Responsible user ID").positive(),
                FieldSchema::string("name", "Project name").min_len(1),
                FieldSchema::integer("contact_id", "Customer contact ID")
                    .positive()
                    .optional(),
                FieldSchema::integer("pr_state_id", "Project status ID")
                    .positive()
                    .optional(),
                FieldSchema::integer("pr_project_type_id", "Project type ID")
                    .positive()
                    .optional(),
                date("start_date", "Start date (YYYY-MM-DD)").optional(),
                date("end_date", "End date (YYYY-MM-DD)").optional(),
                FieldSchema::string("comment", "Free-text comment").optional(),
            ],
        ),
        update_tool(
            "update_project",
            "Update an existing project",
            Resource::Projects,
            "project_data",
        ),
        delete_tool("delete_project", "Delete a project", Resource::Projects),
        action_tool(
            "archive_project",
            "Archive a project",
            Resource::Projects,
            Action::Archive,
        ),
        action_tool(
            "unarchive_project",
            "Reactivate an archived project",
            Resource::Projects,
            Action::Unarchive,
        ),
        search_tool(
            "search_projects",
            "Search projects by criteria",
            Resource::Projects,
            "search_criteria",
        ),
        list_tool(
            "list_project_types",
            "List project types",
            Resource::ProjectTypes,
            100,
        ),
        get_tool(
            "get_project_type",
            "Get a specific project type by ID",
            Resource::ProjectTypes,
        ),
        list_tool(
            "list_project_statuses",
            "List project statuses",
            Resource::ProjectStatuses,
            100,
        ),
        get_tool(
            "get_project_status",
            "Get a specific project status by ID",
            Resource::ProjectStatuses,
        ),
        list_tool(
            "list_milestones",
            "List the milestones of a project",
            Resource::Milestones,
            100,
        ),
        get_tool(
            "get_milestone",
            "Get a specific milestone of a project",
            Resource::Milestones,
        ),
        create_flat_tool(
            "create_milestone",
            "Create a milestone in a project",
            Resource::Milestones,
            vec![
                FieldSchema::string("name", "Milestone name").min_len(1),
                date("end_date", "Due date (YYYY-MM-DD)").optional(),
            ],
        ),
        delete_tool(
            "delete_milestone",
            "Delete a milestone from a project",
            Resource::Milestones,
        ),
        list_tool(
            "list_work_packages",
            "List the work packages of a project",
            Resource::WorkPackages,
            100,
        ),
        get_tool(
            "get_work_package",
            "Get a specific work package of a project",
            Resource::WorkPackages,
        ),
        create_flat_tool(
            "create_work_package",
            "Create a work package in a project",
            Resource::WorkPackages,
            vec![
                FieldSchema::string("name", "Work package name").min_len(1),
                FieldSchema::string("estimated_time", "Estimated effort (HH:MM)")
                    .pattern(Pattern::HourMinute)
                    .optional(),
            ],
        ),
        update_tool(
            "update_work_package",
            "Update a work package",
            Resource::WorkPackages,
            "workpackage_data",
        ),
        delete_tool(
            "delete_work_package",
            "Delete a work package from a project",
            Resource::WorkPackages,
        ),
    ]
}
