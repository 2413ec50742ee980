// Account users and fictional users

use super::{create_tool, delete_tool, get_tool, list_tool, update_tool, Operation, ToolEntry};
use bexio_core::{BexioApi, ObjectSchema, Resource, ToolDefinition, ToolResult, ValidatedParams};
use futures::future::BoxFuture;
use serde_json::Value;

fn current_user(api: &dyn BexioApi, _params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move { Ok(api.current_user().await?) })
}

pub(crate) fn tools() -> Vec<ToolEntry> {
    vec![
        ToolEntry::new(
            ToolDefinition::new(
                "get_current_user",
                "Get the currently authenticated user",
                ObjectSchema::empty(),
            )
            .read_only(),
            Operation::Custom(current_user),
        ),
        list_tool(
            "list_fictional_users",
            "List fictional users with optional pagination",
            Resource::FictionalUsers,
            50,
        ),
        get_tool(
            "get_fictional_user",
            "Get a specific fictional user by ID",
            Resource::FictionalUsers,
        ),
        create_tool(
            "create_fictional_user",
            "Create a new fictional user",
            Resource::FictionalUsers,
            "user_data",
            "User data to create",
        ),
        update_tool(
            "update_fictional_user",
            "Update a fictional user",
            Resource::FictionalUsers,
            "user_data",
        ),
        delete_tool(
            "delete_fictional_user",
            "Delete a fictional user",
            Resource::FictionalUsers,
        ),
    ]
}
