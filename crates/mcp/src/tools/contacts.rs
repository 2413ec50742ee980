// Contacts (customers, suppliers and people)

use super::{get_tool, list_all_tool, list_tool, search_tool, ToolEntry};
use bexio_core::Resource;

pub(crate) fn tools() -> Vec<ToolEntry> {
    vec![
        list_tool(
            "list_contacts",
            "List contacts with optional pagination",
            Resource::Contacts,
            50,
        ),
        list_all_tool(
            "list_all_contacts",
            "List every contact by paging automatically",
            Resource::Contacts,
        ),
        get_tool("get_contact", "Get a specific contact by ID", Resource::Contacts),
        search_tool(
            "search_contacts",
            "Search contacts by field conditions (e.g. name_1 like 'Muster')",
            Resource::Contacts,
            "search_criteria",
        ),
    ]
}
