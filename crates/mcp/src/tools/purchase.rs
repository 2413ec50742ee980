// Purchase: supplier bills and expenses

use super::{
    action_tool, create_tool, delete_tool, get_tool, list_tool, search_tool, update_tool, ToolEntry,
};
use bexio_core::{Action, Resource};

fn bills() -> Vec<ToolEntry> {
    vec![
        list_tool("list_bills", "List supplier bills with optional pagination", Resource::Bills, 50),
        get_tool("get_bill", "Get a specific bill by ID", Resource::Bills),
        create_tool(
            "create_bill",
            "Create a new supplier bill",
            Resource::Bills,
            "bill_data",
            "Bill fields (supplier_id, contact_partner_id, bill_date, due_date, line_items, ...)",
        ),
        update_tool("update_bill", "Update an existing bill", Resource::Bills, "bill_data"),
        delete_tool("delete_bill", "Delete a bill", Resource::Bills),
        search_tool("search_bills", "Search bills by criteria", Resource::Bills, "criteria"),
        action_tool("issue_bill", "Issue a draft bill", Resource::Bills, Action::Issue),
        action_tool(
            "mark_bill_as_paid",
            "Mark a bill as paid",
            Resource::Bills,
            Action::MarkAsPaid,
        ),
    ]
}

fn expenses() -> Vec<ToolEntry> {
    vec![
        list_tool(
            "list_expenses",
            "List expenses with optional pagination",
            Resource::Expenses,
            50,
        ),
        get_tool("get_expense", "Get a specific expense by ID", Resource::Expenses),
        create_tool(
            "create_expense",
            "Create a new expense",
            Resource::Expenses,
            "expense_data",
            "Expense fields (paid_on, currency_code, amount, ...)",
        ),
        update_tool(
            "update_expense",
            "Update an existing expense",
            Resource::Expenses,
            "expense_data",
        ),
        delete_tool("delete_expense", "Delete an expense", Resource::Expenses),
    ]
}

pub(crate) fn tools() -> Vec<ToolEntry> {
    let mut tools = bills();
    tools.extend(expenses());
    tools
}

#[cfg(test)]
mod tests {
    use crate::mock::MockApi;
    use crate::tools::{registry, Dispatcher};
    use bexio_core::{ErrorKind, Resource, SearchCriterion};
    use serde_json::json;
    use std::sync::Arc;

    fn dispatcher(api: MockApi) -> (Dispatcher, Arc<MockApi>) {
        let api = Arc::new(api);
        (Dispatcher::new(registry().unwrap(), api.clone()), api)
    }

    fn bills() -> MockApi {
        MockApi::new().with_records(
            Resource::Bills,
            vec![
                json!({"id": 1, "supplier_id": 4, "status": "DRAFT"}),
                json!({"id": 2, "supplier_id": 5, "status": "BOOKED"}),
            ],
        )
    }

    #[tokio::test]
    async fn test_search_bills_uses_criteria_argument() {
        let (dispatcher, api) = dispatcher(bills());

        let result = dispatcher
            .dispatch(
                "search_bills",
                Some(&json!({"criteria": [{"field": "supplier_id", "value": 5}], "limit": 10})),
            )
            .await
            .unwrap();

        assert_eq!(result, json!([{"id": 2, "supplier_id": 5, "status": "BOOKED"}]));
        let call = api.last_call().unwrap();
        assert_eq!(call.criteria, vec![SearchCriterion::new("supplier_id", "=", 5)]);
        assert_eq!(call.page.unwrap().limit, 10);
    }

    #[tokio::test]
    async fn test_mark_bill_as_paid() {
        let (dispatcher, api) = dispatcher(bills());

        let result = dispatcher
            .dispatch("mark_bill_as_paid", Some(&json!({"bill_id": 2})))
            .await
            .unwrap();

        assert_eq!(result["success"], true);
        let call = api.last_call().unwrap();
        assert_eq!(call.method, "mark_as_paid");
        assert_eq!(call.id, Some(2));
    }

    #[tokio::test]
    async fn test_create_expense_requires_data_object() {
        let (dispatcher, api) = dispatcher(MockApi::new());

        let err = dispatcher
            .dispatch("create_expense", Some(&json!({"expense_data": "taxi"})))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(api.calls().is_empty());
    }
}
