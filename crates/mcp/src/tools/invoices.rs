// Invoices: CRUD, lifecycle actions, search and status reference data

use super::{
    action_tool, create_tool, delete_tool, get_tool, list_all_tool, list_tool, Operation, ToolEntry,
};
use bexio_core::schema::limit;
use bexio_core::{
    collect_all, Action, BexioApi, Endpoint, FieldSchema, ObjectSchema, Resource, Rule,
    SearchCriterion, ToolDefinition, ToolError, ToolResult, ValidatedParams, ValidationError,
    Violation,
};
use chrono::{Local, NaiveDate};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{json, Value};

/// Page size used when a handler needs the whole invoice collection.
pub(crate) const AGGREGATION_CHUNK: u64 = 100;

pub(crate) const STATUS_DRAFT: u64 = 7;
pub(crate) const STATUS_PENDING: u64 = 8;
pub(crate) const STATUS_PAID: u64 = 9;
pub(crate) const STATUS_PARTIAL: u64 = 16;
pub(crate) const STATUS_CANCELLED: u64 = 19;
pub(crate) const STATUS_UNPAID: u64 = 31;

#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct DocumentStatus {
    pub id: u64,
    pub name: &'static str,
    pub description: &'static str,
}

const fn status(id: u64, name: &'static str, description: &'static str) -> DocumentStatus {
    DocumentStatus {
        id,
        name,
        description,
    }
}

pub(crate) const INVOICE_STATUSES: &[DocumentStatus] = &[
    status(STATUS_DRAFT, "Draft", "Not yet issued; can still be edited or deleted"),
    status(STATUS_PENDING, "Pending", "Issued and awaiting payment"),
    status(STATUS_PAID, "Paid", "Fully paid"),
    status(STATUS_PARTIAL, "Partial", "Partially paid"),
    status(STATUS_CANCELLED, "Cancelled", "Cancelled; no payment expected"),
    status(STATUS_UNPAID, "Unpaid", "Issued and past the payment reminder stage"),
];

const QUOTE_STATUSES: &[DocumentStatus] = &[
    status(1, "Draft", "Not yet sent"),
    status(2, "Pending", "Sent and awaiting a decision"),
    status(3, "Confirmed", "Accepted by the customer"),
    status(4, "Declined", "Rejected by the customer"),
];

const ORDER_STATUSES: &[DocumentStatus] = &[
    status(5, "Pending", "Open order"),
    status(6, "Done", "Completed order"),
    status(15, "Partial", "Partially delivered or invoiced"),
    status(21, "Cancelled", "Cancelled order"),
];

pub(crate) fn status_name(id: u64) -> &'static str {
    INVOICE_STATUSES
        .iter()
        .find(|s| s.id == id)
        .map(|s| s.name)
        .unwrap_or("Unknown")
}

/// Draft or issued-but-unpaid.
pub(crate) fn is_open(invoice: &Value) -> bool {
    matches!(
        invoice["kb_item_status_id"].as_u64(),
        Some(STATUS_DRAFT | STATUS_PENDING)
    )
}

/// Calendar date of a Bexio date or datetime field.
pub(crate) fn date_field(invoice: &Value, field: &str) -> Option<NaiveDate> {
    let raw = invoice[field].as_str()?;
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

/// Open invoices whose due date lies before `today`.
pub(crate) fn overdue(invoices: Vec<Value>, today: NaiveDate) -> Vec<Value> {
    invoices
        .into_iter()
        .filter(|invoice| {
            is_open(invoice) && date_field(invoice, "is_valid_to").is_some_and(|due| due < today)
        })
        .collect()
}

pub(crate) async fn all_invoices(api: &dyn BexioApi) -> ToolResult<Vec<Value>> {
    let endpoint = Endpoint::of(Resource::Invoices);
    Ok(collect_all(AGGREGATION_CHUNK, |page| api.list(&endpoint, page)).await?)
}

fn search_invoices(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let mut criteria = filter_criteria(&params);
        if let Some(query) = params.str("query") {
            let field = params.str("field").unwrap_or("title");
            let operator = params.str("operator").unwrap_or("like");
            criteria.push(SearchCriterion::new(field, operator, query));
        }
        if criteria.is_empty() {
            return Err(ValidationError::single(Violation::new(
                "query",
                Rule::Missing,
                "provide a query or at least one filter",
            ))
            .into());
        }

        let items = api
            .search(&Endpoint::of(Resource::Invoices), &criteria, params.u64("limit"), None)
            .await?;
        Ok(Value::Array(items))
    })
}

/// `filters[]` items use `operator` where the remote search calls it `criteria`.
fn filter_criteria(params: &ValidatedParams) -> Vec<SearchCriterion> {
    params
        .get("filters")
        .and_then(Value::as_array)
        .map(|filters| {
            filters
                .iter()
                .map(|f| {
                    SearchCriterion::new(
                        f["field"].as_str().unwrap_or_default(),
                        f["operator"].as_str().unwrap_or("="),
                        f["value"].clone(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

fn search_by_customer(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let name = params.str("customer_name").unwrap_or_default().to_string();

        let contacts = api
            .search(
                &Endpoint::of(Resource::Contacts),
                &[SearchCriterion::new("name_1", "like", name.as_str())],
                Some(1),
                None,
            )
            .await?;
        let contact = contacts
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::not_found("Customer", &name))?;
        let contact_id = contact["id"]
            .as_u64()
            .ok_or_else(|| ToolError::not_found("Customer", &name))?;

        let invoices = api
            .search(
                &Endpoint::of(Resource::Invoices),
                &[SearchCriterion::new("contact_id", "=", contact_id)],
                params.u64("limit"),
                None,
            )
            .await?;

        Ok(json!({
            "contact": contact,
            "invoice_count": invoices.len(),
            "invoices": invoices,
        }))
    })
}

fn list_invoice_statuses(_api: &dyn BexioApi, _params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move { Ok(json!(INVOICE_STATUSES)) })
}

fn list_all_statuses(_api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let document_type = params.str("document_type").unwrap_or("all");
        let mut out = serde_json::Map::new();
        if matches!(document_type, "all" | "invoices") {
            out.insert("invoices".into(), json!(INVOICE_STATUSES));
        }
        if matches!(document_type, "all" | "quotes") {
            out.insert("quotes".into(), json!(QUOTE_STATUSES));
        }
        if matches!(document_type, "all" | "orders") {
            out.insert("orders".into(), json!(ORDER_STATUSES));
        }
        Ok(Value::Object(out))
    })
}

fn open_invoices(api: &dyn BexioApi, _params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let open: Vec<Value> = all_invoices(api).await?.into_iter().filter(is_open).collect();
        Ok(Value::Array(open))
    })
}

fn overdue_invoices(api: &dyn BexioApi, _params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let today = Local::now().date_naive();
        Ok(Value::Array(overdue(all_invoices(api).await?, today)))
    })
}

fn search_schema() -> ObjectSchema {
    ObjectSchema::new(vec![
        FieldSchema::string("query", "Value to match").optional(),
        FieldSchema::string("field", "Field the query is matched against").default("title"),
        FieldSchema::string("operator", "Comparison operator for the query (like, =, >, ...)")
            .default("like"),
        FieldSchema::array(
            "filters",
            "Explicit search conditions",
            FieldSchema::object(
                "",
                "One condition",
                ObjectSchema::new(vec![
                    FieldSchema::string("field", "Field to compare").min_len(1),
                    FieldSchema::string("operator", "Comparison operator").default("="),
                    FieldSchema::scalar("value", "Value to compare against"),
                ]),
            ),
        )
        .optional(),
        FieldSchema::integer("limit", "Maximum results")
            .positive()
            .max(2000.0)
            .optional(),
    ])
}

pub(crate) fn tools() -> Vec<ToolEntry> {
    vec![
        list_tool(
            "list_invoices",
            "List invoices with optional pagination",
            Resource::Invoices,
            50,
        ),
        list_all_tool(
            "list_all_invoices",
            "List every invoice by paging automatically",
            Resource::Invoices,
        ),
        get_tool("get_invoice", "Get a specific invoice by ID", Resource::Invoices),
        ToolEntry::new(
            ToolDefinition::new(
                "search_invoices",
                "Search invoices by a free-text query and/or explicit filters",
                search_schema(),
            )
            .read_only(),
            Operation::Custom(search_invoices),
        ),
        ToolEntry::new(
            ToolDefinition::new(
                "search_invoices_by_customer",
                "Search invoices by customer name (finds the contact, then its invoices)",
                ObjectSchema::new(vec![
                    FieldSchema::string("customer_name", "Customer name to search for").min_len(1),
                    limit(50),
                ]),
            )
            .read_only(),
            Operation::Custom(search_by_customer),
        ),
        create_tool(
            "create_invoice",
            "Create a new invoice",
            Resource::Invoices,
            "invoice_data",
            "Invoice fields (contact_id, user_id, positions, ...)",
        ),
        delete_tool("delete_invoice", "Delete a draft invoice", Resource::Invoices),
        action_tool(
            "issue_invoice",
            "Issue a draft invoice",
            Resource::Invoices,
            Action::Issue,
        ),
        action_tool(
            "cancel_invoice",
            "Cancel an issued invoice",
            Resource::Invoices,
            Action::Cancel,
        ),
        action_tool(
            "mark_invoice_as_sent",
            "Mark an invoice as sent",
            Resource::Invoices,
            Action::MarkAsSent,
        ),
        action_tool("send_invoice", "Send an invoice", Resource::Invoices, Action::Send),
        action_tool("copy_invoice", "Copy an invoice", Resource::Invoices, Action::Copy),
        ToolEntry::new(
            ToolDefinition::new(
                "list_invoice_statuses",
                "List all invoice statuses with their meanings",
                ObjectSchema::empty(),
            )
            .read_only(),
            Operation::Custom(list_invoice_statuses),
        ),
        ToolEntry::new(
            ToolDefinition::new(
                "list_all_statuses",
                "List document statuses for invoices, quotes and orders",
                ObjectSchema::new(vec![FieldSchema::one_of(
                    "document_type",
                    "Document type to list statuses for",
                    &["all", "invoices", "quotes", "orders"],
                )
                .default("all")]),
            )
            .read_only(),
            Operation::Custom(list_all_statuses),
        ),
        ToolEntry::new(
            ToolDefinition::new(
                "get_open_invoices",
                "Get all open invoices (draft and pending)",
                ObjectSchema::empty(),
            )
            .read_only(),
            Operation::Custom(open_invoices),
        ),
        ToolEntry::new(
            ToolDefinition::new(
                "get_overdue_invoices",
                "Get all open invoices past their due date",
                ObjectSchema::empty(),
            )
            .read_only(),
            Operation::Custom(overdue_invoices),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockApi;
    use crate::tools::{registry, Dispatcher};
    use bexio_core::ErrorKind;
    use std::sync::Arc;

    fn dispatcher(api: MockApi) -> (Dispatcher, Arc<MockApi>) {
        let api = Arc::new(api);
        (Dispatcher::new(registry().unwrap(), api.clone()), api)
    }

    fn sample_api() -> MockApi {
        MockApi::new()
            .with_records(
                Resource::Contacts,
                vec![
                    json!({"id": 5, "name_1": "Muster AG"}),
                    json!({"id": 6, "name_1": "Beispiel GmbH"}),
                ],
            )
            .with_records(
                Resource::Invoices,
                vec![
                    json!({"id": 1, "contact_id": 5, "title": "Website", "kb_item_status_id": 8, "is_valid_to": "2024-01-31"}),
                    json!({"id": 2, "contact_id": 6, "title": "Hosting", "kb_item_status_id": 9, "is_valid_to": "2024-01-31"}),
                    json!({"id": 3, "contact_id": 5, "title": "Support", "kb_item_status_id": 7, "is_valid_to": "2099-12-31"}),
                ],
            )
    }

    #[tokio::test]
    async fn test_search_by_customer_resolves_contact_first() {
        let (dispatcher, api) = dispatcher(sample_api());

        let result = dispatcher
            .dispatch("search_invoices_by_customer", Some(&json!({"customer_name": "muster"})))
            .await
            .unwrap();

        assert_eq!(result["contact"]["id"], 5);
        assert_eq!(result["invoice_count"], 2);
        let calls = api.calls();
        assert_eq!(calls[0].endpoint.as_ref().unwrap().resource, Resource::Contacts);
        assert_eq!(calls[1].criteria, vec![SearchCriterion::new("contact_id", "=", 5)]);
        assert_eq!(calls[1].page.unwrap().limit, 50);
    }

    #[tokio::test]
    async fn test_search_by_unknown_customer_is_not_found() {
        let (dispatcher, api) = dispatcher(sample_api());

        let err = dispatcher
            .dispatch("search_invoices_by_customer", Some(&json!({"customer_name": "Nobody"})))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.envelope().entity.as_deref(), Some("Customer"));
        // The invoice search never happens.
        assert_eq!(api.count("search"), 1);
    }

    #[tokio::test]
    async fn test_search_invoices_builds_query_criterion() {
        let (dispatcher, api) = dispatcher(sample_api());

        let result = dispatcher
            .dispatch("search_invoices", Some(&json!({"query": "host"})))
            .await
            .unwrap();

        assert_eq!(result.as_array().unwrap().len(), 1);
        assert_eq!(
            api.last_call().unwrap().criteria,
            vec![SearchCriterion::new("title", "like", "host")]
        );
    }

    #[tokio::test]
    async fn test_search_invoices_with_filters() {
        let (dispatcher, api) = dispatcher(sample_api());

        let result = dispatcher
            .dispatch(
                "search_invoices",
                Some(&json!({"filters": [{"field": "contact_id", "operator": "=", "value": 5}]})),
            )
            .await
            .unwrap();

        assert_eq!(result.as_array().unwrap().len(), 2);
        assert_eq!(
            api.last_call().unwrap().criteria,
            vec![SearchCriterion::new("contact_id", "=", 5)]
        );
    }

    #[tokio::test]
    async fn test_search_invoices_needs_query_or_filters() {
        let (dispatcher, _) = dispatcher(sample_api());

        let err = dispatcher
            .dispatch("search_invoices", Some(&json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_open_invoices() {
        let (dispatcher, _) = dispatcher(sample_api());

        let result = dispatcher.dispatch("get_open_invoices", None).await.unwrap();

        let ids: Vec<u64> = result
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|i| i["id"].as_u64())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_overdue_needs_open_status_and_past_due_date() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let invoices = vec![
            json!({"id": 1, "kb_item_status_id": 8, "is_valid_to": "2024-01-31"}),
            json!({"id": 2, "kb_item_status_id": 9, "is_valid_to": "2024-01-31"}),
            json!({"id": 3, "kb_item_status_id": 8, "is_valid_to": "2024-02-01"}),
            json!({"id": 4, "kb_item_status_id": 7}),
        ];

        let result = overdue(invoices, today);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["id"], 1);
    }

    #[tokio::test]
    async fn test_issue_invoice_acts_on_record() {
        let (dispatcher, api) = dispatcher(sample_api());

        dispatcher
            .dispatch("issue_invoice", Some(&json!({"invoice_id": 3})))
            .await
            .unwrap();
        assert_eq!(api.last_call().unwrap().method, "issue");

        let err = dispatcher
            .dispatch("issue_invoice", Some(&json!({"invoice_id": 99})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_status_tables() {
        let (dispatcher, api) = dispatcher(MockApi::new());

        let quotes = dispatcher
            .dispatch("list_all_statuses", Some(&json!({"document_type": "quotes"})))
            .await
            .unwrap();
        assert!(quotes.get("invoices").is_none());
        assert_eq!(quotes["quotes"][2]["name"], "Confirmed");

        let invoices = dispatcher.dispatch("list_invoice_statuses", None).await.unwrap();
        assert_eq!(invoices.as_array().unwrap().len(), INVOICE_STATUSES.len());
        assert!(api.calls().is_empty());
    }
}
