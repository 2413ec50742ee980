// Items (articles) and tax rates

use super::{get_tool, list_tool, Body, Operation, ToolEntry};
use bexio_core::schema::id;
use bexio_core::{FieldSchema, ObjectSchema, Resource, ToolDefinition};

fn item_data() -> ObjectSchema {
    ObjectSchema::new(vec![
        FieldSchema::string("name_1", "Item name").min_len(1),
        FieldSchema::string("intern_code", "Internal article code").optional(),
        FieldSchema::string("intern_description", "Internal description").optional(),
        FieldSchema::integer("article_type_id", "1 for physical products, 2 for services")
            .min(1.0)
            .max(2.0)
            .optional(),
        id("contact_id", "Supplier contact ID").optional(),
        id("unit_id", "Unit ID").optional(),
        id("currency_id", "Currency ID").optional(),
        id("tax_income_id", "Tax rate applied on sales").optional(),
        id("tax_expense_id", "Tax rate applied on purchases").optional(),
        FieldSchema::number("sale_price", "Sale price")
            .non_negative()
            .optional(),
        FieldSchema::number("purchase_price", "Purchase price")
            .non_negative()
            .optional(),
        FieldSchema::boolean("is_stock", "Whether stock is tracked").optional(),
    ])
}

pub(crate) fn tools() -> Vec<ToolEntry> {
    vec![
        list_tool("list_items", "List items (articles and services)", Resource::Items, 50),
        get_tool("get_item", "Get a specific item by ID", Resource::Items),
        ToolEntry::new(
            ToolDefinition::new(
                "create_item",
                "Create a new item",
                ObjectSchema::new(vec![FieldSchema::object(
                    "item_data",
                    "Item fields",
                    item_data(),
                )]),
            ),
            Operation::Create(Resource::Items, Body::Field("item_data")),
        ),
        list_tool("list_taxes", "List tax rates", Resource::Taxes, 100),
        get_tool("get_tax", "Get a specific tax rate by ID", Resource::Taxes),
    ]
}
