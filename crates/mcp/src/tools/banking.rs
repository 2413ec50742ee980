// Banking: bank accounts, currencies and Swiss payments

use super::{
    create_flat_tool, delete_tool, get_tool, list_tool, update_tool, Operation, ToolEntry,
};
use bexio_core::{
    BexioApi, Endpoint, FieldSchema, PaymentInstruction, PaymentVariant, Resource, ToolDefinition,
    ToolResult, ValidatedParams,
};
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::info;

fn payment_resource(variant: PaymentVariant) -> Resource {
    match variant {
        PaymentVariant::Iban => Resource::IbanPayments,
        PaymentVariant::Qr => Resource::QrPayments,
    }
}

fn submit_payment(
    variant: PaymentVariant,
    api: &dyn BexioApi,
    params: ValidatedParams,
) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let instruction = PaymentInstruction::from_params(variant, &params)?;
        let endpoint = Endpoint::child(payment_resource(variant), instruction.bank_account_id);

        info!(
            variant = variant.label(),
            bank_account_id = instruction.bank_account_id,
            execution_date = %instruction.execution_date,
            "Submitting payment"
        );
        Ok(api.create(&endpoint, instruction.to_request_body()).await?)
    })
}

fn create_iban_payment(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    submit_payment(PaymentVariant::Iban, api, params)
}

fn create_qr_payment(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    submit_payment(PaymentVariant::Qr, api, params)
}

fn payment_tool(
    name: &'static str,
    description: &'static str,
    variant: PaymentVariant,
    handler: super::registry::Handler,
) -> ToolEntry {
    ToolEntry::payment(
        ToolDefinition::new(name, description, variant.schema()).destructive(),
        variant,
        Operation::Custom(handler),
    )
}

pub(crate) fn tools() -> Vec<ToolEntry> {
    vec![
        list_tool(
            "list_bank_accounts",
            "List bank accounts",
            Resource::BankAccounts,
            100,
        ),
        get_tool(
            "get_bank_account",
            "Get a specific bank account by ID",
            Resource::BankAccounts,
        ),
        list_tool("list_currencies", "List currencies", Resource::Currencies, 100),
        get_tool("get_currency", "Get a specific currency by ID", Resource::Currencies),
        create_flat_tool(
            "create_currency",
            "Create a new currency",
            Resource::Currencies,
            vec![
                FieldSchema::string("name", "Currency code, e.g. CHF")
                    .min_len(1)
                    .max_len(10),
                FieldSchema::number("round_factor", "Rounding step for amounts")
                    .positive()
                    .default(0.05),
            ],
        ),
        update_tool(
            "update_currency",
            "Update an existing currency",
            Resource::Currencies,
            "currency_data",
        ),
        delete_tool("delete_currency", "Delete a currency", Resource::Currencies),
        payment_tool(
            "create_iban_payment",
            "Create an IBAN payment (Swiss ISO 20022 credit transfer) from a bank account",
            PaymentVariant::Iban,
            create_iban_payment,
        ),
        get_tool(
            "get_iban_payment",
            "Get a specific IBAN payment by ID",
            Resource::IbanPayments,
        ),
        update_tool(
            "update_iban_payment",
            "Update a pending IBAN payment",
            Resource::IbanPayments,
            "payment_data",
        ),
        payment_tool(
            "create_qr_payment",
            "Create a QR-bill payment from a bank account",
            PaymentVariant::Qr,
            create_qr_payment,
        ),
        get_tool(
            "get_qr_payment",
            "Get a specific QR payment by ID",
            Resource::QrPayments,
        ),
        update_tool(
            "update_qr_payment",
            "Update a pending QR payment",
            Resource::QrPayments,
            "payment_data",
        ),
    ]
}
