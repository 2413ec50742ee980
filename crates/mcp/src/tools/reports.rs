//! Reports computed from the full invoice collection.
//!
//! The remote service has no reporting endpoints, so every report pages
//! through all invoices and aggregates locally. Revenue counts every invoice
//! that was issued and not cancelled, dated by `is_valid_from`.

use super::invoices::{
    all_invoices, date_field, is_open, overdue, status_name, STATUS_CANCELLED, STATUS_DRAFT,
};
use super::{Operation, ToolEntry};
use bexio_core::schema::date;
use bexio_core::{
    BexioApi, FieldSchema, ObjectSchema, RemoteError, Rule, ToolDefinition, ToolError,
    ToolResult, ValidatedParams, ValidationError, Violation,
};
use chrono::{Datelike, Days, Local, NaiveDate};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct Period {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Period {
    fn contains(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }

    /// Monday to Sunday around `day`.
    fn week_of(day: NaiveDate) -> Option<Self> {
        let start_date =
            day.checked_sub_days(Days::new(u64::from(day.weekday().num_days_from_monday())))?;
        Some(Self {
            start_date,
            end_date: start_date.checked_add_days(Days::new(6))?,
        })
    }

    fn month(year: i32, month: u32) -> Option<Self> {
        let start_date = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start_date,
            end_date: next.pred_opt()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GroupBy {
    Month,
    Contact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RevenueGroup {
    pub key: String,
    pub revenue: f64,
    pub invoice_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RevenueReport {
    #[serde(flatten)]
    pub period: Period,
    pub total_revenue: f64,
    pub invoice_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<RevenueGroup>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StatusSummary {
    pub status_id: u64,
    pub status: &'static str,
    pub count: usize,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StatusReport {
    #[serde(flatten)]
    pub period: Option<Period>,
    pub invoice_count: usize,
    pub statuses: Vec<StatusSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct OverdueInvoice {
    pub id: Option<u64>,
    pub document_nr: Option<String>,
    pub contact_id: Option<u64>,
    pub due_date: Option<NaiveDate>,
    pub days_overdue: i64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct OverdueReport {
    pub as_of: NaiveDate,
    pub count: usize,
    pub total_outstanding: f64,
    pub invoices: Vec<OverdueInvoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct CustomerRevenue {
    pub contact_id: u64,
    pub revenue: f64,
    pub invoice_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct CustomerRevenueReport {
    #[serde(flatten)]
    pub period: Period,
    pub customer_count: usize,
    pub total_revenue: f64,
    pub customers: Vec<CustomerRevenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct DueInvoice {
    pub id: Option<u64>,
    pub document_nr: Option<String>,
    pub contact_id: Option<u64>,
    pub due_date: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct DueThisWeekReport {
    #[serde(flatten)]
    pub week: Period,
    pub count: usize,
    pub total_due: f64,
    pub invoices: Vec<DueInvoice>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Invoice total; the remote service sends it as a decimal string.
fn amount(invoice: &Value) -> f64 {
    match &invoice["total"] {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn counts_as_revenue(invoice: &Value) -> bool {
    !matches!(
        invoice["kb_item_status_id"].as_u64(),
        Some(STATUS_DRAFT | STATUS_CANCELLED) | None
    )
}

/// Revenue-relevant invoices dated inside `period` (or anywhere without one).
fn revenue_invoices<'a>(
    invoices: &'a [Value],
    period: Option<&'a Period>,
) -> impl Iterator<Item = &'a Value> + 'a {
    invoices.iter().filter(move |invoice| {
        counts_as_revenue(invoice)
            && match period {
                Some(period) => {
                    date_field(invoice, "is_valid_from").is_some_and(|day| period.contains(day))
                }
                None => true,
            }
    })
}

pub(crate) fn revenue_report(
    invoices: &[Value],
    period: Period,
    group_by: Option<GroupBy>,
) -> RevenueReport {
    let mut total = 0.0;
    let mut count = 0;
    let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for invoice in revenue_invoices(invoices, Some(&period)) {
        let value = amount(invoice);
        total += value;
        count += 1;

        let key = match group_by {
            Some(GroupBy::Month) => date_field(invoice, "is_valid_from")
                .map(|day| format!("{:04}-{:02}", day.year(), day.month())),
            Some(GroupBy::Contact) => Some(match invoice["contact_id"].as_u64() {
                Some(id) => id.to_string(),
                None => "unknown".to_string(),
            }),
            None => None,
        };
        if let Some(key) = key {
            let entry = groups.entry(key).or_default();
            entry.0 += value;
            entry.1 += 1;
        }
    }

    RevenueReport {
        period,
        total_revenue: round2(total),
        invoice_count: count,
        groups: group_by.map(|_| {
            groups
                .into_iter()
                .map(|(key, (revenue, invoice_count))| RevenueGroup {
                    key,
                    revenue: round2(revenue),
                    invoice_count,
                })
                .collect()
        }),
    }
}

pub(crate) fn status_report(invoices: &[Value], period: Option<Period>) -> StatusReport {
    let mut by_status: BTreeMap<u64, (usize, f64)> = BTreeMap::new();
    let mut invoice_count = 0;

    for invoice in invoices {
        if let Some(period) = &period {
            let dated = date_field(invoice, "is_valid_from").is_some_and(|day| period.contains(day));
            if !dated {
                continue;
            }
        }
        let Some(status_id) = invoice["kb_item_status_id"].as_u64() else {
            continue;
        };
        let entry = by_status.entry(status_id).or_default();
        entry.0 += 1;
        entry.1 += amount(invoice);
        invoice_count += 1;
    }

    StatusReport {
        period,
        invoice_count,
        statuses: by_status
            .into_iter()
            .map(|(status_id, (count, total))| StatusSummary {
                status_id,
                status: status_name(status_id),
                count,
                total: round2(total),
            })
            .collect(),
    }
}

/// Most overdue first.
pub(crate) fn overdue_report(invoices: Vec<Value>, today: NaiveDate) -> OverdueReport {
    let mut rows: Vec<OverdueInvoice> = overdue(invoices, today)
        .iter()
        .map(|invoice| {
            let due_date = date_field(invoice, "is_valid_to");
            OverdueInvoice {
                id: invoice["id"].as_u64(),
                document_nr: invoice["document_nr"].as_str().map(str::to_string),
                contact_id: invoice["contact_id"].as_u64(),
                due_date,
                days_overdue: due_date.map_or(0, |due| (today - due).num_days()),
                total: round2(amount(invoice)),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));

    OverdueReport {
        as_of: today,
        count: rows.len(),
        total_outstanding: round2(rows.iter().map(|r| r.total).sum()),
        invoices: rows,
    }
}

pub(crate) fn top_customers(
    invoices: &[Value],
    period: Option<Period>,
    limit: usize,
) -> Vec<CustomerRevenue> {
    let mut by_contact: HashMap<u64, (f64, usize)> = HashMap::new();
    for invoice in revenue_invoices(invoices, period.as_ref()) {
        if let Some(contact_id) = invoice["contact_id"].as_u64() {
            let entry = by_contact.entry(contact_id).or_default();
            entry.0 += amount(invoice);
            entry.1 += 1;
        }
    }

    let mut ranked: Vec<CustomerRevenue> = by_contact
        .into_iter()
        .map(|(contact_id, (revenue, invoice_count))| CustomerRevenue {
            contact_id,
            revenue: round2(revenue),
            invoice_count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then(a.contact_id.cmp(&b.contact_id))
    });
    ranked.truncate(limit);
    ranked
}

/// Ranked customers for a period; the totals cover every customer, not just the listed ones.
pub(crate) fn customer_revenue_report(
    invoices: &[Value],
    period: Period,
    limit: usize,
) -> CustomerRevenueReport {
    let everyone = top_customers(invoices, Some(period), usize::MAX);
    let total_revenue = round2(everyone.iter().map(|c| c.revenue).sum());
    let customer_count = everyone.len();

    CustomerRevenueReport {
        period,
        customer_count,
        total_revenue,
        customers: everyone.into_iter().take(limit).collect(),
    }
}

/// Open invoices due between Monday and Sunday of the week containing `today`.
pub(crate) fn due_this_week(invoices: &[Value], week: Period) -> DueThisWeekReport {
    let mut rows: Vec<DueInvoice> = invoices
        .iter()
        .filter(|invoice| is_open(invoice))
        .filter_map(|invoice| {
            let due_date = date_field(invoice, "is_valid_to").filter(|due| week.contains(*due))?;
            Some(DueInvoice {
                id: invoice["id"].as_u64(),
                document_nr: invoice["document_nr"].as_str().map(str::to_string),
                contact_id: invoice["contact_id"].as_u64(),
                due_date,
                total: round2(amount(invoice)),
            })
        })
        .collect();
    rows.sort_by_key(|row| (row.due_date, row.id));

    DueThisWeekReport {
        week,
        count: rows.len(),
        total_due: round2(rows.iter().map(|r| r.total).sum()),
        invoices: rows,
    }
}

fn parse_day(params: &ValidatedParams, field: &str, violations: &mut Vec<Violation>) -> Option<NaiveDate> {
    let raw = params.str(field)?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(day) => Some(day),
        Err(_) => {
            violations.push(Violation::new(
                field,
                Rule::CalendarDate,
                format!("{} is not a valid calendar date", raw),
            ));
            None
        }
    }
}

/// `start_date`/`end_date` as a period; both or neither must be given.
fn optional_period(params: &ValidatedParams) -> Result<Option<Period>, ValidationError> {
    let mut violations = Vec::new();
    let start = parse_day(params, "start_date", &mut violations);
    let end = parse_day(params, "end_date", &mut violations);
    if !violations.is_empty() {
        return Err(ValidationError::new(violations));
    }

    match (start, end) {
        (Some(start_date), Some(end_date)) if end_date < start_date => {
            Err(ValidationError::single(Violation::new(
                "end_date",
                Rule::Minimum,
                "must not be before start_date",
            )))
        }
        (Some(start_date), Some(end_date)) => Ok(Some(Period {
            start_date,
            end_date,
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ValidationError::single(Violation::new(
            "end_date",
            Rule::Missing,
            "is required when start_date is given",
        ))),
        (None, Some(_)) => Err(ValidationError::single(Violation::new(
            "start_date",
            Rule::Missing,
            "is required when end_date is given",
        ))),
    }
}

fn required_period(params: &ValidatedParams) -> Result<Period, ValidationError> {
    optional_period(params)?.ok_or_else(|| {
        ValidationError::single(Violation::new("start_date", Rule::Missing, "is required"))
    })
}

fn to_value<T: Serialize>(report: &T) -> ToolResult<Value> {
    serde_json::to_value(report).map_err(|e| {
        ToolError::Remote(RemoteError::transport(format!("Failed to encode report: {}", e)))
    })
}

fn revenue(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let period = required_period(&params)?;
        let group_by = match params.str("group_by") {
            Some("month") => Some(GroupBy::Month),
            Some("contact") => Some(GroupBy::Contact),
            _ => None,
        };
        let invoices = all_invoices(api).await?;
        to_value(&revenue_report(&invoices, period, group_by))
    })
}

fn monthly_revenue(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let year = params.require_u64("year")?;
        let month = params.require_u64("month")?;
        let period = i32::try_from(year)
            .ok()
            .zip(u32::try_from(month).ok())
            .and_then(|(year, month)| Period::month(year, month))
            .ok_or_else(|| {
                ValidationError::single(Violation::new(
                    "month",
                    Rule::CalendarDate,
                    format!("{}-{} is not a valid month", year, month),
                ))
            })?;
        let invoices = all_invoices(api).await?;
        to_value(&revenue_report(&invoices, period, None))
    })
}

fn invoice_statuses(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let period = optional_period(&params)?;
        let invoices = all_invoices(api).await?;
        to_value(&status_report(&invoices, period))
    })
}

fn overdue_invoices(api: &dyn BexioApi, _params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let today = Local::now().date_naive();
        let invoices = all_invoices(api).await?;
        to_value(&overdue_report(invoices, today))
    })
}

fn customers(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let period = optional_period(&params)?;
        let limit = params.require_u64("limit")? as usize;
        let invoices = all_invoices(api).await?;
        to_value(&top_customers(&invoices, period, limit))
    })
}

fn customer_revenue(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let period = required_period(&params)?;
        let limit = params.require_u64("limit")? as usize;
        let invoices = all_invoices(api).await?;
        to_value(&customer_revenue_report(&invoices, period, limit))
    })
}

fn tasks_due_this_week(api: &dyn BexioApi, _params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let today = Local::now().date_naive();
        let week = Period::week_of(today).unwrap_or(Period {
            start_date: today,
            end_date: today,
        });
        let invoices = all_invoices(api).await?;
        to_value(&due_this_week(&invoices, week))
    })
}

fn report(
    name: &'static str,
    description: &'static str,
    fields: Vec<FieldSchema>,
    handler: super::registry::Handler,
) -> ToolEntry {
    ToolEntry::new(
        ToolDefinition::new(name, description, ObjectSchema::new(fields)).read_only(),
        Operation::Custom(handler),
    )
}

pub(crate) fn tools() -> Vec<ToolEntry> {
    vec![
        report(
            "get_revenue_report",
            "Revenue of issued, non-cancelled invoices in a period",
            vec![
                date("start_date", "First day of the period (YYYY-MM-DD)"),
                date("end_date", "Last day of the period (YYYY-MM-DD)"),
                FieldSchema::one_of("group_by", "Break revenue down by", &["month", "contact"])
                    .optional(),
            ],
            revenue,
        ),
        report(
            "get_monthly_revenue_report",
            "Revenue of issued, non-cancelled invoices in one calendar month",
            vec![
                FieldSchema::integer("year", "Year, e.g. 2024").min(1.0).max(9999.0),
                FieldSchema::integer("month", "Month (1-12)").min(1.0).max(12.0),
            ],
            monthly_revenue,
        ),
        report(
            "get_customer_revenue_report",
            "Revenue per customer in a period, highest first",
            vec![
                date("start_date", "First day of the period (YYYY-MM-DD)"),
                date("end_date", "Last day of the period (YYYY-MM-DD)"),
                FieldSchema::integer("limit", "Number of customers to return")
                    .positive()
                    .max(1000.0)
                    .default(10),
            ],
            customer_revenue,
        ),
        report(
            "get_invoice_status_report",
            "Invoice counts and totals per status, optionally for a period",
            vec![
                date("start_date", "First day of the period (YYYY-MM-DD)").optional(),
                date("end_date", "Last day of the period (YYYY-MM-DD)").optional(),
            ],
            invoice_statuses,
        ),
        report(
            "get_overdue_invoices_report",
            "Overdue invoices with days overdue and the total outstanding",
            Vec::new(),
            overdue_invoices,
        ),
        report(
            "get_top_customers_by_revenue",
            "Customers ranked by revenue, optionally for a period",
            vec![
                FieldSchema::integer("limit", "Number of customers to return")
                    .positive()
                    .max(1000.0)
                    .default(10),
                date("start_date", "First day of the period (YYYY-MM-DD)").optional(),
                date("end_date", "Last day of the period (YYYY-MM-DD)").optional(),
            ],
            customers,
        ),
        report(
            "get_tasks_due_this_week",
            "Open invoices due this week (Monday to Sunday)",
            Vec::new(),
            tasks_due_this_week,
        ),
    ]
}
