//! The remote client capability the dispatcher calls into.
//!
//! Rather than one method per remote collection, every call names an
//! [`Endpoint`]: `listInvoices(limit, offset)` becomes
//! `list(&Endpoint::of(Resource::Invoices), page)`.

use crate::error::RemoteError;
use crate::gate::Module;
use crate::pagination::PageRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Remote collections reachable through the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Contacts,
    Invoices,
    Items,
    Taxes,
    FictionalUsers,
    Projects,
    ProjectTypes,
    ProjectStatuses,
    Milestones,
    WorkPackages,
    Bills,
    Expenses,
    BankAccounts,
    Currencies,
    IbanPayments,
    QrPayments,
    Employees,
    Absences,
    PayrollDocuments,
    Files,
    AdditionalAddresses,
}

impl Resource {
    /// Collection path relative to the API root.
    pub fn path(self, parent: Option<u64>) -> String {
        match (self, parent) {
            (Self::Contacts, _) => "2.0/contact".into(),
            (Self::Invoices, _) => "2.0/kb_invoice".into(),
            (Self::Items, _) => "2.0/article".into(),
            (Self::Taxes, _) => "3.0/taxes".into(),
            (Self::FictionalUsers, _) => "3.0/fictional_users".into(),
            (Self::Projects, _) => "2.0/pr_project".into(),
            (Self::ProjectTypes, _) => "2.0/pr_project_type".into(),
            (Self::ProjectStatuses, _) => "2.0/pr_project_state".into(),
            (Self::Milestones, p) => format!("3.0/projects/{}/milestones", p.unwrap_or_default()),
            (Self::WorkPackages, p) => format!("3.0/projects/{}/packages", p.unwrap_or_default()),
            (Self::Bills, _) => "4.0/purchase/bills".into(),
            (Self::Expenses, _) => "4.0/expenses".into(),
            (Self::BankAccounts, _) => "3.0/banking/accounts".into(),
            (Self::Currencies, _) => "3.0/currencies".into(),
            (Self::IbanPayments, Some(account)) => {
                format!("3.0/banking/accounts/{}/iban_payments", account)
            }
            (Self::IbanPayments, None) => "3.0/banking/iban_payments".into(),
            (Self::QrPayments, Some(account)) => {
                format!("3.0/banking/accounts/{}/qr_payments", account)
            }
            (Self::QrPayments, None) => "3.0/banking/qr_payments".into(),
            (Self::Employees, _) => "4.0/payroll/employees".into(),
            (Self::Absences, _) => "4.0/payroll/absences".into(),
            (Self::PayrollDocuments, _) => "4.0/payroll/documents".into(),
            (Self::Files, _) => "3.0/files".into(),
            (Self::AdditionalAddresses, p) => {
                format!("2.0/contact/{}/additional_address", p.unwrap_or_default())
            }
        }
    }

    /// Entity label used in not-found errors.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Contacts => "Contact",
            Self::Invoices => "Invoice",
            Self::Items => "Item",
            Self::Taxes => "Tax",
            Self::FictionalUsers => "Fictional user",
            Self::Projects => "Project",
            Self::ProjectTypes => "Project type",
            Self::ProjectStatuses => "Project status",
            Self::Milestones => "Milestone",
            Self::WorkPackages => "Work package",
            Self::Bills => "Bill",
            Self::Expenses => "Expense",
            Self::BankAccounts => "Bank account",
            Self::Currencies => "Currency",
            Self::IbanPayments => "IBAN payment",
            Self::QrPayments => "QR payment",
            Self::Employees => "Employee",
            Self::Absences => "Absence",
            Self::PayrollDocuments => "Payroll document",
            Self::Files => "File",
            Self::AdditionalAddresses => "Additional address",
        }
    }

    /// Argument carrying the record identifier.
    pub fn id_field(self) -> &'static str {
        match self {
            Self::Contacts => "contact_id",
            Self::Invoices => "invoice_id",
            Self::Items => "item_id",
            Self::Taxes => "tax_id",
            Self::FictionalUsers => "user_id",
            Self::Projects => "project_id",
            Self::ProjectTypes => "type_id",
            Self::ProjectStatuses => "status_id",
            Self::Milestones => "milestone_id",
            Self::WorkPackages => "workpackage_id",
            Self::Bills => "bill_id",
            Self::Expenses => "expense_id",
            Self::BankAccounts => "account_id",
            Self::Currencies => "currency_id",
            Self::IbanPayments | Self::QrPayments => "payment_id",
            Self::Employees => "employee_id",
            Self::Absences => "absence_id",
            Self::PayrollDocuments => "document_id",
            Self::Files => "file_id",
            Self::AdditionalAddresses => "address_id",
        }
    }

    /// Argument carrying the owning record, for nested collections.
    pub fn parent_field(self) -> Option<&'static str> {
        match self {
            Self::Milestones | Self::WorkPackages => Some("project_id"),
            Self::AdditionalAddresses => Some("contact_id"),
            _ => None,
        }
    }

    /// Optionally licensed module this collection belongs to.
    pub fn module(self) -> Option<Module> {
        match self {
            Self::Employees | Self::Absences | Self::PayrollDocuments => Some(Module::Payroll),
            _ => None,
        }
    }
}

/// A resource plus the context needed to address it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub resource: Resource,
    pub parent: Option<u64>,
    /// Extra query parameters for list calls.
    pub filters: Vec<(String, String)>,
}

impl Endpoint {
    pub fn of(resource: Resource) -> Self {
        Self {
            resource,
            parent: None,
            filters: Vec::new(),
        }
    }

    pub fn child(resource: Resource, parent: u64) -> Self {
        Self {
            parent: Some(parent),
            ..Self::of(resource)
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((key.into(), value.to_string()));
        self
    }

    pub fn path(&self) -> String {
        self.resource.path(self.parent)
    }
}

/// Identifier-only state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Issue,
    Cancel,
    MarkAsSent,
    Send,
    MarkAsPaid,
    Archive,
    Unarchive,
    Copy,
}

impl Action {
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Cancel => "cancel",
            Self::MarkAsSent => "mark_as_sent",
            Self::Send => "send",
            Self::MarkAsPaid => "mark_as_paid",
            Self::Archive => "archive",
            Self::Unarchive => "reactivate",
            Self::Copy => "copy",
        }
    }
}

/// One remote search condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriterion {
    pub field: String,
    pub value: Value,
    #[serde(default = "default_criteria")]
    pub criteria: String,
}

fn default_criteria() -> String {
    "=".to_string()
}

impl SearchCriterion {
    pub fn new(field: impl Into<String>, criteria: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            criteria: criteria.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDownload {
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Remote service operations. Implementations perform transport, auth and any
/// retry policy; callers see only payloads or a [`RemoteError`].
#[async_trait::async_trait]
pub trait BexioApi: Send + Sync {
    async fn list(&self, endpoint: &Endpoint, page: PageRequest) -> Result<Vec<Value>, RemoteError>;

    /// `Ok(None)` when the record does not exist.
    async fn get(&self, endpoint: &Endpoint, id: u64) -> Result<Option<Value>, RemoteError>;

    async fn create(&self, endpoint: &Endpoint, body: Value) -> Result<Value, RemoteError>;

    async fn update(&self, endpoint: &Endpoint, id: u64, body: Value) -> Result<Value, RemoteError>;

    async fn delete(&self, endpoint: &Endpoint, id: u64) -> Result<Value, RemoteError>;

    async fn search(
        &self,
        endpoint: &Endpoint,
        criteria: &[SearchCriterion],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Value>, RemoteError>;

    async fn act(&self, endpoint: &Endpoint, id: u64, action: Action) -> Result<Value, RemoteError>;

    async fn current_user(&self) -> Result<Value, RemoteError>;

    async fn upload_file(&self, upload: FileUpload) -> Result<Value, RemoteError>;

    async fn download_file(&self, id: u64) -> Result<Option<FileDownload>, RemoteError>;
}
