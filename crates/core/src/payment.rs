//! Swiss payment instruction rules.
//!
//! IBAN credit transfers follow the ISO 20022 payment rules; QR-bill payments
//! follow the QR-bill standard. Both only accept structured recipient
//! addresses. The generic field rules come from the schemas below; this module
//! adds the checks a field descriptor cannot express on its own.

use crate::error::{Rule, ValidationError, Violation};
use crate::schema::{id, FieldSchema, ObjectSchema, Pattern};
use crate::validation::{validate, ValidatedParams};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Largest amount the QR-bill format can carry.
pub const QR_MAX_AMOUNT: f64 = 999_999_999.99;

/// Length of a QR reference number.
pub const QR_REFERENCE_LEN: usize = 27;

pub const CURRENCIES: &[&str] = &["CHF", "EUR"];

pub const ALLOWANCE_TYPES: &[&str] = &["no_fee", "our", "ben", "sha"];

const IBAN_ONLY_FIELDS: &[&str] = &["message", "is_salary_payment", "allowance_type"];
const QR_ONLY_FIELDS: &[&str] = &["qr_reference_nr", "additional_information"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentVariant {
    Iban,
    Qr,
}

impl PaymentVariant {
    pub fn label(self) -> &'static str {
        match self {
            Self::Iban => "IBAN",
            Self::Qr => "QR",
        }
    }

    /// Input schema for `create_*_payment`.
    pub fn schema(self) -> ObjectSchema {
        let mut fields = common_fields(self);
        match self {
            Self::Iban => fields.extend([
                FieldSchema::string("message", "Message to the recipient")
                    .max_len(140)
                    .optional(),
                FieldSchema::boolean("is_salary_payment", "Whether this is a salary payment")
                    .default(false),
                FieldSchema::one_of("allowance_type", "Fee allocation", ALLOWANCE_TYPES)
                    .default("no_fee"),
            ]),
            Self::Qr => fields.extend([
                FieldSchema::string(
                    "qr_reference_nr",
                    "27-digit QR reference number (omit for unreferenced payments)",
                )
                .exact_len(QR_REFERENCE_LEN)
                .pattern(Pattern::Digits)
                .optional(),
                FieldSchema::string("additional_information", "Additional information")
                    .max_len(140)
                    .optional(),
            ]),
        }
        ObjectSchema::new(fields)
    }

    fn foreign_fields(self) -> &'static [&'static str] {
        match self {
            Self::Iban => QR_ONLY_FIELDS,
            Self::Qr => IBAN_ONLY_FIELDS,
        }
    }

    fn other(self) -> Self {
        match self {
            Self::Iban => Self::Qr,
            Self::Qr => Self::Iban,
        }
    }
}

fn common_fields(variant: PaymentVariant) -> Vec<FieldSchema> {
    let amount = FieldSchema::number("amount", "Amount to transfer").positive();
    let amount = match variant {
        PaymentVariant::Iban => amount,
        PaymentVariant::Qr => amount.max(QR_MAX_AMOUNT),
    };

    vec![
        id("bank_account_id", "Bank account to debit"),
        FieldSchema::string("iban", "Recipient IBAN").min_len(15).max_len(34),
        FieldSchema::one_of("currency", "Payment currency", CURRENCIES),
        amount,
        FieldSchema::string("recipient_name", "Recipient name").max_len(70),
        FieldSchema::string("recipient_street", "Recipient street")
            .max_len(70)
            .optional(),
        FieldSchema::string("recipient_house_number", "Recipient house number")
            .max_len(16)
            .optional(),
        FieldSchema::string("recipient_zip", "Recipient postal code").max_len(10),
        FieldSchema::string("recipient_city", "Recipient city").max_len(35),
        FieldSchema::string("recipient_country_code", "Two-letter country code")
            .exact_len(2)
            .default("CH"),
        FieldSchema::string("execution_date", "Execution date (YYYY-MM-DD)")
            .pattern(Pattern::IsoDate),
    ]
}

/// Validate a payment instruction: generic field rules plus payment rules.
///
/// Generic violations come first, payment-specific ones after; both share the
/// validation error kind.
pub fn validate_payment(
    variant: PaymentVariant,
    args: Option<&Value>,
) -> Result<ValidatedParams, ValidationError> {
    let generic = validate(&variant.schema(), args);
    let mut violations = match &generic {
        Ok(_) => Vec::new(),
        Err(err) => err.violations.clone(),
    };

    if let Some(Value::Object(raw)) = args {
        for field in variant.foreign_fields() {
            if raw.contains_key(*field) {
                violations.push(Violation::new(
                    *field,
                    Rule::VariantMismatch,
                    format!(
                        "is only accepted for {} payments",
                        variant.other().label()
                    ),
                ));
            }
        }

        if variant == PaymentVariant::Qr {
            if let Some(Value::String(reference)) = raw.get("qr_reference_nr") {
                let well_formed = reference.len() == QR_REFERENCE_LEN
                    && Pattern::Digits.is_match(reference);
                if well_formed && !qr_reference_checksum_ok(reference) {
                    violations.push(Violation::new(
                        "qr_reference_nr",
                        Rule::Checksum,
                        "has an invalid check digit",
                    ));
                }
            }
        }

        if let Some(Value::String(date)) = raw.get("execution_date") {
            if Pattern::IsoDate.is_match(date) && parse_date(date).is_none() {
                violations.push(Violation::new(
                    "execution_date",
                    Rule::CalendarDate,
                    format!("{} is not a valid calendar date", date),
                ));
            }
        }
    }

    match generic {
        Ok(params) if violations.is_empty() => Ok(params),
        _ => Err(ValidationError::new(violations)),
    }
}

/// Recursive modulo 10 check over a 27-digit QR reference; the last digit
/// is the check digit.
pub fn qr_reference_checksum_ok(reference: &str) -> bool {
    const TABLE: [u32; 10] = [0, 9, 4, 6, 8, 2, 7, 1, 3, 5];

    let digits: Option<Vec<u32>> = reference.chars().map(|c| c.to_digit(10)).collect();
    let Some((check, payload)) = digits.as_deref().and_then(<[u32]>::split_last) else {
        return false;
    };
    let carry = payload
        .iter()
        .fold(0, |carry, digit| TABLE[((carry + digit) % 10) as usize]);
    (10 - carry) % 10 == *check
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "CHF")]
    Chf,
    #[serde(rename = "EUR")]
    Eur,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowanceType {
    NoFee,
    Our,
    Ben,
    Sha,
}

/// Structured recipient address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(rename = "recipient_name")]
    pub name: String,
    #[serde(rename = "recipient_street", default)]
    pub street: Option<String>,
    #[serde(rename = "recipient_house_number", default)]
    pub house_number: Option<String>,
    #[serde(rename = "recipient_zip")]
    pub zip: String,
    #[serde(rename = "recipient_city")]
    pub city: String,
    #[serde(rename = "recipient_country_code")]
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentDetails {
    Iban {
        message: Option<String>,
        is_salary_payment: bool,
        allowance_type: AllowanceType,
    },
    Qr {
        qr_reference_nr: Option<String>,
        additional_information: Option<String>,
    },
}

/// A validated payment instruction ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInstruction {
    pub bank_account_id: u64,
    pub iban: String,
    pub currency: Currency,
    pub amount: f64,
    pub recipient: Recipient,
    pub execution_date: NaiveDate,
    pub details: PaymentDetails,
}

#[derive(Deserialize)]
struct CommonParams {
    bank_account_id: u64,
    iban: String,
    currency: Currency,
    amount: f64,
    #[serde(flatten)]
    recipient: Recipient,
    execution_date: NaiveDate,
}

#[derive(Deserialize)]
struct IbanParams {
    message: Option<String>,
    is_salary_payment: bool,
    allowance_type: AllowanceType,
}

#[derive(Deserialize)]
struct QrParams {
    qr_reference_nr: Option<String>,
    additional_information: Option<String>,
}

impl PaymentInstruction {
    /// Build from parameters that passed [`validate_payment`].
    pub fn from_params(
        variant: PaymentVariant,
        params: &ValidatedParams,
    ) -> Result<Self, ValidationError> {
        let common: CommonParams = params.parse()?;
        let details = match variant {
            PaymentVariant::Iban => {
                let p: IbanParams = params.parse()?;
                PaymentDetails::Iban {
                    message: p.message,
                    is_salary_payment: p.is_salary_payment,
                    allowance_type: p.allowance_type,
                }
            }
            PaymentVariant::Qr => {
                let p: QrParams = params.parse()?;
                PaymentDetails::Qr {
                    qr_reference_nr: p.qr_reference_nr,
                    additional_information: p.additional_information,
                }
            }
        };

        Ok(Self {
            bank_account_id: common.bank_account_id,
            iban: common.iban,
            currency: common.currency,
            amount: common.amount,
            recipient: common.recipient,
            execution_date: common.execution_date,
            details,
        })
    }

    pub fn variant(&self) -> PaymentVariant {
        match self.details {
            PaymentDetails::Iban { .. } => PaymentVariant::Iban,
            PaymentDetails::Qr { .. } => PaymentVariant::Qr,
        }
    }

    /// Request body in the remote service's payment format.
    pub fn to_request_body(&self) -> Value {
        let mut recipient = json!({
            "name": self.recipient.name,
            "zip": self.recipient.zip,
            "city": self.recipient.city,
            "country_code": self.recipient.country_code,
        });
        if let Some(street) = &self.recipient.street {
            recipient["street"] = json!(street);
        }
        if let Some(number) = &self.recipient.house_number {
            recipient["house_number"] = json!(number);
        }

        let mut body = json!({
            "instructed_amount": {
                "currency": self.currency,
                "amount": self.amount,
            },
            "recipient": recipient,
            "iban": self.iban,
            "execution_date": self.execution_date.format("%Y-%m-%d").to_string(),
            "is_editing_restricted": false,
        });

        match &self.details {
            PaymentDetails::Iban {
                message,
                is_salary_payment,
                allowance_type,
            } => {
                body["is_salary_payment"] = json!(is_salary_payment);
                body["allowance_type"] = json!(allowance_type);
                if let Some(message) = message {
                    body["message"] = json!(message);
                }
            }
            PaymentDetails::Qr {
                qr_reference_nr,
                additional_information,
            } => {
                if let Some(reference) = qr_reference_nr {
                    body["qr_reference_nr"] = json!(reference);
                }
                if let Some(info) = additional_information {
                    body["additional_information"] = json!(info);
                }
            }
        }

        body
    }
}
