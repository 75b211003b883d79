//! Shared types used across pages and server functions.

use roofclaim_core::{ContactId, InvoiceId, JobId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Accepts an ID stored either as text or as a number.
fn id_from_any<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(T::from(s)),
        Value::Number(n) => Ok(T::from(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {other}"
        ))),
    }
}

fn optional_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(T::from(s))),
        Some(Value::Number(n)) => Ok(Some(T::from(n.to_string()))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, found {other}"
        ))),
    }
}

/// Payment state of an invoice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    #[serde(rename = "Partial Payment")]
    PartialPayment,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Unpaid,
        PaymentStatus::PartialPayment,
        PaymentStatus::Paid,
        PaymentStatus::Overdue,
    ];

    /// Returns the stored (and displayed) value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "Unpaid",
            Self::PartialPayment => "Partial Payment",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown payment status '{s}'"))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactName {
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JobType {
    #[serde(default)]
    pub job_type: Option<String>,
}

/// Invoice row with its contact name and job type joined in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(deserialize_with = "id_from_any")]
    pub id: InvoiceId,
    #[serde(default, deserialize_with = "optional_id")]
    pub contact_id: Option<ContactId>,
    #[serde(default, deserialize_with = "optional_id")]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub amount_due: Option<f64>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub payment_due_date: Option<String>,
    #[serde(default)]
    pub contacts: Option<ContactName>,
    #[serde(default)]
    pub jobs: Option<JobType>,
}

impl Invoice {
    pub fn contact_name(&self) -> &str {
        self.contacts
            .as_ref()
            .and_then(|c| c.full_name.as_deref())
            .unwrap_or("")
    }

    pub fn job_type(&self) -> &str {
        self.jobs
            .as_ref()
            .and_then(|j| j.job_type.as_deref())
            .unwrap_or("")
    }

    /// Parsed status; `None` for values outside the known set.
    pub fn status(&self) -> Option<PaymentStatus> {
        self.payment_status.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Contact choice in the invoice form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactOption {
    #[serde(deserialize_with = "id_from_any")]
    pub id: ContactId,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Job choice in the invoice form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobOption {
    #[serde(deserialize_with = "id_from_any")]
    pub id: JobId,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub contact_id: Option<ContactId>,
}

/// One row of the project status report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub status: String,
    #[serde(default)]
    pub project_count: i64,
    #[serde(default)]
    pub total_value: Option<f64>,
}
