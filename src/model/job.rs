use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Lifecycle states of a service job.
///
/// Transitions are closed: anything not allowed by
/// [`JobStatus::can_transition_to`] is rejected with a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Accepted,
    QuotePending,
    InProgress,
    BillingPending,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Accepted => "accepted",
            JobStatus::QuotePending => "quote_pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::BillingPending => "billing_pending",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    /// The transition table. Self-edges on `quote_pending` and
    /// `billing_pending` cover re-submission of a quote or bill.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (*self, next),
            (Pending, Accepted)
                | (Pending, QuotePending)
                | (Pending, Cancelled)
                | (Accepted, QuotePending)
                | (Accepted, Cancelled)
                | (QuotePending, QuotePending)
                | (QuotePending, InProgress)
                | (QuotePending, Accepted)
                | (InProgress, BillingPending)
                | (BillingPending, BillingPending)
                | (BillingPending, InProgress)
                | (BillingPending, Completed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Repairs,
    Maintenance,
    Diagnostics,
    Washing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMethod {
    WalkIn,
    OnSpot,
    HomePickup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// A single line of a quote or bill. Amounts are integer minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub total: i64,
    pub is_custom: bool,
    pub is_note: bool,
}

/// Itemized charges, used for both the quote and the bill phase.
///
/// Always construct through [`ChargeSheet::new`]: note items are informational
/// and must never carry a price, whatever the client submitted, and the total
/// is computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeSheet {
    pub items: Vec<LineItem>,
    pub labor_amount: i64,
    pub total_amount: i64,
    pub note: Option<String>,
    pub photos: Vec<String>,
    pub voice_note: Option<String>,
}

impl ChargeSheet {
    pub fn new(
        mut items: Vec<LineItem>,
        labor_amount: i64,
        note: Option<String>,
        photos: Vec<String>,
        voice_note: Option<String>,
    ) -> Self {
        for item in &mut items {
            if item.is_note {
                item.unit_price = 0;
                item.total = 0;
            }
        }
        let total_amount = labor_amount + items.iter().map(|item| item.total).sum::<i64>();
        ChargeSheet {
            items,
            labor_amount,
            total_amount,
            note,
            photos,
            voice_note,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub customer_id: ObjectId,
    pub vehicle_id: ObjectId,
    pub description: String,
    pub service_type: ServiceType,
    pub service_method: ServiceMethod,
    /// Open to any technician when true; pre-assigned when false.
    pub is_broadcast: bool,
    /// None exactly while a broadcast job is unaccepted.
    pub technician_id: Option<ObjectId>,
    pub status: JobStatus,
    pub location: Location,
    pub quote: Option<ChargeSheet>,
    pub bill: Option<ChargeSheet>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
