use crate::model::job::{Job, Location, ServiceMethod, ServiceType};
use serde::{Deserialize, Serialize};

use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[validate(length(equal = 24))] // MongoDB ObjectId hex string
    pub vehicle_id: String,

    #[validate(length(min = 3, max = 2000))]
    pub description: String,

    pub service_type: ServiceType,

    pub service_method: ServiceMethod,

    pub is_broadcast: bool,

    /// Required for direct jobs; ignored for broadcast jobs.
    #[validate(length(equal = 24))]
    pub technician_id: Option<String>,

    pub location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub description: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub total: i64,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub is_note: bool,
}

/// Body of quote and bill submissions. Item totals are taken as submitted
/// except for note items, which the server zeroes before summing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    pub items: Vec<LineItemRequest>,

    #[validate(range(min = 0))]
    pub labor_amount: i64,

    pub note: Option<String>,

    #[serde(default)]
    pub photos: Vec<String>,

    pub voice_note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteAction {
    Accept,
    AcceptWithParts,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Wallet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponseRequest {
    pub action: QuoteAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillResponseRequest {
    pub action: BillAction,
    pub payment_method: Option<PaymentMethod>,
}

/// Per-technician job partition: direct assignments and accepted jobs on one
/// side, unclaimed broadcast jobs on the other. A job never appears in both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianJobsResponse {
    pub my_jobs: Vec<Job>,
    pub available: Vec<Job>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub active_jobs: Vec<Job>,
}
