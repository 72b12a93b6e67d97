use crate::dto::job_dto::{BillResponseRequest, CreateJobRequest, DashboardResponse, QuoteResponseRequest};
use crate::dto::ApiResponse;
use crate::handler::parse_object_id;
use crate::service::billing_service::BillingService;
use crate::service::dispatch_service::DispatchService;
use crate::service::JobServices;
use crate::util::error::HandlerError;
use crate::util::jwt::Claims;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

use validator::Validate;

pub async fn create_job_handler(
    State(services): State<Arc<JobServices>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let customer_id = parse_object_id(&claims.sub, "customer id")?;
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let job = services.dispatch.create_job(customer_id, payload).await?;
    Ok(Json(ApiResponse::ok(job)))
}

pub async fn customer_dashboard_handler(
    State(services): State<Arc<JobServices>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, HandlerError> {
    let customer_id = parse_object_id(&claims.sub, "customer id")?;
    let active_jobs = services.dispatch.active_jobs(customer_id).await?;
    Ok(Json(ApiResponse::ok(DashboardResponse { active_jobs })))
}

pub async fn respond_quote_handler(
    State(services): State<Arc<JobServices>>,
    Extension(claims): Extension<Claims>,
    Path((id,)): Path<(String,)>,
    Json(payload): Json<QuoteResponseRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let customer_id = parse_object_id(&claims.sub, "customer id")?;
    let job_id = parse_object_id(&id, "job id")?;
    let job = services.billing.respond_to_quote(job_id, customer_id, payload).await?;
    Ok(Json(ApiResponse::ok(job)))
}

pub async fn respond_bill_handler(
    State(services): State<Arc<JobServices>>,
    Extension(claims): Extension<Claims>,
    Path((id,)): Path<(String,)>,
    Json(payload): Json<BillResponseRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let customer_id = parse_object_id(&claims.sub, "customer id")?;
    let job_id = parse_object_id(&id, "job id")?;
    let job = services.billing.respond_to_bill(job_id, customer_id, payload).await?;
    Ok(Json(ApiResponse::ok(job)))
}

pub async fn cancel_job_handler(
    State(services): State<Arc<JobServices>>,
    Extension(claims): Extension<Claims>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let customer_id = parse_object_id(&claims.sub, "customer id")?;
    let job_id = parse_object_id(&id, "job id")?;
    let job = services.dispatch.cancel_job(job_id, customer_id).await?;
    Ok(Json(ApiResponse::ok(job)))
}
