use crate::dto::job_dto::ChargeRequest;
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

pub async fn technician_jobs_handler(
    State(services): State<Arc<JobServices>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, HandlerError> {
    let technician_id = parse_object_id(&claims.sub, "technician id")?;
    let jobs = services.dispatch.jobs_for_technician(technician_id).await?;
    Ok(Json(ApiResponse::ok(jobs)))
}

pub async fn accept_job_handler(
    State(services): State<Arc<JobServices>>,
    Extension(claims): Extension<Claims>,
    Path((id,)): Path<(String,)>,
) -> Result<impl IntoResponse, HandlerError> {
    let technician_id = parse_object_id(&claims.sub, "technician id")?;
    let job_id = parse_object_id(&id, "job id")?;
    let job = services.dispatch.accept_job(job_id, technician_id).await?;
    Ok(Json(ApiResponse::ok(job)))
}

pub async fn submit_quote_handler(
    State(services): State<Arc<JobServices>>,
    Extension(claims): Extension<Claims>,
    Path((id,)): Path<(String,)>,
    Json(payload): Json<ChargeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let technician_id = parse_object_id(&claims.sub, "technician id")?;
    let job_id = parse_object_id(&id, "job id")?;
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let job = services.billing.submit_quote(job_id, technician_id, payload).await?;
    Ok(Json(ApiResponse::ok(job)))
}

pub async fn submit_bill_handler(
    State(services): State<Arc<JobServices>>,
    Extension(claims): Extension<Claims>,
    Path((id,)): Path<(String,)>,
    Json(payload): Json<ChargeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let technician_id = parse_object_id(&claims.sub, "technician id")?;
    let job_id = parse_object_id(&id, "job id")?;
    if let Err(e) = payload.validate() {
        return Err(HandlerError::bad_request(format!("Validation error: {}", e)));
    }
    let job = services.billing.submit_bill(job_id, technician_id, payload).await?;
    Ok(Json(ApiResponse::ok(job)))
}
