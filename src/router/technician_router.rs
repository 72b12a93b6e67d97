use crate::handler::technician_handler::{
    accept_job_handler, submit_bill_handler, submit_quote_handler, technician_jobs_handler,
};
use crate::middlewares::auth_middleware::{require_role, AuthState};
use crate::service::JobServices;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn technician_router(services: Arc<JobServices>, auth_state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/technician/jobs", get(technician_jobs_handler))
        .route("/technician/jobs/{id}/accept", post(accept_job_handler))
        .route("/technician/jobs/{id}/quote", post(submit_quote_handler))
        .route("/technician/jobs/{id}/bill", post(submit_bill_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, require_role))
        .with_state(services)
}
