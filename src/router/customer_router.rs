use crate::handler::customer_handler::{
    cancel_job_handler, create_job_handler, customer_dashboard_handler, respond_bill_handler,
    respond_quote_handler,
};
use crate::middlewares::auth_middleware::{require_role, AuthState};
use crate::service::JobServices;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn customer_router(services: Arc<JobServices>, auth_state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/customer/jobs", post(create_job_handler))
        .route("/customer/dashboard", get(customer_dashboard_handler))
        .route("/customer/jobs/{id}/quote/respond", post(respond_quote_handler))
        .route("/customer/jobs/{id}/bill/respond", post(respond_bill_handler))
        .route("/customer/jobs/{id}/cancel", post(cancel_job_handler))
        .route_layer(middleware::from_fn_with_state(auth_state, require_role))
        .with_state(services)
}
