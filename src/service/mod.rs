pub mod billing_service;
pub mod dispatch_service;
pub mod payment_service;

use std::sync::Arc;

/// Router state bundling the services the job handlers need.
pub struct JobServices {
    pub dispatch: Arc<dispatch_service::DispatchServiceImpl>,
    pub billing: Arc<billing_service::BillingServiceImpl>,
}
