use crate::dto::job_dto::PaymentMethod;
use crate::model::job::{Job, JobStatus};
use crate::repository::job_repo::JobRepository;
use crate::repository::wallet_repo::WalletRepository;
use crate::util::error::ServiceError;
use std::sync::Arc;
use tracing::{error, info, instrument};

use async_trait::async_trait;

/// Bill settlement. The wallet debit and the `billing_pending -> completed`
/// transition must land together: the debit goes first, and a failed
/// completion is compensated with a refund, so neither a paid-but-open nor a
/// completed-but-unpaid job can survive.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn settle(&self, job: &Job, method: PaymentMethod) -> Result<Job, ServiceError>;
}

pub struct PaymentServiceImpl {
    pub job_repo: Arc<dyn JobRepository>,
    pub wallet_repo: Arc<dyn WalletRepository>,
}

impl PaymentServiceImpl {
    pub fn new(job_repo: Arc<dyn JobRepository>, wallet_repo: Arc<dyn WalletRepository>) -> Self {
        PaymentServiceImpl { job_repo, wallet_repo }
    }
}

#[async_trait]
impl PaymentService for PaymentServiceImpl {
    #[instrument(skip(self, job), fields(job_id = ?job.id, customer_id = %job.customer_id))]
    async fn settle(&self, job: &Job, method: PaymentMethod) -> Result<Job, ServiceError> {
        let job_id = job
            .id
            .ok_or_else(|| ServiceError::InternalError("Job has no id".to_string()))?;
        let bill = job
            .bill
            .as_ref()
            .ok_or_else(|| ServiceError::Conflict("Job has no bill to settle".to_string()))?;
        let amount = bill.total_amount;
        info!(amount = amount, "Settling bill");

        match method {
            PaymentMethod::Wallet => {
                self.wallet_repo.debit(job.customer_id, amount).await?;
                info!("Wallet debited, completing job");

                match self
                    .job_repo
                    .update_status(job_id, &[JobStatus::BillingPending], JobStatus::Completed)
                    .await
                {
                    Ok(completed) => {
                        info!("Job settled and completed");
                        Ok(completed)
                    }
                    Err(e) => {
                        error!("Completion failed after debit, refunding: {e}");
                        if let Err(refund_err) = self.wallet_repo.credit(job.customer_id, amount).await {
                            // Manual reconciliation territory; keep both errors visible.
                            error!("Refund after failed completion also failed: {refund_err}");
                        }
                        Err(ServiceError::from(e))
                    }
                }
            }
        }
    }
}
