use crate::dto::job_dto::{BillAction, BillResponseRequest, ChargeRequest, QuoteAction, QuoteResponseRequest};
use crate::model::job::{ChargeSheet, Job, JobStatus, LineItem};
use crate::repository::job_repo::JobRepository;
use crate::service::payment_service::{PaymentService, PaymentServiceImpl};
use crate::util::error::ServiceError;
use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{error, info, instrument};

use async_trait::async_trait;

/// The quote -> accept -> bill -> pay pipeline. Submissions sanitize line
/// items and compute totals server-side; responses walk the status table and
/// hand approved bills to the payment service.
#[async_trait]
pub trait BillingService: Send + Sync {
    async fn submit_quote(&self, job_id: ObjectId, technician_id: ObjectId, request: ChargeRequest) -> Result<Job, ServiceError>;
    async fn respond_to_quote(&self, job_id: ObjectId, customer_id: ObjectId, request: QuoteResponseRequest) -> Result<Job, ServiceError>;
    async fn submit_bill(&self, job_id: ObjectId, technician_id: ObjectId, request: ChargeRequest) -> Result<Job, ServiceError>;
    async fn respond_to_bill(&self, job_id: ObjectId, customer_id: ObjectId, request: BillResponseRequest) -> Result<Job, ServiceError>;
}

pub struct BillingServiceImpl {
    pub job_repo: Arc<dyn JobRepository>,
    pub payments: Arc<PaymentServiceImpl>,
}

impl BillingServiceImpl {
    pub fn new(job_repo: Arc<dyn JobRepository>, payments: Arc<PaymentServiceImpl>) -> Self {
        BillingServiceImpl { job_repo, payments }
    }

    fn build_sheet(request: ChargeRequest) -> ChargeSheet {
        let items = request
            .items
            .into_iter()
            .map(|item| LineItem {
                description: item.description,
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: item.total,
                is_custom: item.is_custom,
                is_note: item.is_note,
            })
            .collect();
        ChargeSheet::new(items, request.labor_amount, request.note, request.photos, request.voice_note)
    }

    /// Shared precondition for quote/bill submission: the caller must be the
    /// assigned technician and the status table must allow the move.
    async fn job_for_submission(
        &self,
        job_id: ObjectId,
        technician_id: ObjectId,
        target: JobStatus,
    ) -> Result<Job, ServiceError> {
        let job = self.job_repo.get_by_id(job_id).await?;
        if job.technician_id != Some(technician_id) {
            error!("Technician {} is not assigned to job {}", technician_id, job_id);
            return Err(ServiceError::Forbidden("Job is assigned to another technician".to_string()));
        }
        if !job.status.can_transition_to(target) {
            error!("Job {} cannot move from {} to {}", job_id, job.status, target);
            return Err(ServiceError::Conflict(format!(
                "Job cannot move from status {} to {}",
                job.status, target
            )));
        }
        Ok(job)
    }
}

#[async_trait]
impl BillingService for BillingServiceImpl {
    #[instrument(skip(self, request), fields(job_id = %job_id, technician_id = %technician_id))]
    async fn submit_quote(&self, job_id: ObjectId, technician_id: ObjectId, request: ChargeRequest) -> Result<Job, ServiceError> {
        info!("Submitting quote");
        self.job_for_submission(job_id, technician_id, JobStatus::QuotePending).await?;

        let sheet = Self::build_sheet(request);
        info!(total_amount = sheet.total_amount, "Quote total computed");

        // Pending is only reachable here for direct jobs: a broadcast job in
        // pending has no assignee and already failed the technician check.
        let res = self
            .job_repo
            .store_quote(
                job_id,
                technician_id,
                &[JobStatus::Pending, JobStatus::Accepted, JobStatus::QuotePending],
                sheet,
            )
            .await;
        match &res {
            Ok(_) => info!("Quote submitted successfully"),
            Err(e) => error!("Failed to submit quote: {e}"),
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self), fields(job_id = %job_id, customer_id = %customer_id, action = ?request.action))]
    async fn respond_to_quote(&self, job_id: ObjectId, customer_id: ObjectId, request: QuoteResponseRequest) -> Result<Job, ServiceError> {
        info!("Responding to quote");
        let job = self.job_repo.get_by_id(job_id).await?;
        if job.customer_id != customer_id {
            error!("Customer does not own job {}", job_id);
            return Err(ServiceError::Forbidden("Job belongs to another customer".to_string()));
        }
        if job.status != JobStatus::QuotePending {
            error!("Job {} has no pending quote (status {})", job_id, job.status);
            return Err(ServiceError::Conflict(format!(
                "Job has no pending quote (status {})",
                job.status
            )));
        }

        let next = match request.action {
            QuoteAction::Accept | QuoteAction::AcceptWithParts => JobStatus::InProgress,
            // Back to renegotiation; the technician may quote again.
            QuoteAction::Reject => JobStatus::Accepted,
        };
        let res = self
            .job_repo
            .update_status(job_id, &[JobStatus::QuotePending], next)
            .await;
        match &res {
            Ok(job) => info!("Quote response applied, job now {}", job.status),
            Err(e) => error!("Failed to respond to quote: {e}"),
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self, request), fields(job_id = %job_id, technician_id = %technician_id))]
    async fn submit_bill(&self, job_id: ObjectId, technician_id: ObjectId, request: ChargeRequest) -> Result<Job, ServiceError> {
        info!("Submitting bill");
        self.job_for_submission(job_id, technician_id, JobStatus::BillingPending).await?;

        let sheet = Self::build_sheet(request);
        info!(total_amount = sheet.total_amount, "Bill total computed");

        let res = self
            .job_repo
            .store_bill(
                job_id,
                technician_id,
                &[JobStatus::InProgress, JobStatus::BillingPending],
                sheet,
            )
            .await;
        match &res {
            Ok(_) => info!("Bill submitted successfully"),
            Err(e) => error!("Failed to submit bill: {e}"),
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self), fields(job_id = %job_id, customer_id = %customer_id, action = ?request.action))]
    async fn respond_to_bill(&self, job_id: ObjectId, customer_id: ObjectId, request: BillResponseRequest) -> Result<Job, ServiceError> {
        info!("Responding to bill");
        let job = self.job_repo.get_by_id(job_id).await?;
        if job.customer_id != customer_id {
            error!("Customer does not own job {}", job_id);
            return Err(ServiceError::Forbidden("Job belongs to another customer".to_string()));
        }
        if job.status != JobStatus::BillingPending {
            error!("Job {} has no pending bill (status {})", job_id, job.status);
            return Err(ServiceError::Conflict(format!(
                "Job has no pending bill (status {})",
                job.status
            )));
        }

        match request.action {
            BillAction::Approve => {
                let method = request.payment_method.ok_or_else(|| {
                    error!("Bill approval without a payment method");
                    ServiceError::InvalidInput("Approving a bill requires a paymentMethod".to_string())
                })?;
                self.payments.settle(&job, method).await
            }
            BillAction::Reject => {
                // Back to the work phase; the technician may re-bill.
                let res = self
                    .job_repo
                    .update_status(job_id, &[JobStatus::BillingPending], JobStatus::InProgress)
                    .await;
                match &res {
                    Ok(_) => info!("Bill rejected, job back in progress"),
                    Err(e) => error!("Failed to reject bill: {e}"),
                }
                res.map_err(ServiceError::from)
            }
        }
    }
}
