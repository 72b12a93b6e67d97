use crate::dto::job_dto::{CreateJobRequest, TechnicianJobsResponse};
use crate::model::job::{Job, JobStatus};
use crate::repository::job_repo::JobRepository;
use crate::util::error::ServiceError;
use bson::oid::ObjectId;
use std::sync::Arc;
use tracing::{error, info, instrument};

use async_trait::async_trait;

/// Job dispatch: creation (direct vs. broadcast), the per-technician
/// my/available partition, broadcast acceptance, cancellation, and the
/// customer's active-job view.
#[async_trait]
pub trait DispatchService: Send + Sync {
    async fn create_job(&self, customer_id: ObjectId, request: CreateJobRequest) -> Result<Job, ServiceError>;
    async fn jobs_for_technician(&self, technician_id: ObjectId) -> Result<TechnicianJobsResponse, ServiceError>;
    async fn accept_job(&self, job_id: ObjectId, technician_id: ObjectId) -> Result<Job, ServiceError>;
    async fn cancel_job(&self, job_id: ObjectId, customer_id: ObjectId) -> Result<Job, ServiceError>;
    async fn active_jobs(&self, customer_id: ObjectId) -> Result<Vec<Job>, ServiceError>;
}

pub struct DispatchServiceImpl {
    pub job_repo: Arc<dyn JobRepository>,
}

impl DispatchServiceImpl {
    pub fn new(job_repo: Arc<dyn JobRepository>) -> Self {
        DispatchServiceImpl { job_repo }
    }
}

#[async_trait]
impl DispatchService for DispatchServiceImpl {
    #[instrument(skip(self, request), fields(customer_id = %customer_id, is_broadcast = request.is_broadcast))]
    async fn create_job(&self, customer_id: ObjectId, request: CreateJobRequest) -> Result<Job, ServiceError> {
        info!("Creating job");

        let vehicle_id = ObjectId::parse_str(&request.vehicle_id)
            .map_err(|_| ServiceError::InvalidInput("Invalid vehicleId".to_string()))?;

        // Direct jobs carry their assignee from creation; broadcast jobs
        // ignore any technician the client supplied.
        let technician_id = if request.is_broadcast {
            None
        } else {
            let raw = request.technician_id.as_deref().ok_or_else(|| {
                error!("Direct job created without a technician");
                ServiceError::InvalidInput("Direct jobs require a technicianId".to_string())
            })?;
            Some(
                ObjectId::parse_str(raw)
                    .map_err(|_| ServiceError::InvalidInput("Invalid technicianId".to_string()))?,
            )
        };

        let job = Job {
            id: None,
            customer_id,
            vehicle_id,
            description: request.description,
            service_type: request.service_type,
            service_method: request.service_method,
            is_broadcast: request.is_broadcast,
            technician_id,
            status: JobStatus::Pending,
            location: request.location,
            quote: None,
            bill: None,
            created_at: None,
            updated_at: None,
        };

        let res = self.job_repo.create(job).await;
        match &res {
            Ok(_) => info!("Job created successfully"),
            Err(e) => error!("Failed to create job: {e}"),
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self), fields(technician_id = %technician_id))]
    async fn jobs_for_technician(&self, technician_id: ObjectId) -> Result<TechnicianJobsResponse, ServiceError> {
        info!("Listing jobs for technician");
        let my_jobs = self.job_repo.list_assigned_to(technician_id).await?;
        let available = self.job_repo.list_open_broadcast().await?;
        info!("Fetched {} assigned and {} available jobs", my_jobs.len(), available.len());
        Ok(TechnicianJobsResponse { my_jobs, available })
    }

    #[instrument(skip(self), fields(job_id = %job_id, technician_id = %technician_id))]
    async fn accept_job(&self, job_id: ObjectId, technician_id: ObjectId) -> Result<Job, ServiceError> {
        info!("Accepting broadcast job");
        let res = self.job_repo.assign(job_id, technician_id).await;
        match &res {
            Ok(_) => info!("Job accepted successfully"),
            Err(e) => error!("Failed to accept job: {e}"),
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self), fields(job_id = %job_id, customer_id = %customer_id))]
    async fn cancel_job(&self, job_id: ObjectId, customer_id: ObjectId) -> Result<Job, ServiceError> {
        info!("Cancelling job");
        let job = self.job_repo.get_by_id(job_id).await?;
        if job.customer_id != customer_id {
            error!("Customer does not own job {}", job_id);
            return Err(ServiceError::Forbidden("Job belongs to another customer".to_string()));
        }
        if !job.status.can_transition_to(JobStatus::Cancelled) {
            error!("Job {} is not cancellable from {}", job_id, job.status);
            return Err(ServiceError::Conflict(format!(
                "Job cannot be cancelled from status {}",
                job.status
            )));
        }
        let res = self
            .job_repo
            .update_status(job_id, &[JobStatus::Pending, JobStatus::Accepted], JobStatus::Cancelled)
            .await;
        match &res {
            Ok(_) => info!("Job cancelled successfully"),
            Err(e) => error!("Failed to cancel job: {e}"),
        }
        res.map_err(ServiceError::from)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn active_jobs(&self, customer_id: ObjectId) -> Result<Vec<Job>, ServiceError> {
        info!("Listing active jobs for customer");
        let res = self.job_repo.list_active_for_customer(customer_id).await;
        match &res {
            Ok(jobs) => info!("Fetched {} active jobs", jobs.len()),
            Err(e) => error!("Failed to list active jobs: {e}"),
        }
        res.map_err(ServiceError::from)
    }
}
