use crate::config::mongo_conf::MongoConfig;
use crate::model::job::{ChargeSheet, Job, JobStatus};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson};
use futures::stream::StreamExt; // For next on MongoDB cursor
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Persistence seam for jobs. Every mutation past creation is conditional:
/// `assign` compare-and-sets the technician field, the rest compare-and-set
/// the status, so concurrent writers resolve to exactly one winner.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: Job) -> RepositoryResult<Job>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Job>;
    /// Non-terminal jobs assigned to this technician (direct or accepted).
    async fn list_assigned_to(&self, technician_id: ObjectId) -> RepositoryResult<Vec<Job>>;
    /// Broadcast jobs nobody has accepted yet; the same set for every caller.
    async fn list_open_broadcast(&self) -> RepositoryResult<Vec<Job>>;
    /// The customer's jobs that are not completed. Strictly `!= completed`:
    /// cancelled jobs stay visible, hiding them is client-side presentation.
    async fn list_active_for_customer(&self, customer_id: ObjectId) -> RepositoryResult<Vec<Job>>;
    /// First-acceptance-wins claim of an open broadcast job.
    async fn assign(&self, id: ObjectId, technician_id: ObjectId) -> RepositoryResult<Job>;
    /// Moves `status` to `to` only while it is one of `from`.
    async fn update_status(&self, id: ObjectId, from: &[JobStatus], to: JobStatus) -> RepositoryResult<Job>;
    /// Stores the quote and moves to `quote_pending`, guarded by assignee and `from`.
    async fn store_quote(
        &self,
        id: ObjectId,
        technician_id: ObjectId,
        from: &[JobStatus],
        sheet: ChargeSheet,
    ) -> RepositoryResult<Job>;
    /// Stores the bill and moves to `billing_pending`, guarded by assignee and `from`.
    async fn store_bill(
        &self,
        id: ObjectId,
        technician_id: ObjectId,
        from: &[JobStatus],
        sheet: ChargeSheet,
    ) -> RepositoryResult<Job>;
}

fn status_filter(from: &[JobStatus]) -> Vec<String> {
    from.iter().map(|s| s.as_str().to_string()).collect()
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub struct MongoJobRepository {
    collection: mongodb::Collection<Job>,
}

impl MongoJobRepository {
    /// Create a new MongoJobRepository using MongoConfig
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        use mongodb::{
            options::{ClientOptions, Credential, ResolverConfig},
            Client,
        };

        let mut client_options =
            ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare()).await?;
        client_options.app_name = Some("MekanixBackend".to_string());
        client_options.max_pool_size = Some(config.pool_size);
        client_options.connect_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));

        if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
            client_options.credential = Some(
                Credential::builder()
                    .username(username.clone())
                    .password(password.clone())
                    .build(),
            );
        }

        let client = Client::with_options(client_options)?;
        let db = client.database(&config.database);
        let collection_name = config.job_collection.as_deref().unwrap_or("jobs");
        let collection = db.collection::<Job>(collection_name);
        Ok(MongoJobRepository { collection })
    }

    async fn drain_cursor(
        &self,
        cursor: Result<mongodb::Cursor<Job>, mongodb::error::Error>,
    ) -> RepositoryResult<Vec<Job>> {
        match cursor {
            Ok(mut cursor) => {
                let mut jobs = Vec::new();
                while let Some(job) = cursor.next().await {
                    match job {
                        Ok(j) => jobs.push(j),
                        Err(e) => {
                            error!("Failed to deserialize job: {}", e);
                            return Err(RepositoryError::serialization(format!(
                                "Failed to deserialize job: {}",
                                e
                            )));
                        }
                    }
                }
                Ok(jobs)
            }
            Err(e) => {
                error!("Failed to query jobs: {}", e);
                Err(RepositoryError::database(format!("Failed to query jobs: {}", e)))
            }
        }
    }

    /// Disambiguate a conditional update that matched nothing.
    async fn missing_or_conflict(&self, id: ObjectId, conflict_msg: &str) -> RepositoryError {
        match self.collection.find_one(doc! { "_id": id }, None).await {
            Ok(Some(_)) => RepositoryError::conflict(format!("{} (job {})", conflict_msg, id)),
            Ok(None) => RepositoryError::not_found(format!("Job not found for ID: {}", id)),
            Err(e) => RepositoryError::database(format!("Failed to fetch job by ID: {}", e)),
        }
    }

    fn after_options() -> mongodb::options::FindOneAndUpdateOptions {
        mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build()
    }
}

#[async_trait]
impl JobRepository for MongoJobRepository {
    #[tracing::instrument(skip(self, job), fields(customer_id = %job.customer_id))]
    async fn create(&self, job: Job) -> RepositoryResult<Job> {
        info!(is_broadcast = job.is_broadcast, "Creating new job");
        let mut new_job = job;
        new_job.id = Some(ObjectId::new());
        let time = now_rfc3339();
        new_job.created_at = Some(time.clone());
        new_job.updated_at = Some(time);

        match self.collection.insert_one(new_job.clone(), None).await {
            Ok(_) => {
                info!("Job created successfully");
                Ok(new_job)
            }
            Err(e) => {
                error!("Failed to create job: {}", e);
                Err(RepositoryError::database(format!("Failed to create job: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Job> {
        let filter = doc! { "_id": id };
        match self.collection.find_one(filter, None).await {
            Ok(Some(job)) => Ok(job),
            Ok(None) => {
                error!("Job not found for ID: {}", id);
                Err(RepositoryError::not_found(format!("Job not found for ID: {}", id)))
            }
            Err(e) => {
                error!("Failed to fetch job by ID: {}", e);
                Err(RepositoryError::database(format!("Failed to fetch job by ID: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(technician_id = %technician_id))]
    async fn list_assigned_to(&self, technician_id: ObjectId) -> RepositoryResult<Vec<Job>> {
        info!("Listing jobs assigned to technician");
        let filter = doc! {
            "technicianId": technician_id,
            "status": { "$nin": status_filter(&[JobStatus::Completed, JobStatus::Cancelled]) },
        };
        let jobs = self.drain_cursor(self.collection.find(filter, None).await).await?;
        info!("Fetched {} assigned jobs", jobs.len());
        Ok(jobs)
    }

    #[tracing::instrument(skip(self))]
    async fn list_open_broadcast(&self) -> RepositoryResult<Vec<Job>> {
        info!("Listing open broadcast jobs");
        let filter = doc! {
            "isBroadcast": true,
            "technicianId": Bson::Null,
            "status": JobStatus::Pending.as_str(),
        };
        let jobs = self.drain_cursor(self.collection.find(filter, None).await).await?;
        info!("Fetched {} open broadcast jobs", jobs.len());
        Ok(jobs)
    }

    #[tracing::instrument(skip(self), fields(customer_id = %customer_id))]
    async fn list_active_for_customer(&self, customer_id: ObjectId) -> RepositoryResult<Vec<Job>> {
        info!("Listing active jobs for customer");
        let filter = doc! {
            "customerId": customer_id,
            "status": { "$ne": JobStatus::Completed.as_str() },
        };
        let jobs = self.drain_cursor(self.collection.find(filter, None).await).await?;
        info!("Fetched {} active jobs", jobs.len());
        Ok(jobs)
    }

    #[tracing::instrument(skip(self), fields(id = %id, technician_id = %technician_id))]
    async fn assign(&self, id: ObjectId, technician_id: ObjectId) -> RepositoryResult<Job> {
        info!("Claiming broadcast job for technician");
        // The filter is the whole race: only an open, unclaimed broadcast job
        // matches, so the first acceptance wins and later ones match nothing.
        let filter = doc! {
            "_id": id,
            "isBroadcast": true,
            "technicianId": Bson::Null,
            "status": JobStatus::Pending.as_str(),
        };
        let update = doc! {
            "$set": {
                "technicianId": technician_id,
                "status": JobStatus::Accepted.as_str(),
                "updatedAt": now_rfc3339(),
            }
        };
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_options())
            .await
        {
            Ok(Some(job)) => {
                info!("Job claimed successfully");
                Ok(job)
            }
            Ok(None) => {
                let err = self.missing_or_conflict(id, "Job is not open for acceptance").await;
                error!("Failed to claim job: {}", err);
                Err(err)
            }
            Err(e) => {
                error!("Failed to claim job: {}", e);
                Err(RepositoryError::database(format!("Failed to claim job: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id, to = %to))]
    async fn update_status(&self, id: ObjectId, from: &[JobStatus], to: JobStatus) -> RepositoryResult<Job> {
        info!("Updating job status");
        let filter = doc! {
            "_id": id,
            "status": { "$in": status_filter(from) },
        };
        let update = doc! {
            "$set": { "status": to.as_str(), "updatedAt": now_rfc3339() }
        };
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_options())
            .await
        {
            Ok(Some(job)) => {
                info!("Job status updated successfully");
                Ok(job)
            }
            Ok(None) => {
                let err = self
                    .missing_or_conflict(id, "Job status no longer permits this transition")
                    .await;
                error!("Failed to update job status: {}", err);
                Err(err)
            }
            Err(e) => {
                error!("Failed to update job status: {}", e);
                Err(RepositoryError::database(format!("Failed to update job status: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self, sheet), fields(id = %id, technician_id = %technician_id))]
    async fn store_quote(
        &self,
        id: ObjectId,
        technician_id: ObjectId,
        from: &[JobStatus],
        sheet: ChargeSheet,
    ) -> RepositoryResult<Job> {
        info!(total_amount = sheet.total_amount, "Storing quote");
        let sheet_bson = bson::to_bson(&sheet)?;
        let filter = doc! {
            "_id": id,
            "technicianId": technician_id,
            "status": { "$in": status_filter(from) },
        };
        let update = doc! {
            "$set": {
                "quote": sheet_bson,
                "status": JobStatus::QuotePending.as_str(),
                "updatedAt": now_rfc3339(),
            }
        };
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_options())
            .await
        {
            Ok(Some(job)) => {
                info!("Quote stored successfully");
                Ok(job)
            }
            Ok(None) => {
                let err = self
                    .missing_or_conflict(id, "Job is not quotable by this technician")
                    .await;
                error!("Failed to store quote: {}", err);
                Err(err)
            }
            Err(e) => {
                error!("Failed to store quote: {}", e);
                Err(RepositoryError::database(format!("Failed to store quote: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self, sheet), fields(id = %id, technician_id = %technician_id))]
    async fn store_bill(
        &self,
        id: ObjectId,
        technician_id: ObjectId,
        from: &[JobStatus],
        sheet: ChargeSheet,
    ) -> RepositoryResult<Job> {
        info!(total_amount = sheet.total_amount, "Storing bill");
        let sheet_bson = bson::to_bson(&sheet)?;
        let filter = doc! {
            "_id": id,
            "technicianId": technician_id,
            "status": { "$in": status_filter(from) },
        };
        let update = doc! {
            "$set": {
                "bill": sheet_bson,
                "status": JobStatus::BillingPending.as_str(),
                "updatedAt": now_rfc3339(),
            }
        };
        match self
            .collection
            .find_one_and_update(filter, update, Self::after_options())
            .await
        {
            Ok(Some(job)) => {
                info!("Bill stored successfully");
                Ok(job)
            }
            Ok(None) => {
                let err = self
                    .missing_or_conflict(id, "Job is not billable by this technician")
                    .await;
                error!("Failed to store bill: {}", err);
                Err(err)
            }
            Err(e) => {
                error!("Failed to store bill: {}", e);
                Err(RepositoryError::database(format!("Failed to store bill: {}", e)))
            }
        }
    }
}

/// In-memory implementation backing the test suite and local development.
/// Mutations take the write lock for their whole check-and-set, which gives
/// the same single-winner guarantee the Mongo filters do.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<ObjectId, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: Job) -> RepositoryResult<Job> {
        let mut new_job = job;
        let id = ObjectId::new();
        new_job.id = Some(id);
        let time = now_rfc3339();
        new_job.created_at = Some(time.clone());
        new_job.updated_at = Some(time);
        self.jobs.write().await.insert(id, new_job.clone());
        Ok(new_job)
    }

    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Job> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found(format!("Job not found for ID: {}", id)))
    }

    async fn list_assigned_to(&self, technician_id: ObjectId) -> RepositoryResult<Vec<Job>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.technician_id == Some(technician_id) && !job.status.is_terminal())
            .cloned()
            .collect())
    }

    async fn list_open_broadcast(&self) -> RepositoryResult<Vec<Job>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| {
                job.is_broadcast && job.technician_id.is_none() && job.status == JobStatus::Pending
            })
            .cloned()
            .collect())
    }

    async fn list_active_for_customer(&self, customer_id: ObjectId) -> RepositoryResult<Vec<Job>> {
        Ok(self
            .jobs
            .read()
            .await
            .values()
            .filter(|job| job.customer_id == customer_id && job.status != JobStatus::Completed)
            .cloned()
            .collect())
    }

    async fn assign(&self, id: ObjectId, technician_id: ObjectId) -> RepositoryResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Job not found for ID: {}", id)))?;
        if !job.is_broadcast || job.technician_id.is_some() || job.status != JobStatus::Pending {
            return Err(RepositoryError::conflict(format!(
                "Job is not open for acceptance (job {})",
                id
            )));
        }
        job.technician_id = Some(technician_id);
        job.status = JobStatus::Accepted;
        job.updated_at = Some(now_rfc3339());
        Ok(job.clone())
    }

    async fn update_status(&self, id: ObjectId, from: &[JobStatus], to: JobStatus) -> RepositoryResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Job not found for ID: {}", id)))?;
        if !from.contains(&job.status) {
            return Err(RepositoryError::conflict(format!(
                "Job status no longer permits this transition (job {})",
                id
            )));
        }
        job.status = to;
        job.updated_at = Some(now_rfc3339());
        Ok(job.clone())
    }

    async fn store_quote(
        &self,
        id: ObjectId,
        technician_id: ObjectId,
        from: &[JobStatus],
        sheet: ChargeSheet,
    ) -> RepositoryResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Job not found for ID: {}", id)))?;
        if job.technician_id != Some(technician_id) || !from.contains(&job.status) {
            return Err(RepositoryError::conflict(format!(
                "Job is not quotable by this technician (job {})",
                id
            )));
        }
        job.quote = Some(sheet);
        job.status = JobStatus::QuotePending;
        job.updated_at = Some(now_rfc3339());
        Ok(job.clone())
    }

    async fn store_bill(
        &self,
        id: ObjectId,
        technician_id: ObjectId,
        from: &[JobStatus],
        sheet: ChargeSheet,
    ) -> RepositoryResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found(format!("Job not found for ID: {}", id)))?;
        if job.technician_id != Some(technician_id) || !from.contains(&job.status) {
            return Err(RepositoryError::conflict(format!(
                "Job is not billable by this technician (job {})",
                id
            )));
        }
        job.bill = Some(sheet);
        job.status = JobStatus::BillingPending;
        job.updated_at = Some(now_rfc3339());
        Ok(job.clone())
    }
}
