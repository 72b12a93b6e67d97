use bson::oid::ObjectId;
use mekanix_backend::dto::job_dto::CreateJobRequest;
use mekanix_backend::model::job::{JobStatus, Location, ServiceMethod, ServiceType};
use mekanix_backend::repository::job_repo::{InMemoryJobRepository, JobRepository};
use mekanix_backend::service::dispatch_service::{DispatchService, DispatchServiceImpl};
use mekanix_backend::util::error::ServiceError;
use std::sync::Arc;

fn setup_service() -> DispatchServiceImpl {
    let job_repo: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
    DispatchServiceImpl::new(job_repo)
}

fn test_location() -> Location {
    Location {
        latitude: 6.9271,
        longitude: 79.8612,
        address: "123 Galle Road, Colombo".to_string(),
    }
}

fn direct_request(technician_id: &ObjectId) -> CreateJobRequest {
    CreateJobRequest {
        vehicle_id: ObjectId::new().to_hex(),
        description: "Brake pads grinding, needs replacement".to_string(),
        service_type: ServiceType::Repairs,
        service_method: ServiceMethod::WalkIn,
        is_broadcast: false,
        technician_id: Some(technician_id.to_hex()),
        location: test_location(),
    }
}

fn broadcast_request() -> CreateJobRequest {
    CreateJobRequest {
        vehicle_id: ObjectId::new().to_hex(),
        description: "Engine overheating on the highway".to_string(),
        service_type: ServiceType::Repairs,
        service_method: ServiceMethod::OnSpot,
        is_broadcast: true,
        technician_id: None,
        location: test_location(),
    }
}

#[tokio::test]
async fn test_direct_job_assigned_at_creation() {
    let service = setup_service();
    let customer = ObjectId::new();
    let technician = ObjectId::new();

    let job = service.create_job(customer, direct_request(&technician)).await.unwrap();

    assert_eq!(job.technician_id, Some(technician));
    assert_eq!(job.status, JobStatus::Pending);
    assert!(!job.is_broadcast);
    assert!(job.id.is_some());
}

#[tokio::test]
async fn test_direct_job_without_technician_rejected() {
    let service = setup_service();
    let customer = ObjectId::new();

    let mut request = broadcast_request();
    request.is_broadcast = false;
    request.technician_id = None;

    let err = service.create_job(customer, request).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn test_broadcast_job_ignores_supplied_technician() {
    let service = setup_service();
    let customer = ObjectId::new();

    let mut request = broadcast_request();
    request.technician_id = Some(ObjectId::new().to_hex());

    let job = service.create_job(customer, request).await.unwrap();
    assert_eq!(job.technician_id, None);
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.is_broadcast);
}

#[tokio::test]
async fn test_direct_job_visible_only_to_assignee() {
    let service = setup_service();
    let customer = ObjectId::new();
    let assignee = ObjectId::new();
    let other = ObjectId::new();

    let job = service.create_job(customer, direct_request(&assignee)).await.unwrap();

    let assignee_view = service.jobs_for_technician(assignee).await.unwrap();
    assert_eq!(assignee_view.my_jobs.len(), 1);
    assert_eq!(assignee_view.my_jobs[0].id, job.id);
    assert!(assignee_view.available.is_empty());

    // Another technician sees the job in neither set
    let other_view = service.jobs_for_technician(other).await.unwrap();
    assert!(other_view.my_jobs.is_empty());
    assert!(other_view.available.is_empty());
}

#[tokio::test]
async fn test_broadcast_job_available_to_everyone_until_accepted() {
    let service = setup_service();
    let customer = ObjectId::new();
    let tech_a = ObjectId::new();
    let tech_b = ObjectId::new();

    let job = service.create_job(customer, broadcast_request()).await.unwrap();
    let job_id = job.id.unwrap();

    for tech in [tech_a, tech_b] {
        let view = service.jobs_for_technician(tech).await.unwrap();
        assert!(view.my_jobs.is_empty());
        assert_eq!(view.available.len(), 1);
        assert_eq!(view.available[0].technician_id, None);
    }

    let accepted = service.accept_job(job_id, tech_b).await.unwrap();
    assert_eq!(accepted.status, JobStatus::Accepted);
    assert_eq!(accepted.technician_id, Some(tech_b));

    // Accepted job moves to the acceptor's my_jobs and leaves everyone's available
    let b_view = service.jobs_for_technician(tech_b).await.unwrap();
    assert_eq!(b_view.my_jobs.len(), 1);
    assert!(b_view.available.is_empty());

    let a_view = service.jobs_for_technician(tech_a).await.unwrap();
    assert!(a_view.my_jobs.is_empty());
    assert!(a_view.available.is_empty());
}

#[tokio::test]
async fn test_concurrent_acceptance_has_single_winner() {
    let service = Arc::new(setup_service());
    let customer = ObjectId::new();
    let tech_a = ObjectId::new();
    let tech_b = ObjectId::new();

    let job = service.create_job(customer, broadcast_request()).await.unwrap();
    let job_id = job.id.unwrap();

    let (res_a, res_b) = tokio::join!(
        service.accept_job(job_id, tech_a),
        service.accept_job(job_id, tech_b),
    );

    assert_eq!(res_a.is_ok() as u8 + res_b.is_ok() as u8, 1);

    let winner = if res_a.is_ok() { tech_a } else { tech_b };
    let loser_res = if res_a.is_ok() { res_b } else { res_a };
    assert!(matches!(loser_res.unwrap_err(), ServiceError::Conflict(_)));

    // The winner's assignment is never overwritten
    let view = service.jobs_for_technician(winner).await.unwrap();
    assert_eq!(view.my_jobs.len(), 1);
    assert_eq!(view.my_jobs[0].technician_id, Some(winner));
}

#[tokio::test]
async fn test_acceptance_after_winner_keeps_first_assignee() {
    let service = setup_service();
    let customer = ObjectId::new();
    let first = ObjectId::new();
    let second = ObjectId::new();

    let job = service.create_job(customer, broadcast_request()).await.unwrap();
    let job_id = job.id.unwrap();

    service.accept_job(job_id, first).await.unwrap();
    let err = service.accept_job(job_id, second).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let view = service.jobs_for_technician(first).await.unwrap();
    assert_eq!(view.my_jobs[0].technician_id, Some(first));
}

#[tokio::test]
async fn test_direct_job_cannot_be_accepted() {
    let service = setup_service();
    let customer = ObjectId::new();
    let assignee = ObjectId::new();
    let poacher = ObjectId::new();

    let job = service.create_job(customer, direct_request(&assignee)).await.unwrap();
    let err = service.accept_job(job.id.unwrap(), poacher).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_cancel_job_by_owner() {
    let service = setup_service();
    let customer = ObjectId::new();

    let job = service.create_job(customer, broadcast_request()).await.unwrap();
    let cancelled = service.cancel_job(job.id.unwrap(), customer).await.unwrap();
    assert_eq!(cancelled.status, JobStatus::Cancelled);

    // Only completion removes a job from the active view; the cancelled job
    // stays listed, carrying its terminal status
    let active = service.active_jobs(customer).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].status, JobStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_job_by_non_owner_forbidden() {
    let service = setup_service();
    let customer = ObjectId::new();
    let stranger = ObjectId::new();

    let job = service.create_job(customer, broadcast_request()).await.unwrap();
    let err = service.cancel_job(job.id.unwrap(), stranger).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let service = setup_service();
    let err = service.accept_job(ObjectId::new(), ObjectId::new()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
