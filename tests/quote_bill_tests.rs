use bson::oid::ObjectId;
use mekanix_backend::dto::job_dto::{
    BillAction, BillResponseRequest, ChargeRequest, CreateJobRequest, LineItemRequest, QuoteAction,
    QuoteResponseRequest,
};
use mekanix_backend::model::job::{JobStatus, Location, ServiceMethod, ServiceType};
use mekanix_backend::repository::job_repo::{InMemoryJobRepository, JobRepository};
use mekanix_backend::repository::wallet_repo::{InMemoryWalletRepository, WalletRepository};
use mekanix_backend::service::billing_service::{BillingService, BillingServiceImpl};
use mekanix_backend::service::dispatch_service::{DispatchService, DispatchServiceImpl};
use mekanix_backend::service::payment_service::PaymentServiceImpl;
use mekanix_backend::util::error::ServiceError;
use std::sync::Arc;

struct TestHarness {
    dispatch: DispatchServiceImpl,
    billing: BillingServiceImpl,
}

fn setup() -> TestHarness {
    let job_repo: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
    let wallet_repo: Arc<dyn WalletRepository> = Arc::new(InMemoryWalletRepository::new());
    let payments = Arc::new(PaymentServiceImpl::new(job_repo.clone(), wallet_repo));
    TestHarness {
        dispatch: DispatchServiceImpl::new(job_repo.clone()),
        billing: BillingServiceImpl::new(job_repo, payments),
    }
}

fn job_request(is_broadcast: bool, technician_id: Option<&ObjectId>) -> CreateJobRequest {
    CreateJobRequest {
        vehicle_id: ObjectId::new().to_hex(),
        description: "Full service and oil change".to_string(),
        service_type: ServiceType::Maintenance,
        service_method: if is_broadcast { ServiceMethod::OnSpot } else { ServiceMethod::WalkIn },
        is_broadcast,
        technician_id: technician_id.map(|id| id.to_hex()),
        location: Location {
            latitude: 6.9271,
            longitude: 79.8612,
            address: "123 Galle Road, Colombo".to_string(),
        },
    }
}

fn item(description: &str, unit_price: i64, is_note: bool) -> LineItemRequest {
    LineItemRequest {
        description: description.to_string(),
        quantity: 1,
        unit_price,
        total: unit_price,
        is_custom: false,
        is_note,
    }
}

fn standard_charge() -> ChargeRequest {
    ChargeRequest {
        items: vec![
            item("Service fee", 199, false),
            item("Oil filter", 350, false),
            item("Customer brings own oil", 9999, true),
        ],
        labor_amount: 500,
        note: Some("Filter was heavily clogged".to_string()),
        photos: vec!["uploads/jobs/engine-bay.jpg".to_string()],
        voice_note: None,
    }
}

/// Creates a broadcast job and accepts it, returning (job_id, customer, technician).
async fn accepted_job(harness: &TestHarness) -> (ObjectId, ObjectId, ObjectId) {
    let customer = ObjectId::new();
    let technician = ObjectId::new();
    let job = harness
        .dispatch
        .create_job(customer, job_request(true, None))
        .await
        .unwrap();
    let job_id = job.id.unwrap();
    harness.dispatch.accept_job(job_id, technician).await.unwrap();
    (job_id, customer, technician)
}

#[tokio::test]
async fn test_quote_sanitizes_note_items_and_computes_total() {
    let harness = setup();
    let (job_id, _, technician) = accepted_job(&harness).await;

    let job = harness
        .billing
        .submit_quote(job_id, technician, standard_charge())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::QuotePending);
    let quote = job.quote.unwrap();
    assert_eq!(quote.total_amount, 1049);
    assert_eq!(quote.labor_amount, 500);
    // Note item is kept, at its position, with price forced to zero
    assert_eq!(quote.items.len(), 3);
    assert_eq!(quote.items[2].description, "Customer brings own oil");
    assert_eq!(quote.items[2].total, 0);
    assert_eq!(quote.items[2].unit_price, 0);
    assert!(quote.items[2].is_note);
}

#[tokio::test]
async fn test_direct_job_quotable_from_pending_by_assignee() {
    let harness = setup();
    let customer = ObjectId::new();
    let technician = ObjectId::new();

    let job = harness
        .dispatch
        .create_job(customer, job_request(false, Some(&technician)))
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    let quoted = harness
        .billing
        .submit_quote(job.id.unwrap(), technician, standard_charge())
        .await
        .unwrap();
    assert_eq!(quoted.status, JobStatus::QuotePending);
}

#[tokio::test]
async fn test_quote_by_unassigned_technician_forbidden() {
    let harness = setup();
    let (job_id, _, _) = accepted_job(&harness).await;
    let stranger = ObjectId::new();

    let err = harness
        .billing
        .submit_quote(job_id, stranger, standard_charge())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_quote_resubmission_overwrites_previous() {
    let harness = setup();
    let (job_id, _, technician) = accepted_job(&harness).await;

    harness
        .billing
        .submit_quote(job_id, technician, standard_charge())
        .await
        .unwrap();

    let revised = ChargeRequest {
        items: vec![item("Service fee", 250, false)],
        labor_amount: 400,
        note: None,
        photos: Vec::new(),
        voice_note: None,
    };
    let job = harness
        .billing
        .submit_quote(job_id, technician, revised)
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::QuotePending);
    let quote = job.quote.unwrap();
    assert_eq!(quote.items.len(), 1);
    assert_eq!(quote.total_amount, 650);
}

#[tokio::test]
async fn test_quote_acceptance_moves_job_in_progress() {
    let harness = setup();
    let (job_id, customer, technician) = accepted_job(&harness).await;

    harness
        .billing
        .submit_quote(job_id, technician, standard_charge())
        .await
        .unwrap();

    let job = harness
        .billing
        .respond_to_quote(job_id, customer, QuoteResponseRequest { action: QuoteAction::AcceptWithParts })
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::InProgress);
}

#[tokio::test]
async fn test_quote_rejection_returns_to_renegotiation() {
    let harness = setup();
    let (job_id, customer, technician) = accepted_job(&harness).await;

    harness
        .billing
        .submit_quote(job_id, technician, standard_charge())
        .await
        .unwrap();

    let job = harness
        .billing
        .respond_to_quote(job_id, customer, QuoteResponseRequest { action: QuoteAction::Reject })
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::Accepted);

    // The technician may quote again after a rejection
    let requoted = harness
        .billing
        .submit_quote(job_id, technician, standard_charge())
        .await
        .unwrap();
    assert_eq!(requoted.status, JobStatus::QuotePending);
}

#[tokio::test]
async fn test_quote_response_by_non_owner_forbidden() {
    let harness = setup();
    let (job_id, _, technician) = accepted_job(&harness).await;
    let stranger = ObjectId::new();

    harness
        .billing
        .submit_quote(job_id, technician, standard_charge())
        .await
        .unwrap();

    let err = harness
        .billing
        .respond_to_quote(job_id, stranger, QuoteResponseRequest { action: QuoteAction::Accept })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_quote_response_without_pending_quote_conflicts() {
    let harness = setup();
    let (job_id, customer, _) = accepted_job(&harness).await;

    let err = harness
        .billing
        .respond_to_quote(job_id, customer, QuoteResponseRequest { action: QuoteAction::Accept })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_bill_requires_work_in_progress() {
    let harness = setup();
    let (job_id, _, technician) = accepted_job(&harness).await;

    // Billing straight from accepted is not in the transition table
    let err = harness
        .billing
        .submit_bill(job_id, technician, standard_charge())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_bill_submission_after_quote_acceptance() {
    let harness = setup();
    let (job_id, customer, technician) = accepted_job(&harness).await;

    harness
        .billing
        .submit_quote(job_id, technician, standard_charge())
        .await
        .unwrap();
    harness
        .billing
        .respond_to_quote(job_id, customer, QuoteResponseRequest { action: QuoteAction::AcceptWithParts })
        .await
        .unwrap();

    // Bill reuses the quote items; totals are computed independently
    let job = harness
        .billing
        .submit_bill(job_id, technician, standard_charge())
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::BillingPending);
    let bill = job.bill.unwrap();
    assert_eq!(bill.total_amount, 1049);
    assert_eq!(bill.items[2].total, 0);
    // The accepted quote is still on the job
    assert_eq!(job.quote.unwrap().total_amount, 1049);
}

#[tokio::test]
async fn test_bill_rejection_returns_to_in_progress() {
    let harness = setup();
    let (job_id, customer, technician) = accepted_job(&harness).await;

    harness
        .billing
        .submit_quote(job_id, technician, standard_charge())
        .await
        .unwrap();
    harness
        .billing
        .respond_to_quote(job_id, customer, QuoteResponseRequest { action: QuoteAction::Accept })
        .await
        .unwrap();
    harness
        .billing
        .submit_bill(job_id, technician, standard_charge())
        .await
        .unwrap();

    let job = harness
        .billing
        .respond_to_bill(
            job_id,
            customer,
            BillResponseRequest { action: BillAction::Reject, payment_method: None },
        )
        .await
        .unwrap();
    assert_eq!(job.status, JobStatus::InProgress);

    // Re-billing after rejection overwrites the sheet
    let rebilled = harness
        .billing
        .submit_bill(
            job_id,
            technician,
            ChargeRequest {
                items: vec![item("Service fee", 199, false)],
                labor_amount: 500,
                note: None,
                photos: Vec::new(),
                voice_note: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(rebilled.bill.unwrap().total_amount, 699);
}

#[tokio::test]
async fn test_cancel_rejected_once_quote_is_pending() {
    let harness = setup();
    let (job_id, customer, technician) = accepted_job(&harness).await;

    harness
        .billing
        .submit_quote(job_id, technician, standard_charge())
        .await
        .unwrap();

    let err = harness.dispatch.cancel_job(job_id, customer).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_labor_only_quote() {
    let harness = setup();
    let (job_id, _, technician) = accepted_job(&harness).await;

    let job = harness
        .billing
        .submit_quote(
            job_id,
            technician,
            ChargeRequest {
                items: Vec::new(),
                labor_amount: 750,
                note: None,
                photos: Vec::new(),
                voice_note: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(job.quote.unwrap().total_amount, 750);
}
