use crate::config::app_conf::AppConfig;
use axum::{routing::get, Router};
use std::sync::Arc;
use tracing::info;

pub struct App {
    config: AppConfig,
    router: Router,
}

impl App {
    pub async fn new() -> Self {
        let config = AppConfig::from_env();

        use crate::config::jwt_conf::JwtConfig;
        use crate::config::mongo_conf::MongoConfig;
        use crate::middlewares::auth_middleware::AuthState;
        use crate::repository::job_repo::{JobRepository, MongoJobRepository};
        use crate::repository::wallet_repo::{MongoWalletRepository, WalletRepository};
        use crate::router::customer_router::customer_router;
        use crate::router::technician_router::technician_router;
        use crate::service::billing_service::BillingServiceImpl;
        use crate::service::dispatch_service::DispatchServiceImpl;
        use crate::service::payment_service::PaymentServiceImpl;
        use crate::service::JobServices;
        use crate::util::jwt::JwtTokenUtilsImpl;

        let jwt_config = JwtConfig::from_env().expect("JWT config error");
        let mongo_config = MongoConfig::from_env().expect("Mongo config error");

        let jwt_utils = Arc::new(JwtTokenUtilsImpl::new(jwt_config));

        let job_repo: Arc<dyn JobRepository> = Arc::new(
            MongoJobRepository::new(&mongo_config)
                .await
                .expect("Job repo error"),
        );
        let wallet_repo: Arc<dyn WalletRepository> = Arc::new(
            MongoWalletRepository::new(&mongo_config)
                .await
                .expect("Wallet repo error"),
        );

        let payments = Arc::new(PaymentServiceImpl::new(job_repo.clone(), wallet_repo));
        let dispatch = Arc::new(DispatchServiceImpl::new(job_repo.clone()));
        let billing = Arc::new(BillingServiceImpl::new(job_repo.clone(), payments));
        let services = Arc::new(JobServices { dispatch, billing });

        let customer_auth = Arc::new(AuthState::new(jwt_utils.clone(), "customer"));
        let technician_auth = Arc::new(AuthState::new(jwt_utils, "technician"));

        let router = Router::new()
            .merge(customer_router(services.clone(), customer_auth))
            .merge(technician_router(services, technician_auth))
            .route("/health", get(|| async { "OK" }));

        App { config, router }
    }

    pub async fn start(self) {
        let addr = self.config.bind_addr().expect("Invalid listen address");
        info!("🚀 Server running at http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind address");
        axum::serve(listener, self.router).await.expect("Failed to start server");
    }
}
