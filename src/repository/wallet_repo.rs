use crate::config::mongo_conf::MongoConfig;
use crate::model::wallet::Wallet;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Customer wallet persistence. `debit` is a conditional decrement that only
/// succeeds while the balance covers the amount; `credit` also seeds wallets
/// and pays compensating refunds.
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn get_by_customer(&self, customer_id: ObjectId) -> RepositoryResult<Wallet>;
    async fn debit(&self, customer_id: ObjectId, amount: i64) -> RepositoryResult<Wallet>;
    async fn credit(&self, customer_id: ObjectId, amount: i64) -> RepositoryResult<Wallet>;
}

pub struct MongoWalletRepository {
    collection: mongodb::Collection<Wallet>,
}

impl MongoWalletRepository {
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
        let collection_name = config.wallet_collection.as_deref().unwrap_or("wallets");
        let collection = db.collection::<Wallet>(collection_name);
        Ok(MongoWalletRepository { collection })
    }
}

#[async_trait]
impl WalletRepository for MongoWalletRepository {
    #[tracing::instrument(skip(self), fields(customer_id = %customer_id))]
    async fn get_by_customer(&self, customer_id: ObjectId) -> RepositoryResult<Wallet> {
        let filter = doc! { "customerId": customer_id };
        match self.collection.find_one(filter, None).await {
            Ok(Some(wallet)) => Ok(wallet),
            Ok(None) => {
                error!("Wallet not found for customer: {}", customer_id);
                Err(RepositoryError::not_found(format!(
                    "Wallet not found for customer: {}",
                    customer_id
                )))
            }
            Err(e) => {
                error!("Failed to fetch wallet: {}", e);
                Err(RepositoryError::database(format!("Failed to fetch wallet: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(customer_id = %customer_id, amount = amount))]
    async fn debit(&self, customer_id: ObjectId, amount: i64) -> RepositoryResult<Wallet> {
        info!("Debiting customer wallet");
        if amount < 0 {
            return Err(RepositoryError::validation("Debit amount must not be negative".to_string()));
        }
        // Balance guard and decrement in one conditional update; a short
        // balance simply matches nothing.
        let filter = doc! {
            "customerId": customer_id,
            "balance": { "$gte": amount },
        };
        let update = doc! { "$inc": { "balance": -amount } };
        let options = mongodb::options::FindOneAndUpdateOptions::builder()
            .return_document(mongodb::options::ReturnDocument::After)
            .build();
        match self.collection.find_one_and_update(filter, update, options).await {
            Ok(Some(wallet)) => {
                info!("Wallet debited successfully");
                Ok(wallet)
            }
            Ok(None) => match self.get_by_customer(customer_id).await {
                Ok(wallet) => {
                    error!(
                        "Insufficient wallet balance: {} < {} for customer {}",
                        wallet.balance, amount, customer_id
                    );
                    Err(RepositoryError::insufficient_funds(format!(
                        "Wallet balance {} is below {}",
                        wallet.balance, amount
                    )))
                }
                Err(e) => Err(e),
            },
            Err(e) => {
                error!("Failed to debit wallet: {}", e);
                Err(RepositoryError::database(format!("Failed to debit wallet: {}", e)))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(customer_id = %customer_id, amount = amount))]
    async fn credit(&self, customer_id: ObjectId, amount: i64) -> RepositoryResult<Wallet> {
        info!("Crediting customer wallet");
        if amount < 0 {
            return Err(RepositoryError::validation("Credit amount must not be negative".to_string()));
        }
        let filter = doc! { "customerId": customer_id };
        let update = doc! { "$inc": { "balance": amount } };
        let options = mongodb::options::UpdateOptions::builder().upsert(true).build();
        match self.collection.update_one(filter, update, options).await {
            Ok(_) => self.get_by_customer(customer_id).await,
            Err(e) => {
                error!("Failed to credit wallet: {}", e);
                Err(RepositoryError::database(format!("Failed to credit wallet: {}", e)))
            }
        }
    }
}

/// In-memory wallet store, keyed by customer id.
#[derive(Default)]
pub struct InMemoryWalletRepository {
    wallets: RwLock<HashMap<ObjectId, Wallet>>,
}

impl InMemoryWalletRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletRepository for InMemoryWalletRepository {
    async fn get_by_customer(&self, customer_id: ObjectId) -> RepositoryResult<Wallet> {
        self.wallets
            .read()
            .await
            .get(&customer_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::not_found(format!("Wallet not found for customer: {}", customer_id))
            })
    }

    async fn debit(&self, customer_id: ObjectId, amount: i64) -> RepositoryResult<Wallet> {
        if amount < 0 {
            return Err(RepositoryError::validation("Debit amount must not be negative".to_string()));
        }
        let mut wallets = self.wallets.write().await;
        let wallet = wallets.get_mut(&customer_id).ok_or_else(|| {
            RepositoryError::not_found(format!("Wallet not found for customer: {}", customer_id))
        })?;
        if wallet.balance < amount {
            return Err(RepositoryError::insufficient_funds(format!(
                "Wallet balance {} is below {}",
                wallet.balance, amount
            )));
        }
        wallet.balance -= amount;
        Ok(wallet.clone())
    }

    async fn credit(&self, customer_id: ObjectId, amount: i64) -> RepositoryResult<Wallet> {
        if amount < 0 {
            return Err(RepositoryError::validation("Credit amount must not be negative".to_string()));
        }
        let mut wallets = self.wallets.write().await;
        let wallet = wallets.entry(customer_id).or_insert_with(|| Wallet {
            id: Some(ObjectId::new()),
            customer_id,
            balance: 0,
        });
        wallet.balance += amount;
        Ok(wallet.clone())
    }
}
