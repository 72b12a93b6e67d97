use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::{debug, error, warn};

use crate::config::ConfigError;

const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Connection settings for the job and wallet collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub job_collection: Option<String>,
    pub wallet_collection: Option<String>,
    pub pool_size: u32,
    pub connection_timeout_secs: u64,
}

fn required(var: &str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| {
        error!("{} is not set", var);
        ConfigError::EnvVarNotFound(var.to_string())
    })
}

fn numeric_or<T: FromStr + std::fmt::Display>(var: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw.parse::<T>().map_err(|_| {
            error!("{} is not a valid number: {:?}", var, raw);
            ConfigError::InvalidValue(format!("{} must be numeric", var))
        }),
        Err(_) => {
            warn!("{} not set, defaulting to {}", var, default);
            Ok(default)
        }
    }
}

impl MongoConfig {
    /// Reads MONGO_URI and MONGO_DATABASE (required), the optional
    /// MONGO_USERNAME / MONGO_PASSWORD credential pair, collection name
    /// overrides, and pool/timeout tuning.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = MongoConfig {
            uri: required("MONGO_URI")?,
            database: required("MONGO_DATABASE")?,
            username: env::var("MONGO_USERNAME").ok(),
            password: env::var("MONGO_PASSWORD").ok(),
            job_collection: env::var("MONGO_JOB_COLLECTION").ok(),
            wallet_collection: env::var("MONGO_WALLET_COLLECTION").ok(),
            pool_size: numeric_or("MONGO_POOL_SIZE", DEFAULT_POOL_SIZE)?,
            connection_timeout_secs: numeric_or(
                "MONGO_CONNECTION_TIMEOUT",
                DEFAULT_CONNECTION_TIMEOUT_SECS,
            )?,
        };
        config.validate()?;
        debug!(
            database = %config.database,
            pool_size = config.pool_size,
            "Mongo config loaded"
        );
        Ok(config)
    }

    /// Small local instance used by repository tests.
    pub fn from_test_env() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "test_db".to_string(),
            username: Some("testuser".to_string()),
            password: Some("testpass".to_string()),
            job_collection: Some("test_jobs".to_string()),
            wallet_collection: Some("test_wallets".to_string()),
            pool_size: 2,
            connection_timeout_secs: 2,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uri.is_empty() {
            error!("Mongo URI is empty");
            return Err(ConfigError::ValidationError("Mongo URI cannot be empty".to_string()));
        }
        if self.database.is_empty() {
            error!("Mongo database name is empty");
            return Err(ConfigError::ValidationError(
                "Mongo database name cannot be empty".to_string(),
            ));
        }
        if self.pool_size == 0 {
            error!("Mongo pool size is zero");
            return Err(ConfigError::ValidationError(
                "Mongo pool size must be positive".to_string(),
            ));
        }
        if self.connection_timeout_secs == 0 {
            error!("Mongo connection timeout is zero");
            return Err(ConfigError::ValidationError(
                "Mongo connection timeout must be positive".to_string(),
            ));
        }
        // A set-but-empty credential half is a misconfiguration, not "no auth"
        if matches!(self.username.as_deref(), Some("")) || matches!(self.password.as_deref(), Some("")) {
            error!("Mongo credentials are set but empty");
            return Err(ConfigError::ValidationError(
                "Mongo credentials cannot be empty if set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "mekanix".to_string(),
            username: None,
            password: None,
            job_collection: Some("jobs".to_string()),
            wallet_collection: Some("wallets".to_string()),
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
        }
    }
}
