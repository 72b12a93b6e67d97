use std::env;
use tracing::{debug, error, warn};

use crate::config::ConfigError;

/// Tokens signed with anything shorter are trivially brute-forceable.
const MIN_SECRET_LEN: usize = 32;
const DEFAULT_ACCESS_EXPIRY_MINUTES: i64 = 15;

/// Signing configuration for the HS256 access tokens the route guards check.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    pub access_token_expiration: i64,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
}

impl JwtConfig {
    /// Reads JWT_SECRET (required), JWT_ACCESS_TOKEN_EXPIRY (minutes,
    /// defaults to 15), and the optional JWT_ISSUER / JWT_AUDIENCE pair.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars("JWT_SECRET", "JWT_ACCESS_TOKEN_EXPIRY", "JWT_ISSUER", "JWT_AUDIENCE")
    }

    /// Same shape, TEST_-prefixed, so a test run never picks up a real secret.
    pub fn from_test_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            "TEST_JWT_SECRET",
            "TEST_JWT_ACCESS_TOKEN_EXPIRY",
            "TEST_JWT_ISSUER",
            "TEST_JWT_AUDIENCE",
        )
    }

    fn from_vars(
        secret_var: &str,
        expiry_var: &str,
        issuer_var: &str,
        audience_var: &str,
    ) -> Result<Self, ConfigError> {
        let jwt_secret = env::var(secret_var).map_err(|_| {
            error!("{} is not set", secret_var);
            ConfigError::EnvVarNotFound(secret_var.to_string())
        })?;

        let access_token_expiration = match env::var(expiry_var) {
            Ok(raw) => raw.parse::<i64>().map_err(|e| {
                error!("{} is not a number: {}", expiry_var, e);
                ConfigError::InvalidValue(format!("{}: {}", expiry_var, e))
            })?,
            Err(_) => {
                warn!("{} not set, tokens expire after {} minutes", expiry_var, DEFAULT_ACCESS_EXPIRY_MINUTES);
                DEFAULT_ACCESS_EXPIRY_MINUTES
            }
        };

        let config = JwtConfig {
            jwt_secret,
            access_token_expiration,
            jwt_issuer: env::var(issuer_var).ok(),
            jwt_audience: env::var(audience_var).ok(),
        };
        config.validate()?;
        debug!(
            "JWT config loaded, access tokens expire after {} minutes",
            config.access_token_expiration
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            error!("JWT secret is shorter than {} characters", MIN_SECRET_LEN);
            return Err(ConfigError::ValidationError(format!(
                "JWT secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        if self.access_token_expiration <= 0 {
            error!("Access token expiry must be positive");
            return Err(ConfigError::ValidationError(
                "Access token expiry must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fixed signing setup for unit and router tests.
impl Default for JwtConfig {
    fn default() -> Self {
        JwtConfig {
            jwt_secret: "test_secret_key_for_jwt_testing_should_be_long_enough_for_security_purposes"
                .to_string(),
            access_token_expiration: DEFAULT_ACCESS_EXPIRY_MINUTES,
            jwt_issuer: Some("mekanix-backend-test".to_string()),
            jwt_audience: Some("mekanix-backend-users".to_string()),
        }
    }
}
