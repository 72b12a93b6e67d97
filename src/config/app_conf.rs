use std::env;
use std::net::SocketAddr;

/// Listen address for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Reads APP_HOST (default 127.0.0.1) and APP_PORT (default 8080).
    pub fn from_env() -> Self {
        AppConfig {
            host: env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("APP_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8080),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        Ok(SocketAddr::new(self.host.parse()?, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        let config = AppConfig { host: "0.0.0.0".to_string(), port: 9000 };
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:9000");
    }
}
