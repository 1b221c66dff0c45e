//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// OCR proxy configuration.
    #[serde(default)]
    pub ocr: OcrConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Refresh token expiration in seconds.
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> u64 {
    604_800 // 7 days
}

/// Third-party OCR service used by the document extraction proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Base URL of the OCR service.
    #[serde(default = "default_ocr_base_url")]
    pub base_url: String,
    /// API key sent as a bearer token.
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

fn default_ocr_base_url() -> String {
    "http://localhost:9090".to_string()
}

fn default_ocr_timeout() -> u64 {
    30
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            base_url: default_ocr_base_url(),
            api_key: String::new(),
            timeout_secs: default_ocr_timeout(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest precedence first: `config/default`, `config/{RUN_MODE}`,
    /// then `STAFFDESK__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("STAFFDESK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("STAFFDESK__DATABASE__URL", Some("postgres://localhost/staffdesk")),
                ("STAFFDESK__JWT__SECRET", Some("secret")),
                ("STAFFDESK__SERVER__PORT", Some("9000")),
                ("STAFFDESK__OCR__BASE_URL", Some("http://ocr.internal")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.database.url, "postgres://localhost/staffdesk");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.server.port, 9000);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.jwt.access_token_expiry_secs, 900);
                assert_eq!(config.ocr.base_url, "http://ocr.internal");
                assert_eq!(config.ocr.timeout_secs, 30);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("STAFFDESK__DATABASE__URL", None::<&str>),
                ("STAFFDESK__JWT__SECRET", Some("secret")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
