//! Process-level server configuration.
//!
//! Read once at startup from environment variables:
//! - `HOST`: Bind host (default: 0.0.0.0)
//! - `PORT`: Bind port (default: 8080)
//! - `APP_ENV`: Deployment environment name (default: development)
//! - `ALLOWED_ORIGINS`: Comma separated CORS origins, used outside development
//! - `MAX_UPLOAD_BYTES`: Receipt size cap (default: 4 MiB)
//! - `BODY_LIMIT_BYTES`: Request body cap (default: 10 MiB)
//! - `DEPLOY_REGION`, `BUILD_ID`: Reported by `/api/deploy-info`

use std::net::SocketAddr;

use crate::services::validators::MAX_UPLOAD_BYTES;

pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;
pub const DEVELOPMENT: &str = "development";
/// Room for multipart boundaries and text fields next to a receipt.
pub const UPLOAD_FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Server configuration shared with handlers through the app state.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub body_limit_bytes: usize,
    pub deploy_region: Option<String>,
    pub build_id: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: DEVELOPMENT.to_string(),
            allowed_origins: Vec::new(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            deploy_region: None,
            build_id: None,
        }
    }
}

impl ServerConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let parse_or = |key: &str, default: usize| {
            non_empty(key)
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(default)
        };

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            environment: non_empty("APP_ENV")
                .map(|v| v.to_lowercase())
                .unwrap_or(defaults.environment),
            allowed_origins: non_empty("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            body_limit_bytes: parse_or("BODY_LIMIT_BYTES", defaults.body_limit_bytes),
            deploy_region: non_empty("DEPLOY_REGION"),
            build_id: non_empty("BUILD_ID"),
        }
    }

    /// Whether upstream error details may be exposed to clients.
    pub fn is_development(&self) -> bool {
        self.environment == DEVELOPMENT
    }

    /// Body cap for upload routes: one receipt plus the form around it.
    pub fn upload_body_limit(&self) -> usize {
        self.max_upload_bytes.saturating_add(UPLOAD_FORM_OVERHEAD_BYTES)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config, ServerConfig::default());
        assert!(config.is_development());
        assert_eq!(config.max_upload_bytes, 4 * 1024 * 1024);
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
        assert!(config.upload_body_limit() < config.body_limit_bytes);
        assert_eq!(config.upload_body_limit(), 4 * 1024 * 1024 + 64 * 1024);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "3001"),
            ("APP_ENV", "Production"),
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,,"),
            ("MAX_UPLOAD_BYTES", "1024"),
            ("BODY_LIMIT_BYTES", "2048"),
            ("DEPLOY_REGION", "iad1"),
            ("BUILD_ID", "abc123"),
        ]);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3001);
        assert_eq!(config.environment, "production");
        assert!(!config.is_development());
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.body_limit_bytes, 2048);
        assert_eq!(config.deploy_region.as_deref(), Some("iad1"));
        assert_eq!(config.build_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("MAX_UPLOAD_BYTES", "-1")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes, MAX_UPLOAD_BYTES);
    }
}
