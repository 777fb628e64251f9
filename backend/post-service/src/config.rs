/// Configuration management for Post Service
///
/// Configuration is read from environment variables (a `.env` file is
/// loaded by the binary before this runs).
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Uploaded file storage
    pub storage: StorageConfig,
    /// Token validation
    pub auth: AuthConfig,
    /// Feed endpoint behaviour
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Base URL used for `links.self` in responses
    pub public_base_url: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for uploaded images
    pub upload_dir: String,
    /// Largest accepted image, in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Answer an empty feed page with 404 instead of an empty list
    pub empty_as_not_found: bool,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let host = lookup("POST_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or_default(&lookup, "POST_SERVICE_PORT", 8080u16)?;

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                public_base_url: lookup("PUBLIC_BASE_URL")
                    .unwrap_or_else(|| format!("http://localhost:{}", port))
                    .trim_end_matches('/')
                    .to_string(),
                host,
                port,
                log_json: lookup("LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(false),
            },
            cors: {
                let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
                    Some(value) => value,
                    None if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    None => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "postgresql://localhost/forum".to_string()),
                max_connections: parse_or_default(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?,
            },
            storage: StorageConfig {
                upload_dir: lookup("UPLOAD_DIR").unwrap_or_else(|| "assets".to_string()),
                max_upload_bytes: parse_or_default(&lookup, "MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            },
            auth: {
                let jwt_secret = match lookup("JWT_SECRET") {
                    Some(secret) if !secret.trim().is_empty() => secret,
                    _ if production => {
                        return Err("JWT_SECRET must be set in production".to_string())
                    }
                    _ => "development-secret".to_string(),
                };
                AuthConfig { jwt_secret }
            },
            feed: FeedConfig {
                empty_as_not_found: parse_or_default(&lookup, "FEED_EMPTY_AS_NOT_FOUND", false)?,
            },
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn development_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.app.public_base_url, "http://localhost:8080");
        assert_eq!(config.storage.max_upload_bytes, 5 * 1024 * 1024);
        assert!(!config.feed.empty_as_not_found);
        assert!(!config.app.log_json);
    }

    #[test]
    fn production_requires_secret_and_origins() {
        assert!(load(&[("APP_ENV", "production"), ("CORS_ALLOWED_ORIGINS", "https://forum.dev")]).is_err());
        assert!(load(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cret")]).is_err());
        assert!(load(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cret"),
            ("CORS_ALLOWED_ORIGINS", "*"),
        ])
        .is_err());
        assert!(load(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cret"),
            ("CORS_ALLOWED_ORIGINS", "https://forum.dev"),
        ])
        .is_ok());
    }

    #[test]
    fn malformed_numbers_are_reported() {
        let err = load(&[("POST_SERVICE_PORT", "eighty")]).unwrap_err();
        assert!(err.contains("POST_SERVICE_PORT"));
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("PUBLIC_BASE_URL", "https://api.forum.dev/"),
            ("FEED_EMPTY_AS_NOT_FOUND", "true"),
            ("LOG_FORMAT", "JSON"),
            ("UPLOAD_DIR", "/var/lib/forum"),
        ])
        .unwrap();
        assert_eq!(config.app.public_base_url, "https://api.forum.dev");
        assert!(config.feed.empty_as_not_found);
        assert!(config.app.log_json);
        assert_eq!(config.storage.upload_dir, "/var/lib/forum");
    }
}
