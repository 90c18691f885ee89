/// Configuration management for the blog service
///
/// Loaded from environment variables (a `.env` file is read first by `main`).
/// Development gets permissive defaults; production refuses unsafe values.
use db_pool::env_utils::parse_env_with_default;
use db_pool::DbConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const SERVICE_NAME: &str = "blog-service";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    /// Which store backs groups, posts, comments and follows
    pub storage: StorageBackend,
    /// Only read when `storage` is `Postgres`
    pub database: Option<DbConfig>,
    pub cache: CacheConfig,
    pub feed: FeedConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

/// Home page cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis URL; the in-process cache is used when unset
    pub redis_url: Option<String>,
    /// Lifetime of a cached home page
    pub home_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub items_per_page: i64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret used to validate bearer tokens
    pub jwt_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

pub const DEFAULT_ITEMS_PER_PAGE: i64 = 10;
pub const DEFAULT_HOME_TTL_SECS: u64 = 20;
const DEV_JWT_SECRET: &str = "dev-only-secret-change-me";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("BLOG_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_with_default("BLOG_SERVICE_PORT", 8080),
        };
        let production = app.is_production();

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:3000".to_string(),
            };
            if production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }
            CorsConfig { allowed_origins }
        };

        let storage = match std::env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StorageBackend::Postgres,
        };
        if production && storage == StorageBackend::Memory {
            return Err("STORAGE_BACKEND=memory is not allowed in production".to_string());
        }

        let database = match storage {
            StorageBackend::Postgres => Some(DbConfig::from_env(SERVICE_NAME)?),
            StorageBackend::Memory => None,
        };

        let cache = CacheConfig {
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            home_ttl_secs: parse_env_with_default("HOME_CACHE_TTL_SECS", DEFAULT_HOME_TTL_SECS),
        };

        let items_per_page = parse_env_with_default("ITEMS_PER_PAGE", DEFAULT_ITEMS_PER_PAGE);
        if items_per_page <= 0 {
            return Err(format!(
                "ITEMS_PER_PAGE must be positive, got {}",
                items_per_page
            ));
        }

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if production => return Err("JWT_SECRET must be set in production".to_string()),
            _ => DEV_JWT_SECRET.to_string(),
        };

        Ok(Config {
            app,
            cors,
            storage,
            database,
            cache,
            feed: FeedConfig { items_per_page },
            auth: AuthConfig { jwt_secret },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_aliases() {
        assert_eq!(
            "Postgres".parse::<StorageBackend>().unwrap(),
            StorageBackend::Postgres
        );
        assert_eq!(
            "postgresql".parse::<StorageBackend>().unwrap(),
            StorageBackend::Postgres
        );
        assert_eq!(
            " memory ".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn auth_config_debug_hides_secret() {
        let auth = AuthConfig {
            jwt_secret: "super-secret".to_string(),
        };
        assert!(!format!("{:?}", auth).contains("super-secret"));
    }
}
