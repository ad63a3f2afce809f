//! Service configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service configuration, loaded from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub database_path: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for shop admin authentication
    pub jwt_secret: String,
    /// Shared secret for webhook HMAC verification
    pub webhook_secret: String,
    /// Host platform admin API version (catalog GraphQL endpoint)
    pub catalog_api_version: String,
    /// Access token for the host platform admin API
    pub catalog_access_token: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/reviews.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            webhook_secret: Self::require_secret("WEBHOOK_SECRET", &environment)?,
            catalog_api_version: std::env::var("CATALOG_API_VERSION")
                .unwrap_or_else(|_| "2024-10".into()),
            catalog_access_token: Self::require_secret("CATALOG_ACCESS_TOKEN", &environment)?,
            environment,
        })
    }
}
