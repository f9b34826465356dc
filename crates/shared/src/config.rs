//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Object storage for attachments. Attachment routes are disabled when absent.
    #[serde(default)]
    pub storage: Option<StorageSettings>,
    /// Registration and authorization settings.
    #[serde(default)]
    pub auth: AuthConfig,
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

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
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

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
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
    3600 // 1 hour
}

fn default_refresh_token_expiry() -> u64 {
    2_592_000 // 30 days
}

/// Object storage settings as they appear in config files and the environment.
///
/// `provider` selects which of the remaining fields are read:
/// - `s3`: `endpoint`, `bucket`, `region`, `access_key_id`, `secret_access_key`
/// - `local_fs`: `root`
/// - `memory`: nothing
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Provider kind.
    #[serde(default = "default_storage_provider")]
    pub provider: String,
    /// S3 endpoint URL.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// S3 bucket name.
    #[serde(default)]
    pub bucket: Option<String>,
    /// S3 region.
    #[serde(default)]
    pub region: Option<String>,
    /// S3 access key ID.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// S3 secret access key.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Root directory for the local filesystem provider.
    #[serde(default)]
    pub root: Option<String>,
    /// Maximum attachment size in megabytes.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

fn default_storage_provider() -> String {
    "s3".to_string()
}

fn default_max_file_size_mb() -> u64 {
    10
}

/// Registration and authorization settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Emails allowed to self-register with the admin role.
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

impl AuthConfig {
    /// Returns true if the email may register as an admin.
    ///
    /// Comparison ignores ASCII case and surrounding whitespace.
    #[must_use]
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = email.trim();
        self.admin_emails
            .iter()
            .any(|allowed| allowed.trim().eq_ignore_ascii_case(email))
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("CAMPUS")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("auth.admin_emails"),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
