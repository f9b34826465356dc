//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use campus_shared::config::StorageSettings;

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: AWS S3, Cloudflare R2, MinIO
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory, lost on restart.
    Memory,
}

impl StorageProvider {
    /// Create S3-compatible provider.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "local_fs",
            Self::Memory => "memory",
        }
    }

    /// Get the bucket name, or the root directory for local storage.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
            Self::Memory => "memory",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum attachment size in megabytes.
    pub max_file_size_mb: u64,
}

impl StorageConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size_mb: Self::DEFAULT_MAX_FILE_SIZE_MB,
        }
    }

    /// Set maximum file size in megabytes.
    #[must_use]
    pub fn with_max_file_size_mb(mut self, size_mb: u64) -> Self {
        self.max_file_size_mb = size_mb;
        self
    }
}

impl TryFrom<&StorageSettings> for StorageConfig {
    type Error = StorageError;

    fn try_from(settings: &StorageSettings) -> Result<Self, Self::Error> {
        fn required<'a>(value: Option<&'a String>, field: &str) -> Result<&'a str, StorageError> {
            value
                .map(String::as_str)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StorageError::configuration(format!("storage.{field} is required")))
        }

        let provider = match settings.provider.as_str() {
            "s3" => StorageProvider::s3(
                required(settings.endpoint.as_ref(), "endpoint")?,
                required(settings.bucket.as_ref(), "bucket")?,
                required(settings.access_key_id.as_ref(), "access_key_id")?,
                required(settings.secret_access_key.as_ref(), "secret_access_key")?,
                settings.region.as_deref().unwrap_or("auto"),
            ),
            "local_fs" => StorageProvider::local_fs(required(settings.root.as_ref(), "root")?),
            "memory" => StorageProvider::Memory,
            other => {
                return Err(StorageError::configuration(format!(
                    "unknown storage provider '{other}'"
                )));
            }
        };

        Ok(Self::new(provider).with_max_file_size_mb(settings.max_file_size_mb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> StorageSettings {
        StorageSettings {
            provider: provider.to_string(),
            endpoint: None,
            bucket: None,
            region: None,
            access_key_id: None,
            secret_access_key: None,
            root: None,
            max_file_size_mb: 10,
        }
    }

    #[test]
    fn test_storage_provider_s3() {
        let provider = StorageProvider::s3(
            "https://s3.eu-central-1.amazonaws.com",
            "campus-attachments",
            "access_key",
            "secret_key",
            "eu-central-1",
        );
        assert_eq!(provider.name(), "s3");
        assert_eq!(provider.bucket(), "campus-attachments");
    }

    #[test]
    fn test_storage_provider_local() {
        let provider = StorageProvider::local_fs("./storage");
        assert_eq!(provider.name(), "local_fs");
        assert_eq!(provider.bucket(), "./storage");
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::new(StorageProvider::Memory);
        assert_eq!(
            config.max_file_size_mb,
            StorageConfig::DEFAULT_MAX_FILE_SIZE_MB
        );
    }

    #[test]
    fn test_from_settings_s3() {
        let mut s = settings("s3");
        s.endpoint = Some("http://localhost:9000".to_string());
        s.bucket = Some("campus".to_string());
        s.access_key_id = Some("minio".to_string());
        s.secret_access_key = Some("minio123".to_string());
        s.max_file_size_mb = 25;

        let config = StorageConfig::try_from(&s).unwrap();
        assert_eq!(config.provider.name(), "s3");
        assert_eq!(config.provider.bucket(), "campus");
        assert_eq!(config.max_file_size_mb, 25);
        assert!(matches!(
            config.provider,
            StorageProvider::S3 { ref region, .. } if region == "auto"
        ));
    }

    #[test]
    fn test_from_settings_s3_missing_bucket() {
        let mut s = settings("s3");
        s.endpoint = Some("http://localhost:9000".to_string());

        let err = StorageConfig::try_from(&s).unwrap_err();
        assert!(err.to_string().contains("storage.bucket"));
    }

    #[test]
    fn test_from_settings_local_and_memory() {
        let mut s = settings("local_fs");
        s.root = Some("/var/lib/campus".to_string());
        assert_eq!(StorageConfig::try_from(&s).unwrap().provider.name(), "local_fs");

        assert_eq!(
            StorageConfig::try_from(&settings("memory"))
                .unwrap()
                .provider
                .name(),
            "memory"
        );
    }

    #[test]
    fn test_from_settings_unknown_provider() {
        assert!(matches!(
            StorageConfig::try_from(&settings("ftp")),
            Err(StorageError::Configuration(_))
        ));
    }
}
