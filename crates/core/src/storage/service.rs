//! Storage service implementation using Apache OpenDAL.

use bytes::Bytes;
use opendal::{Operator, services};

use super::blob::BlobStore;
use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Storage service for file attachments.
#[derive(Debug, Clone)]
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::Memory => Ok(Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()),
        }
    }

    /// Check if a file exists in storage. Any stat failure counts as absent.
    pub async fn exists(&self, key: &str) -> bool {
        self.operator.stat(key).await.is_ok()
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

impl BlobStore for StorageService {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.operator
            .write(key, data)
            .await
            .map(|_| ())
            .map_err(|e| StorageError::from_opendal(key, &e))
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        self.operator
            .read(key)
            .await
            .map(|buffer| buffer.to_bytes())
            .map_err(|e| StorageError::from_opendal(key, &e))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator
            .delete(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))
    }
}
