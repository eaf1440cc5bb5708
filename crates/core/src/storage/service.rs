//! Storage service implementation using Apache OpenDAL.

use std::time::Duration;

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Storage service for complaint attachments.
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

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Validate an upload against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if file size or MIME type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::too_large(size, self.config.max_file_size));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::unsupported_type(content_type));
        }

        Ok(())
    }

    /// Generate a storage key for an uploaded file.
    ///
    /// Format: `{scope}/{uuid_v7}_{sanitized_filename}`. The UUIDv7 prefix is
    /// time-ordered, so keys sort by upload time and never collide.
    #[must_use]
    pub fn generate_storage_key(scope: &str, filename: &str) -> String {
        format!(
            "{}/{}_{}",
            scope.trim_matches('/'),
            Uuid::now_v7(),
            sanitize_filename(filename)
        )
    }

    /// Write an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub async fn write(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.operator.write(key, data).await?;
        Ok(())
    }

    /// Keys of the files directly under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot list.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = self.operator.list(prefix).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.metadata().is_file())
            .map(|entry| entry.path().to_string())
            .collect())
    }

    /// Resolve the URL an object can be downloaded from.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning is required but fails.
    pub async fn public_url(&self, key: &str) -> Result<String, StorageError> {
        if let Some(base) = &self.config.public_base_url {
            return Ok(format!("{}/{key}", base.trim_end_matches('/')));
        }

        match &self.config.provider {
            StorageProvider::LocalFs { root } => {
                let root = std::path::absolute(root).unwrap_or_else(|_| root.clone());
                Ok(format!("file://{}/{key}", root.display()))
            }
            StorageProvider::Memory => Ok(format!("memory:///{key}")),
            StorageProvider::S3 { .. } | StorageProvider::AzureBlob { .. } => {
                let ttl = Duration::from_secs(self.config.presign_download_ttl_secs);
                let presigned = self.operator.presign_read(key, ttl).await?;
                Ok(presigned.uri().to_string())
            }
        }
    }

    /// Delete a file from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator.delete(key).await.map_err(StorageError::from)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(_) => false,
        }
    }

    /// Ask the backend whether it is reachable and correctly configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be listed.
    pub async fn check(&self) -> Result<(), StorageError> {
        self.operator
            .check()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket/container name.
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

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
