//! Application configuration management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Application configuration.
///
/// Every section is optional; an empty configuration boots a local-only board.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Board behaviour.
    #[serde(default)]
    pub board: BoardConfig,
    /// Remote document database.
    #[serde(default)]
    pub document: DocumentConfig,
    /// Attachment object storage.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Board configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Document collection holding complaints.
    #[serde(default = "default_collection")]
    pub collection: String,
    /// Key prefix for uploaded attachment objects.
    #[serde(default = "default_attachment_scope")]
    pub attachment_scope: String,
    /// How long the remote services get to report ready at startup.
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            attachment_scope: default_attachment_scope(),
            startup_timeout_ms: default_startup_timeout_ms(),
        }
    }
}

fn default_collection() -> String {
    "complaints".to_string()
}

fn default_attachment_scope() -> String {
    "complaints".to_string()
}

fn default_startup_timeout_ms() -> u64 {
    1000
}

/// Document database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    /// Database connection URL. `None` means no remote backend.
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending migrations when the board connects.
    #[serde(default)]
    pub run_migrations: bool,
    /// How often subscribers re-read their collection to pick up writes from
    /// other processes. Zero turns polling off.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            run_migrations: false,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_poll_interval_ms() -> u64 {
    1000
}

/// Object storage provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
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
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory store (tests and demos)
    Memory,
}

impl StorageProvider {
    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
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

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Short provider name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::AzureBlob { container, .. } => container,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
            Self::Memory => "memory",
        }
    }
}

/// Attachment storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Provider. `None` disables attachment uploads.
    #[serde(default)]
    pub provider: Option<StorageProvider>,
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed MIME patterns, e.g. `image/*`.
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
    /// Public base URL objects are served from, if any.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Presigned download URL TTL in seconds.
    #[serde(default = "default_download_ttl")]
    pub presign_download_ttl_secs: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: None,
            max_file_size: default_max_file_size(),
            allowed_mime_types: default_allowed_mime_types(),
            public_base_url: None,
            presign_download_ttl_secs: default_download_ttl(),
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_allowed_mime_types() -> Vec<String> {
    vec!["image/*".to_string(), "audio/*".to_string()]
}

fn default_download_ttl() -> u64 {
    604_800 // 7 days
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "grievance=info".to_string()
}

impl AppConfig {
    /// Loads configuration from `.env`, config files, and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("GRIEVANCE").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Whether a remote document backend is configured at all.
    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.document
            .url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}
