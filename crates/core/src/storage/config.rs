//! Storage configuration types.

use grievance_shared::config::StorageSettings;

pub use grievance_shared::config::StorageProvider;

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Presigned download URL TTL in seconds (default: 604800 = 7 days).
    pub presign_download_ttl_secs: u64,
    /// Allowed MIME patterns for upload. `type/*` matches a whole top-level type.
    pub allowed_mime_types: Vec<String>,
    /// Base URL objects are publicly served from. Overrides presigning.
    pub public_base_url: Option<String>,
}

impl StorageConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Default download TTL: 7 days.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 604_800;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
            allowed_mime_types: Self::default_mime_types(),
            public_base_url: None,
        }
    }

    /// Build from application settings. `None` when no provider is configured.
    #[must_use]
    pub fn from_settings(settings: &StorageSettings) -> Option<Self> {
        let provider = settings.provider.clone()?;
        Some(Self {
            provider,
            max_file_size: settings.max_file_size,
            presign_download_ttl_secs: settings.presign_download_ttl_secs,
            allowed_mime_types: settings.allowed_mime_types.clone(),
            public_base_url: settings.public_base_url.clone(),
        })
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }

    /// Set allowed MIME types.
    #[must_use]
    pub fn with_allowed_mime_types(mut self, types: Vec<String>) -> Self {
        self.allowed_mime_types = types;
        self
    }

    /// Set the public base URL.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    /// Default allowed MIME types for attachments: images and audio.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        vec!["image/*".to_string(), "audio/*".to_string()]
    }

    /// Check if a MIME type is allowed.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        self.allowed_mime_types.iter().any(|pattern| {
            match pattern.strip_suffix("/*") {
                Some(top_level) => mime_type
                    .split_once('/')
                    .is_some_and(|(top, sub)| top == top_level && !sub.is_empty()),
                None => *pattern == mime_type,
            }
        })
    }
}
