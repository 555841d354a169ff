use std::env;

/// Transfer and access configuration
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Maximum files uploaded concurrently in one batch (default: 100)
    pub max_batch_size: usize,

    /// File count above which a selection is flagged (default: 1000)
    pub max_files: usize,

    /// Total selection size above which a selection is flagged (default: 2 GiB)
    pub max_total_bytes: u64,

    /// Hard request body limit for uploads in bytes (default: 3 GiB)
    pub max_upload_bytes: usize,

    /// Lifetime of signed retrieval URLs in seconds (default: 300)
    pub signed_url_ttl_secs: u64,

    /// Page size for storage listings, also the remove batch limit (default: 1000)
    pub list_page_size: i32,

    /// Seconds before a running transfer is flagged as slow (default: 30)
    pub slow_notice_secs: u64,

    /// Days added to `created_at` for the displayed expiration (default: 4)
    pub display_expiry_days: i64,

    /// Code that opens every record regardless of its own secret code
    pub override_code: Option<String>,

    /// Code required to set the verified badge; feature disabled when unset
    pub verification_code: Option<String>,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            max_files: 1000,
            max_total_bytes: 2 * 1024 * 1024 * 1024, // 2 GiB
            max_upload_bytes: 3 * 1024 * 1024 * 1024, // 3 GiB
            signed_url_ttl_secs: 300,
            list_page_size: 1000,
            slow_notice_secs: 30,
            display_expiry_days: 4,
            override_code: None,
            verification_code: None,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl TransferConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_batch_size: env::var("MAX_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(default.max_batch_size),

            max_files: env::var("MAX_FILES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_files),

            max_total_bytes: env::var("MAX_TOTAL_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_total_bytes),

            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_bytes),

            signed_url_ttl_secs: env::var("SIGNED_URL_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.signed_url_ttl_secs),

            // S3 refuses more than 1000 keys per listing or delete call
            list_page_size: env::var("LIST_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &i32| (1..=1000).contains(v))
                .unwrap_or(default.list_page_size),

            slow_notice_secs: env::var("SLOW_NOTICE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.slow_notice_secs),

            display_expiry_days: env::var("DISPLAY_EXPIRY_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.display_expiry_days),

            override_code: env::var("OVERRIDE_CODE").ok().filter(|v| !v.is_empty()),

            verification_code: env::var("VERIFICATION_CODE")
                .ok()
                .filter(|v| !v.is_empty()),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development (small batches, short notices)
    pub fn development() -> Self {
        Self {
            max_batch_size: 10,
            slow_notice_secs: 5,
            override_code: Some("dev-override".to_string()),
            verification_code: Some("dev-verify".to_string()),
            ..Self::default()
        }
    }

    /// Create config for production (override code must come from the environment)
    pub fn production() -> anyhow::Result<Self> {
        let config = Self::from_env();
        if config.override_code.is_none() {
            anyhow::bail!("CRITICAL: OVERRIDE_CODE must be set in production");
        }
        if config.allowed_origins.iter().any(|o| o == "*") {
            tracing::warn!("⚠️  ALLOWED_ORIGINS is '*' in production");
        }
        Ok(config)
    }
}
