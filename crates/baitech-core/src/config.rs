//! Configuration module
//!
//! Configuration is read once by the application's startup sequence and passed
//! explicitly to the components that need it. Nothing in the workspace reads
//! the environment on its own.

use std::env;
use std::time::Duration;

use chrono_tz::Tz;

use crate::constants::DEFAULT_CLOUDINARY_FOLDER;
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 10;
const CLOUDINARY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MEDIA_ROOT: &str = "baitech-frontend/public";
const DEFAULT_CLOUDINARY_API_URL: &str = "https://api.cloudinary.com";
const DEFAULT_CLOUDINARY_DELIVERY_URL: &str = "https://res.cloudinary.com";

/// Credentials and endpoints of the remote image CDN.
///
/// All three credentials must be present for the CDN to be considered
/// configured; a partial set behaves like no CDN at all.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: String,
    pub api_base_url: String,
    pub delivery_base_url: String,
    pub timeout: Duration,
    pub eager_transformations: bool,
}

impl CloudinaryConfig {
    pub fn is_configured(&self) -> bool {
        self.cloud_name.is_some() && self.api_key.is_some() && self.api_secret.is_some()
    }

    /// A config with no credentials, pointing at the public endpoints.
    pub fn unconfigured() -> Self {
        Self {
            cloud_name: None,
            api_key: None,
            api_secret: None,
            folder: DEFAULT_CLOUDINARY_FOLDER.to_string(),
            api_base_url: DEFAULT_CLOUDINARY_API_URL.to_string(),
            delivery_base_url: DEFAULT_CLOUDINARY_DELIVERY_URL.to_string(),
            timeout: Duration::from_secs(CLOUDINARY_TIMEOUT_SECS),
            eager_transformations: true,
        }
    }
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_secret", &self.api_secret.as_ref().map(|_| "***"))
            .field("folder", &self.folder)
            .field("api_base_url", &self.api_base_url)
            .field("delivery_base_url", &self.delivery_base_url)
            .field("timeout", &self.timeout)
            .field("eager_transformations", &self.eager_transformations)
            .finish()
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: String,
    // Database (sequence store)
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Local storage
    pub storage_backend: StorageBackend,
    pub media_root: String,
    pub media_base_url: String,
    pub max_file_size_bytes: usize,
    // Identifier generation
    pub id_timezone: Tz,
    // Remote CDN
    pub cloudinary: CloudinaryConfig,
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| non_empty("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let requested_backend: Option<StorageBackend> = match non_empty("STORAGE_BACKEND") {
            Some(value) => Some(value.parse()?),
            None => None,
        };

        let max_file_size_mb = non_empty("MAX_FILE_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_FILE_SIZE_MB);

        let id_timezone = match non_empty("ID_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| anyhow::anyhow!("ID_TIMEZONE is not a valid IANA time zone: {}", name))?,
            None => Tz::UTC,
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: non_empty("CLOUDINARY_CLOUD_NAME"),
            api_key: non_empty("CLOUDINARY_API_KEY"),
            api_secret: non_empty("CLOUDINARY_API_SECRET"),
            folder: non_empty("CLOUDINARY_FOLDER")
                .unwrap_or_else(|| DEFAULT_CLOUDINARY_FOLDER.to_string()),
            api_base_url: non_empty("CLOUDINARY_API_URL")
                .unwrap_or_else(|| DEFAULT_CLOUDINARY_API_URL.to_string()),
            delivery_base_url: non_empty("CLOUDINARY_DELIVERY_URL")
                .unwrap_or_else(|| DEFAULT_CLOUDINARY_DELIVERY_URL.to_string()),
            timeout: Duration::from_secs(
                non_empty("CLOUDINARY_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(CLOUDINARY_TIMEOUT_SECS),
            ),
            eager_transformations: non_empty("CLOUDINARY_EAGER")
                .map(|s| s.to_lowercase())
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
        };

        // Unset means "use the CDN when credentials are present".
        let storage_backend = requested_backend.unwrap_or(if cloudinary.is_configured() {
            StorageBackend::Cloudinary
        } else {
            StorageBackend::Local
        });

        let config = AppConfig {
            environment,
            database_url: non_empty("DATABASE_URL"),
            db_max_connections: non_empty("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: non_empty("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            media_root: non_empty("MEDIA_ROOT").unwrap_or_else(|| DEFAULT_MEDIA_ROOT.to_string()),
            media_base_url: lookup("MEDIA_BASE_URL").unwrap_or_default(),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            id_timezone,
            cloudinary,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.cloudinary.timeout.is_zero() {
            return Err(anyhow::anyhow!("CLOUDINARY_TIMEOUT_SECS must be greater than 0"));
        }

        if self.storage_backend == StorageBackend::Cloudinary && !self.cloudinary.is_configured() {
            return Err(anyhow::anyhow!(
                "STORAGE_BACKEND=cloudinary requires CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Whether uploads should try the remote CDN before local storage.
    ///
    /// `STORAGE_BACKEND=local` keeps uploads local even with credentials set.
    pub fn remote_first(&self) -> bool {
        self.storage_backend == StorageBackend::Cloudinary && self.cloudinary.is_configured()
    }
}
