//! Configuration module
//!
//! Client configuration: backend location, HTTP behaviour, upload quota limits
//! and discovery radius. Values come from the environment with documented
//! defaults; `from_lookup` takes any key lookup so parsing is testable without
//! touching the process environment.

use std::env;

use crate::geo::DEFAULT_SEARCH_RADIUS_KM;

// Common constants
const DEFAULT_API_URL: &str = "http://localhost:8000";
const HTTP_TIMEOUT_SECS: u64 = 60;
const MAX_FILES: usize = 5;
const MAX_FILE_SIZE_MB: u64 = 50;
const MAX_TOTAL_SIZE_MB: u64 = 100;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Per-file and aggregate caps enforced before a file is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaLimits {
    pub max_files: usize,
    pub max_file_size: u64,
    pub max_total_size: u64,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            max_files: MAX_FILES,
            max_file_size: MAX_FILE_SIZE_MB * BYTES_PER_MB,
            max_total_size: MAX_TOTAL_SIZE_MB * BYTES_PER_MB,
        }
    }
}

impl QuotaLimits {
    pub fn new(max_files: usize, max_file_size: u64, max_total_size: u64) -> Self {
        Self {
            max_files,
            max_file_size,
            max_total_size,
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_files == 0 {
            return Err(anyhow::anyhow!("BGPRINTS_MAX_FILES must be at least 1"));
        }
        if self.max_file_size == 0 || self.max_total_size == 0 {
            return Err(anyhow::anyhow!("Upload size limits must be greater than zero"));
        }
        if self.max_file_size > self.max_total_size {
            return Err(anyhow::anyhow!(
                "BGPRINTS_MAX_FILE_SIZE_MB cannot exceed BGPRINTS_MAX_TOTAL_SIZE_MB"
            ));
        }
        Ok(())
    }
}

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub http_timeout_secs: u64,
    pub environment: String,
    pub quota: QuotaLimits,
    pub search_radius_km: f64,
    /// Public key id passed to the checkout sheet
    pub payment_key_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            environment: "development".to_string(),
            quota: QuotaLimits::default(),
            search_radius_km: DEFAULT_SEARCH_RADIUS_KM,
            payment_key_id: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("BGPRINTS_API_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let quota = QuotaLimits {
            max_files: lookup("BGPRINTS_MAX_FILES")
                .map(|s| s.trim().parse::<usize>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("BGPRINTS_MAX_FILES must be a valid number"))?
                .unwrap_or(MAX_FILES),
            max_file_size: lookup("BGPRINTS_MAX_FILE_SIZE_MB")
                .map(|s| s.trim().parse::<u64>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("BGPRINTS_MAX_FILE_SIZE_MB must be a valid number"))?
                .unwrap_or(MAX_FILE_SIZE_MB)
                * BYTES_PER_MB,
            max_total_size: lookup("BGPRINTS_MAX_TOTAL_SIZE_MB")
                .map(|s| s.trim().parse::<u64>())
                .transpose()
                .map_err(|_| {
                    anyhow::anyhow!("BGPRINTS_MAX_TOTAL_SIZE_MB must be a valid number")
                })?
                .unwrap_or(MAX_TOTAL_SIZE_MB)
                * BYTES_PER_MB,
        };

        let config = ClientConfig {
            api_url,
            http_timeout_secs: lookup("BGPRINTS_HTTP_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(HTTP_TIMEOUT_SECS),
            environment,
            quota,
            search_radius_km: lookup("BGPRINTS_SEARCH_RADIUS_KM")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_SEARCH_RADIUS_KM),
            payment_key_id: lookup("BGPRINTS_PAYMENT_KEY_ID").filter(|s| !s.is_empty()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the client is running against production
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "BGPRINTS_API_URL must start with http:// or https://"
            ));
        }

        if self.is_production() && !self.api_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "BGPRINTS_API_URL must use https:// in production"
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "BGPRINTS_HTTP_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.search_radius_km.is_nan() || self.search_radius_km <= 0.0 {
            return Err(anyhow::anyhow!(
                "BGPRINTS_SEARCH_RADIUS_KM must be greater than zero"
            ));
        }

        self.quota.validate()
    }
}
