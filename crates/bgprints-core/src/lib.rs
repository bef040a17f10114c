//! BG-Prints Core Library
//!
//! This crate provides the domain models, error types, configuration, validation
//! and upload quota bookkeeping shared by every BG-Prints client component.

pub mod config;
pub mod discovery;
pub mod error;
pub mod geo;
pub mod models;
pub mod quota;
pub mod validation;

// Re-export commonly used types
pub use config::{ClientConfig, QuotaLimits};
pub use discovery::{filter_vendors, sort_vendors, within_radius, VendorSort};
pub use error::{AppError, ErrorMetadata, LogLevel, QuotaRejection, QuotaResource};
pub use geo::{haversine_km, Coordinates, DEFAULT_SEARCH_RADIUS_KM};
pub use quota::UploadQuotaManager;
pub use validation::FieldError;
