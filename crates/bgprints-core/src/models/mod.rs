//! Data models for the client
//!
//! Attachment bookkeeping types plus the shapes of the backend's service,
//! vendor, upload and payment payloads.

mod attachment;
mod payment;
mod upload;
mod vendor;

pub use attachment::*;
pub use payment::*;
pub use upload::*;
pub use vendor::*;
