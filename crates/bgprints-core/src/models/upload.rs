use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachment::{ServiceId, VendorId};

/// A stored upload as returned by the uploads endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFileRecord {
    pub id: i64,
    pub vendor_id: VendorId,
    pub service_id: ServiceId,
    pub file_url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// What the transport hands back after a successful submission.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadReceipt {
    pub records: Vec<UploadedFileRecord>,
}

impl UploadReceipt {
    pub fn file_count(&self) -> usize {
        self.records.len()
    }
}
