use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Identifier of a service requested from a vendor (e.g. "color printing").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub i64);

impl Display for ServiceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ServiceId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ServiceId)
            .map_err(|_| anyhow::anyhow!("Invalid service id: {}", s))
    }
}

/// Identifier of a print-service vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(pub i64);

impl Display for VendorId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VendorId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(VendorId)
            .map_err(|_| anyhow::anyhow!("Invalid vendor id: {}", s))
    }
}

/// Where the transport finds the bytes of a picked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    /// File on the local filesystem, read at upload time
    Path(PathBuf),
    /// Content already held in memory
    Memory(Bytes),
}

/// One user-picked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub content: ContentRef,
}

impl FileHandle {
    pub fn new(
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        content: ContentRef,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            content,
        }
    }

    /// Build a handle whose content lives in memory; size is taken from the buffer.
    pub fn in_memory(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            mime_type: mime_type.into(),
            content: ContentRef::Memory(data),
        }
    }
}

/// Files attached to one service, in attachment order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAttachments {
    pub service_id: ServiceId,
    pub files: Vec<FileHandle>,
}

impl ServiceAttachments {
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }
}

/// Read-only view of the attachment set after an operation.
///
/// `services` is in first-attached order and never contains an empty entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttachmentSnapshot {
    pub services: Vec<ServiceAttachments>,
    pub total_size: u64,
    pub total_count: usize,
}

impl AttachmentSnapshot {
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn files_for(&self, service_id: ServiceId) -> Option<&[FileHandle]> {
        self.services
            .iter()
            .find(|s| s.service_id == service_id)
            .map(|s| s.files.as_slice())
    }
}

/// One (service, file) pair handed to the upload transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionEntry {
    pub service_id: ServiceId,
    pub file: FileHandle,
}

/// Flat, stably ordered list of attachments ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub entries: Vec<SubmissionEntry>,
}

impl Submission {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.file.size).sum()
    }

    /// Service ids aligned with the file order, as the upload endpoint expects them.
    pub fn service_ids(&self) -> Vec<ServiceId> {
        self.entries.iter().map(|e| e.service_id).collect()
    }
}
