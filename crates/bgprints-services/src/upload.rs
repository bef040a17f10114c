//! Upload session for one vendor visit.
//!
//! The session owns the quota manager and talks to three collaborators: the
//! file picker, the confirmation prompt and the upload transport. Picking and
//! confirming happen here, outside the quota manager, so a cancelled pick or a
//! declined prompt never reaches it.

use std::sync::Arc;

use async_trait::async_trait;
use bgprints_api_client::ApiClient;
use bgprints_core::models::{
    AttachmentSnapshot, FileHandle, ServiceId, Submission, UploadReceipt, Vendor, VendorId,
};
use bgprints_core::{
    AppError, ErrorMetadata, LogLevel, QuotaLimits, QuotaRejection, UploadQuotaManager,
};
use uuid::Uuid;

use crate::into_app_error;

/// Result of asking the user for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Picked(FileHandle),
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum PickerError {
    #[error("File picker unavailable: {0}")]
    Unavailable(String),

    #[error("Could not read picked file: {0}")]
    Unreadable(String),
}

/// File selection surface.
#[async_trait]
pub trait FilePicker: Send + Sync {
    async fn pick(&self) -> Result<PickOutcome, PickerError>;
}

/// Prompt shown before a destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Cancelled,
}

/// Confirmation surface.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, request: &ConfirmationRequest) -> Confirmation;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportOutcome {
    Success(UploadReceipt),
    Failure(String),
}

/// Sends a submission to the backend for one vendor.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(&self, vendor_id: VendorId, submission: &Submission) -> TransportOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached(AttachmentSnapshot),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(AttachmentSnapshot),
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Vendor {vendor_id} does not offer service {service_id}")]
    UnknownService {
        vendor_id: VendorId,
        service_id: ServiceId,
    },

    #[error(transparent)]
    Rejected(#[from] QuotaRejection),

    #[error(transparent)]
    Picker(#[from] PickerError),

    #[error("Upload failed: {0}")]
    TransportFailed(String),
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::UnknownService { .. } => "UNKNOWN_SERVICE",
            UploadError::Rejected(rejection) => rejection.error_code(),
            UploadError::Picker(_) => "PICKER_ERROR",
            UploadError::TransportFailed(_) => "UPLOAD_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, UploadError::Picker(_) | UploadError::TransportFailed(_))
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            UploadError::UnknownService { .. } => Some("Choose one of the vendor's services"),
            UploadError::Rejected(rejection) => rejection.suggested_action(),
            UploadError::Picker(_) => Some("Try selecting the file again"),
            UploadError::TransportFailed(_) => Some("Submit again; your files are still attached"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::UnknownService { .. } => self.to_string(),
            UploadError::Rejected(rejection) => rejection.client_message(),
            UploadError::Picker(_) => {
                "An error occurred while selecting files. Please try again.".to_string()
            }
            UploadError::TransportFailed(_) => {
                "An error occurred while uploading files.".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::TransportFailed(_) => LogLevel::Warn,
            UploadError::Picker(_) => LogLevel::Warn,
            _ => LogLevel::Debug,
        }
    }
}

/// One vendor's upload session.
pub struct UploadSession {
    id: Uuid,
    vendor_id: VendorId,
    offered: Option<Vec<ServiceId>>,
    quota: UploadQuotaManager,
    picker: Arc<dyn FilePicker>,
    prompt: Arc<dyn ConfirmationPrompt>,
    transport: Arc<dyn UploadTransport>,
}

impl UploadSession {
    pub fn new(
        vendor_id: VendorId,
        limits: QuotaLimits,
        picker: Arc<dyn FilePicker>,
        prompt: Arc<dyn ConfirmationPrompt>,
        transport: Arc<dyn UploadTransport>,
    ) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, vendor_id = %vendor_id, "Upload session started");
        Self {
            id,
            vendor_id,
            offered: None,
            quota: UploadQuotaManager::new(limits),
            picker,
            prompt,
            transport,
        }
    }

    /// Session restricted to the services the vendor currently offers.
    pub fn for_vendor(
        vendor: &Vendor,
        limits: QuotaLimits,
        picker: Arc<dyn FilePicker>,
        prompt: Arc<dyn ConfirmationPrompt>,
        transport: Arc<dyn UploadTransport>,
    ) -> Self {
        let offered = vendor.active_services().iter().map(|s| s.id).collect();
        Self::new(vendor.id, limits, picker, prompt, transport).with_offered_services(offered)
    }

    pub fn with_offered_services(mut self, services: Vec<ServiceId>) -> Self {
        self.offered = Some(services);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    pub fn snapshot(&self) -> AttachmentSnapshot {
        self.quota.snapshot()
    }

    pub fn limits(&self) -> QuotaLimits {
        self.quota.limits()
    }

    fn check_service(&self, service_id: ServiceId) -> Result<(), UploadError> {
        match &self.offered {
            Some(offered) if !offered.contains(&service_id) => Err(UploadError::UnknownService {
                vendor_id: self.vendor_id,
                service_id,
            }),
            _ => Ok(()),
        }
    }

    /// Ask the picker for a file and attach it to `service_id`.
    pub async fn attach(&mut self, service_id: ServiceId) -> Result<AttachOutcome, UploadError> {
        self.check_service(service_id)?;

        match self.picker.pick().await? {
            PickOutcome::Cancelled => {
                tracing::debug!(session_id = %self.id, service_id = %service_id, "File pick cancelled");
                Ok(AttachOutcome::Cancelled)
            }
            PickOutcome::Picked(file) => self.attach_file(service_id, file),
        }
    }

    /// Attach a file obtained outside the picker.
    pub fn attach_file(
        &mut self,
        service_id: ServiceId,
        file: FileHandle,
    ) -> Result<AttachOutcome, UploadError> {
        self.check_service(service_id)?;

        match self.quota.request_add(service_id, file) {
            Ok(snapshot) => Ok(AttachOutcome::Attached(snapshot)),
            Err(rejection) => {
                tracing::info!(
                    session_id = %self.id,
                    service_id = %service_id,
                    code = rejection.error_code(),
                    "Attachment rejected"
                );
                Err(UploadError::Rejected(rejection))
            }
        }
    }

    /// Remove one file after the user confirms. A file that is not attached is
    /// a no-op and does not prompt.
    pub async fn remove(
        &mut self,
        service_id: ServiceId,
        file_name: &str,
    ) -> Result<RemoveOutcome, UploadError> {
        let attached = self
            .quota
            .files_for(service_id)
            .is_some_and(|files| files.iter().any(|f| f.name == file_name));
        if !attached {
            return Ok(RemoveOutcome::Removed(self.quota.snapshot()));
        }

        let request = ConfirmationRequest {
            title: "Remove File".to_string(),
            message: format!("Are you sure you want to remove {}?", file_name),
        };
        match self.prompt.confirm(&request).await {
            Confirmation::Cancelled => Ok(RemoveOutcome::Cancelled),
            Confirmation::Confirmed => Ok(RemoveOutcome::Removed(
                self.quota.request_remove(service_id, file_name),
            )),
        }
    }

    /// Remove every file attached to `service_id` after the user confirms.
    pub async fn remove_all(&mut self, service_id: ServiceId) -> Result<RemoveOutcome, UploadError> {
        let count = self.quota.files_for(service_id).map_or(0, |files| files.len());
        if count == 0 {
            return Ok(RemoveOutcome::Removed(self.quota.snapshot()));
        }

        let request = ConfirmationRequest {
            title: "Remove All Files".to_string(),
            message: format!(
                "Are you sure you want to remove all {} files for service {}?",
                count, service_id
            ),
        };
        match self.prompt.confirm(&request).await {
            Confirmation::Cancelled => Ok(RemoveOutcome::Cancelled),
            Confirmation::Confirmed => Ok(RemoveOutcome::Removed(
                self.quota.request_remove_all(service_id),
            )),
        }
    }

    /// Upload everything attached. Attachments are cleared only when the
    /// transport reports success.
    pub async fn submit(&mut self) -> Result<UploadReceipt, UploadError> {
        let submission = self.quota.build_submission()?;

        tracing::info!(
            session_id = %self.id,
            vendor_id = %self.vendor_id,
            file_count = submission.len(),
            total_size = submission.total_size(),
            "Submitting upload"
        );

        match self.transport.upload(self.vendor_id, &submission).await {
            TransportOutcome::Success(receipt) => {
                self.quota.reset();
                tracing::info!(
                    session_id = %self.id,
                    stored = receipt.file_count(),
                    "Upload complete"
                );
                Ok(receipt)
            }
            TransportOutcome::Failure(reason) => {
                tracing::warn!(session_id = %self.id, reason = %reason, "Upload failed");
                Err(UploadError::TransportFailed(reason))
            }
        }
    }
}

/// Upload transport over the backend's multipart endpoint.
#[derive(Clone)]
pub struct HttpUploadTransport {
    client: ApiClient,
}

impl HttpUploadTransport {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn upload(&self, vendor_id: VendorId, submission: &Submission) -> TransportOutcome {
        match self.client.upload_files(vendor_id, submission).await {
            Ok(records) => TransportOutcome::Success(UploadReceipt { records }),
            Err(e) => {
                let app_err: AppError = into_app_error(e);
                tracing::debug!(error = %app_err.detailed_message(), "Upload transport error");
                TransportOutcome::Failure(app_err.client_message())
            }
        }
    }
}
