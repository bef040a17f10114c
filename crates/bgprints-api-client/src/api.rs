//! Domain-specific API methods. Use these with `ApiClient` for typed responses.

use anyhow::{Context, Result};
use bgprints_core::models::{
    ContentRef, PaymentAmount, PaymentConfirmation, PaymentOrder, Service, ServiceId, Submission,
    UploadedFileRecord, Vendor, VendorId, VerifyPaymentResponse,
};
use bgprints_core::{AppError, Coordinates};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{check_status, ApiClient};

/// Service id the backend treats as "any service" in the nearby-vendor search.
pub const ALL_SERVICES: ServiceId = ServiceId(0);

#[derive(Debug, Serialize)]
pub struct InitiatePaymentRequest {
    /// Whole rupees; the backend converts to paise
    pub amount: i64,
}

/// Upload responses come back either as a bare list or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UploadFilesResponse {
    Records(Vec<UploadedFileRecord>),
    Wrapped {
        uploaded_files: Vec<UploadedFileRecord>,
    },
}

impl UploadFilesResponse {
    pub fn into_records(self) -> Vec<UploadedFileRecord> {
        match self {
            UploadFilesResponse::Records(records) => records,
            UploadFilesResponse::Wrapped { uploaded_files } => uploaded_files,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateFileUrlRequest<'a> {
    file_url: &'a str,
}

impl ApiClient {
    /// List the service catalogue.
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        self.get("/services/", &[]).await
    }

    pub async fn get_service(&self, id: ServiceId) -> Result<Service> {
        self.get(&format!("/services/{}/", id), &[]).await
    }

    /// Active vendors offering `service_id` near `origin`, nearest first.
    /// Pass `ALL_SERVICES` to search regardless of service.
    pub async fn vendors_near(&self, service_id: ServiceId, origin: Coordinates) -> Result<Vec<Vendor>> {
        if !origin.is_valid() {
            return Err(AppError::InvalidInput(format!(
                "Invalid coordinates: {}, {}",
                origin.latitude, origin.longitude
            ))
            .into());
        }
        let query = [
            ("latitude", origin.latitude.to_string()),
            ("longitude", origin.longitude.to_string()),
        ];
        self.get(&format!("/services/{}/vendors/", service_id), &query)
            .await
    }

    pub async fn list_vendors(&self) -> Result<Vec<Vendor>> {
        self.get("/vendors/", &[]).await
    }

    pub async fn get_vendor(&self, id: VendorId) -> Result<Vendor> {
        self.get(&format!("/vendors/{}/", id), &[]).await
    }

    /// Upload every file in the submission for one vendor.
    ///
    /// Files go out as repeated `files` parts; `service_ids` is comma-joined and
    /// aligned with the file order. The endpoint answers 201 on success.
    pub async fn upload_files(
        &self,
        vendor_id: VendorId,
        submission: &Submission,
    ) -> Result<Vec<UploadedFileRecord>> {
        if submission.is_empty() {
            return Err(AppError::InvalidInput("No files provided".to_string()).into());
        }

        let form = build_upload_form(vendor_id, submission).await?;

        tracing::info!(
            vendor_id = %vendor_id,
            file_count = submission.len(),
            total_size = submission.total_size(),
            "Uploading files"
        );

        let response = self
            .post_multipart_raw("/uploads/store-file-url/", form)
            .await?;
        if response.status() != StatusCode::CREATED {
            // Any other 2xx is unexpected; treat it like an error status.
            let status = response.status();
            let response = check_status(response).await?;
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api {
                status: status.as_u16(),
                message: format!("Unexpected upload response: {}", body),
            }
            .into());
        }

        let body: UploadFilesResponse = response
            .json()
            .await
            .context("Failed to parse upload response as JSON")?;
        Ok(body.into_records())
    }

    /// Stored uploads, optionally only those for one vendor.
    pub async fn list_uploaded_files(
        &self,
        vendor_id: Option<VendorId>,
    ) -> Result<Vec<UploadedFileRecord>> {
        let path = match vendor_id {
            Some(id) => format!("/uploads/get-files/{}/", id),
            None => "/uploads/get-files/".to_string(),
        };
        self.get(&path, &[]).await
    }

    pub async fn update_file_url(&self, file_id: i64, file_url: &str) -> Result<UploadedFileRecord> {
        let request = self
            .client()
            .put(self.build_url(&format!("/uploads/update-file-url/{}/", file_id)))
            .json(&UpdateFileUrlRequest { file_url });
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))
            .context("Failed to send request")?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    pub async fn delete_uploaded_file(&self, file_id: i64) -> Result<()> {
        self.delete(&format!("/uploads/delete-file/{}/", file_id))
            .await
    }

    /// Create a gateway order for `amount`.
    pub async fn initiate_payment(&self, amount: PaymentAmount) -> Result<PaymentOrder> {
        if !amount.is_positive() {
            return Err(AppError::InvalidInput("Amount must be greater than zero".to_string()).into());
        }
        let rupees = amount.whole_units().ok_or_else(|| {
            AppError::InvalidInput(format!("Amount must be a whole number of rupees: {}", amount))
        })?;
        self.post_json_with_csrf(
            "/payments/initiate-payment/",
            &InitiatePaymentRequest { amount: rupees },
        )
        .await
    }

    /// Ask the backend to check the gateway signature.
    ///
    /// A failed verification comes back as 400 with `{"status": "failure"}`;
    /// that is reported as a response, not an error.
    pub async fn verify_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerifyPaymentResponse> {
        let token = self.fetch_csrf_token().await?;
        let request = self
            .client()
            .post(self.build_url("/payments/verify-payment/"))
            .header(crate::CSRF_HEADER, token)
            .json(confirmation);
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))
            .context("Failed to send request")?;

        if response.status() == StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<VerifyPaymentResponse>(&body) {
                return Ok(parsed);
            }
            return Err(AppError::from_status(400, body).into());
        }

        let response = check_status(response).await?;
        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }
}

async fn build_upload_form(vendor_id: VendorId, submission: &Submission) -> Result<Form> {
    let service_ids = submission
        .service_ids()
        .iter()
        .map(ServiceId::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut form = Form::new()
        .text("vendor_id", vendor_id.to_string())
        .text("service_ids", service_ids);

    for entry in &submission.entries {
        let data = match &entry.file.content {
            ContentRef::Path(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read file: {}", path.display()))?,
            ContentRef::Memory(bytes) => bytes.to_vec(),
        };
        let part = Part::bytes(data)
            .file_name(entry.file.name.clone())
            .mime_str(&entry.file.mime_type)
            .with_context(|| format!("Invalid MIME type: {}", entry.file.mime_type))?;
        form = form.part("files", part);
    }

    Ok(form)
}
