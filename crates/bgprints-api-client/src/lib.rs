//! Shared HTTP client for the BG-Prints backend API.
//!
//! Provides a minimal client with optional Bearer auth, generic GET/POST
//! helpers, CSRF handling for the payment endpoints, and domain methods
//! (services, vendors, uploads, payments). The services and CLI crates use
//! this client directly.

pub mod api;

use std::time::Duration;

use anyhow::{Context, Result};
use bgprints_core::{AppError, ClientConfig};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

/// Authentication strategy for the API.
#[derive(Clone, Debug, Default)]
pub enum Auth {
    /// Anonymous requests (catalogue browsing)
    #[default]
    None,
    /// `Authorization: Bearer {token}` from a signed-in session
    Bearer(String),
}

/// Header Django expects the CSRF token in.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// HTTP client for the BG-Prints API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(60))
    }

    pub fn with_timeout(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Auth::None,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::with_timeout(
            config.api_url.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    /// Create client from environment (BGPRINTS_API_URL or API_URL).
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env().context("Invalid client configuration")?;
        Self::from_config(&config)
    }

    /// Same client, authenticated with the given session token.
    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
        }
    }

    /// Send a request with auth applied; non-success statuses become an
    /// `AppError` classified by status code.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .apply_auth(request)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))
            .context("Failed to send request")?;

        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;
        Ok(body)
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        self.send_json(request).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.post(self.build_url(path)).json(body);
        self.send_json(request).await
    }

    /// POST JSON body with the CSRF token the payment views require.
    pub async fn post_json_with_csrf<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let token = self.fetch_csrf_token().await?;
        let request = self
            .client
            .post(self.build_url(path))
            .header(CSRF_HEADER, token)
            .json(body);
        self.send_json(request).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let request = self.client.post(self.build_url(path)).multipart(form);
        self.send_json(request).await
    }

    /// POST multipart form, returning the raw response whatever its status.
    pub async fn post_multipart_raw(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Response> {
        let request = self.client.post(self.build_url(path)).multipart(form);
        self.apply_auth(request)
            .send()
            .await
            .map_err(|e| AppError::Network(e.to_string()))
            .context("Failed to send request")
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.client.delete(self.build_url(path));
        self.send(request).await?;
        Ok(())
    }

    /// Fetch a CSRF token; the session cookie lands in the client's cookie store.
    pub async fn fetch_csrf_token(&self) -> Result<String> {
        #[derive(serde::Deserialize)]
        struct CsrfResponse {
            #[serde(rename = "csrfToken")]
            csrf_token: String,
        }

        let response: CsrfResponse = self
            .get("/payments/get-csrf-token/", &[])
            .await
            .context("Failed to fetch CSRF token")?;
        Ok(response.csrf_token)
    }

    /// Raw client for custom requests. Caller must apply auth via build_url and headers.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Turn a non-success response into an `AppError`.
pub async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::debug!(status = %status, body = %error_text, "API request failed");
    Err(AppError::from_status(status.as_u16(), error_message(status, &error_text)).into())
}

/// Pull `{"error": "..."}` out of a backend error body, falling back to the raw text.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                body.to_string()
            }
        })
}

// Re-export domain types for convenience.
pub use api::{InitiatePaymentRequest, UploadFilesResponse};
pub use bgprints_core::models::{
    PaymentConfirmation, PaymentOrder, Service, UploadedFileRecord, Vendor, VerifyPaymentResponse,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"error":"Maximum 5 files allowed"}"#),
            "Maximum 5 files allowed"
        );
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, "Amount is required"),
            "Amount is required"
        );
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:8000/".to_string()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(
            client.build_url("/services/"),
            "http://localhost:8000/services/"
        );
    }
}
