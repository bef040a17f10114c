//! BG-Prints workflows
//!
//! Async workflows that sit between a front-end and the core crate. Every
//! external surface (file picker, confirmation dialog, upload transport,
//! checkout sheet, identity provider) is an injected trait object so hosts can
//! swap the real adapters for their own.

pub mod account;
pub mod payment;
pub mod upload;

pub use account::{
    AccountError, AccountService, AuthSession, IdentityError, IdentityProvider, MfaChallenge,
    SignInOutcome, SignUpOutcome,
};
pub use payment::{
    CheckoutGateway, CheckoutOutcome, HttpPaymentBackend, PaymentBackend, PaymentError,
    PaymentOutcome, PaymentWorkflow,
};
pub use upload::{
    AttachOutcome, Confirmation, ConfirmationPrompt, ConfirmationRequest, FilePicker,
    HttpUploadTransport, PickOutcome, PickerError, RemoveOutcome, TransportOutcome, UploadError,
    UploadSession, UploadTransport,
};

use bgprints_core::AppError;

/// Recover the typed error behind an API client failure.
pub(crate) fn into_app_error(err: anyhow::Error) -> AppError {
    match err.downcast::<AppError>() {
        Ok(app_err) => app_err,
        Err(other) => AppError::from(other),
    }
}
