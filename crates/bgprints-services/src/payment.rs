//! Payment workflow: order creation, checkout and server-side verification.

use std::sync::Arc;

use async_trait::async_trait;
use bgprints_api_client::ApiClient;
use bgprints_core::models::{
    CheckoutRequest, PaymentAmount, PaymentConfirmation, PaymentContact, PaymentOrder,
    VerificationStatus,
};
use bgprints_core::validation::validate_payment_contact;
use bgprints_core::{AppError, ErrorMetadata, FieldError, LogLevel};

use crate::into_app_error;

pub const CHECKOUT_DESCRIPTION: &str = "File Processing Payment";
pub const MERCHANT_NAME: &str = "BG-Print";

/// Backend side of a payment: creates orders and checks signatures.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn initiate(&self, amount: PaymentAmount) -> Result<PaymentOrder, AppError>;

    async fn verify(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerificationStatus, AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Completed(PaymentConfirmation),
    Cancelled,
    Failed(String),
}

/// Checkout sheet where the user actually pays.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn open(&self, request: &CheckoutRequest) -> CheckoutOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid(PaymentConfirmation),
    Cancelled,
    VerificationFailed(PaymentConfirmation),
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Incomplete payment information")]
    IncompleteInformation(Vec<FieldError>),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error(transparent)]
    Backend(#[from] AppError),

    #[error("Checkout failed: {0}")]
    CheckoutFailed(String),
}

impl ErrorMetadata for PaymentError {
    fn error_code(&self) -> &'static str {
        match self {
            PaymentError::IncompleteInformation(_) => "INCOMPLETE_INFORMATION",
            PaymentError::InvalidAmount(_) => "INVALID_AMOUNT",
            PaymentError::Backend(err) => err.error_code(),
            PaymentError::CheckoutFailed(_) => "CHECKOUT_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            PaymentError::Backend(err) => err.is_recoverable(),
            PaymentError::CheckoutFailed(_) => true,
            _ => false,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            PaymentError::IncompleteInformation(_) => Some("Fill in name, email and contact"),
            PaymentError::InvalidAmount(_) => Some("Enter an amount greater than zero"),
            PaymentError::Backend(err) => err.suggested_action(),
            PaymentError::CheckoutFailed(_) => {
                Some("Try again or contact support if the issue persists")
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            PaymentError::IncompleteInformation(_) => {
                "Please fill in all fields to proceed.".to_string()
            }
            PaymentError::InvalidAmount(msg) => msg.clone(),
            PaymentError::Backend(_) => {
                "We're experiencing technical difficulties. Please try again later or contact support."
                    .to_string()
            }
            PaymentError::CheckoutFailed(_) => {
                "The payment process was interrupted. Please try again or contact support if the issue persists."
                    .to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            PaymentError::Backend(err) => err.log_level(),
            PaymentError::CheckoutFailed(_) => LogLevel::Warn,
            _ => LogLevel::Debug,
        }
    }
}

pub struct PaymentWorkflow {
    backend: Arc<dyn PaymentBackend>,
    checkout: Arc<dyn CheckoutGateway>,
    key_id: Option<String>,
}

impl PaymentWorkflow {
    pub fn new(backend: Arc<dyn PaymentBackend>, checkout: Arc<dyn CheckoutGateway>) -> Self {
        Self {
            backend,
            checkout,
            key_id: None,
        }
    }

    /// Public key id the checkout sheet is opened with.
    pub fn with_key_id(mut self, key_id: Option<String>) -> Self {
        self.key_id = key_id;
        self
    }

    /// Run one payment end to end.
    pub async fn pay(
        &self,
        amount: PaymentAmount,
        contact: PaymentContact,
    ) -> Result<PaymentOutcome, PaymentError> {
        validate_payment_contact(&contact).map_err(PaymentError::IncompleteInformation)?;
        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount(format!(
                "Amount must be greater than zero, got {}",
                amount
            )));
        }

        let order = self.backend.initiate(amount).await?;
        tracing::info!(order_id = %order.id, amount = order.amount, currency = %order.currency, "Payment order created");

        let request = CheckoutRequest {
            key_id: self.key_id.clone(),
            order_id: order.id.clone(),
            amount: order.amount,
            currency: order.currency.clone(),
            description: CHECKOUT_DESCRIPTION.to_string(),
            merchant_name: MERCHANT_NAME.to_string(),
            prefill: contact,
        };

        let confirmation = match self.checkout.open(&request).await {
            CheckoutOutcome::Completed(confirmation) => confirmation,
            CheckoutOutcome::Cancelled => {
                tracing::info!(order_id = %order.id, "Checkout cancelled");
                return Ok(PaymentOutcome::Cancelled);
            }
            CheckoutOutcome::Failed(reason) => {
                tracing::warn!(order_id = %order.id, reason = %reason, "Checkout failed");
                return Err(PaymentError::CheckoutFailed(reason));
            }
        };

        if confirmation.razorpay_order_id != order.id {
            tracing::warn!(
                order_id = %order.id,
                returned_order_id = %confirmation.razorpay_order_id,
                "Checkout returned a different order"
            );
            return Ok(PaymentOutcome::VerificationFailed(confirmation));
        }

        match self.backend.verify(&confirmation).await? {
            VerificationStatus::Success => {
                tracing::info!(order_id = %order.id, payment_id = %confirmation.razorpay_payment_id, "Payment verified");
                Ok(PaymentOutcome::Paid(confirmation))
            }
            VerificationStatus::Failure => {
                tracing::warn!(order_id = %order.id, "Payment verification failed");
                Ok(PaymentOutcome::VerificationFailed(confirmation))
            }
        }
    }
}

/// Payment backend over the REST API.
#[derive(Clone)]
pub struct HttpPaymentBackend {
    client: ApiClient,
}

impl HttpPaymentBackend {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PaymentBackend for HttpPaymentBackend {
    async fn initiate(&self, amount: PaymentAmount) -> Result<PaymentOrder, AppError> {
        self.client
            .initiate_payment(amount)
            .await
            .map_err(into_app_error)
    }

    async fn verify(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<VerificationStatus, AppError> {
        self.client
            .verify_payment(confirmation)
            .await
            .map(|response| response.status)
            .map_err(into_app_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    struct FakeBackend {
        verdict: VerificationStatus,
        initiated: Mutex<Vec<PaymentAmount>>,
        verified: Mutex<Vec<PaymentConfirmation>>,
    }

    impl FakeBackend {
        fn new(verdict: VerificationStatus) -> Arc<Self> {
            Arc::new(Self {
                verdict,
                initiated: Mutex::new(Vec::new()),
                verified: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PaymentBackend for FakeBackend {
        async fn initiate(&self, amount: PaymentAmount) -> Result<PaymentOrder, AppError> {
            self.initiated.lock().unwrap().push(amount);
            Ok(PaymentOrder {
                id: "order_1".to_string(),
                amount: amount.minor_units().unwrap_or_default(),
                currency: "INR".to_string(),
                receipt: None,
                status: Some("created".to_string()),
            })
        }

        async fn verify(
            &self,
            confirmation: &PaymentConfirmation,
        ) -> Result<VerificationStatus, AppError> {
            self.verified.lock().unwrap().push(confirmation.clone());
            Ok(self.verdict)
        }
    }

    struct FakeCheckout {
        outcome: CheckoutOutcome,
        opened: Mutex<Vec<CheckoutRequest>>,
    }

    impl FakeCheckout {
        fn new(outcome: CheckoutOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                opened: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CheckoutGateway for FakeCheckout {
        async fn open(&self, request: &CheckoutRequest) -> CheckoutOutcome {
            self.opened.lock().unwrap().push(request.clone());
            self.outcome.clone()
        }
    }

    fn confirmation(order_id: &str) -> PaymentConfirmation {
        PaymentConfirmation {
            razorpay_payment_id: "pay_1".to_string(),
            razorpay_order_id: order_id.to_string(),
            razorpay_signature: "sig".to_string(),
        }
    }

    fn contact() -> PaymentContact {
        PaymentContact {
            name: "Asha".to_string(),
            email: "asha@gmail.com".to_string(),
            contact: "919876543210".to_string(),
        }
    }

    fn amount() -> PaymentAmount {
        PaymentAmount(Decimal::from(250))
    }

    #[tokio::test]
    async fn verified_payment_is_paid() {
        let backend = FakeBackend::new(VerificationStatus::Success);
        let checkout = FakeCheckout::new(CheckoutOutcome::Completed(confirmation("order_1")));
        let workflow = PaymentWorkflow::new(backend.clone(), checkout.clone())
            .with_key_id(Some("rzp_test".to_string()));

        let outcome = workflow.pay(amount(), contact()).await.unwrap();
        assert_eq!(outcome, PaymentOutcome::Paid(confirmation("order_1")));

        let opened = checkout.opened.lock().unwrap();
        assert_eq!(opened[0].amount, 25000);
        assert_eq!(opened[0].description, "File Processing Payment");
        assert_eq!(opened[0].merchant_name, "BG-Print");
        assert_eq!(opened[0].key_id.as_deref(), Some("rzp_test"));
        assert_eq!(opened[0].prefill, contact());
        assert_eq!(backend.verified.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_contact_fields_stop_before_backend() {
        let backend = FakeBackend::new(VerificationStatus::Success);
        let workflow = PaymentWorkflow::new(
            backend.clone(),
            FakeCheckout::new(CheckoutOutcome::Cancelled),
        );

        let mut incomplete = contact();
        incomplete.email = "  ".to_string();
        let err = workflow.pay(amount(), incomplete).await.unwrap_err();

        assert!(matches!(err, PaymentError::IncompleteInformation(ref fields) if fields.len() == 1));
        assert_eq!(err.client_message(), "Please fill in all fields to proceed.");
        assert!(backend.initiated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let backend = FakeBackend::new(VerificationStatus::Success);
        let workflow = PaymentWorkflow::new(
            backend.clone(),
            FakeCheckout::new(CheckoutOutcome::Cancelled),
        );

        let err = workflow
            .pay(PaymentAmount(Decimal::ZERO), contact())
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidAmount(_)));
        assert!(backend.initiated.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_checkout_skips_verification() {
        let backend = FakeBackend::new(VerificationStatus::Success);
        let workflow = PaymentWorkflow::new(
            backend.clone(),
            FakeCheckout::new(CheckoutOutcome::Cancelled),
        );

        let outcome = workflow.pay(amount(), contact()).await.unwrap();
        assert_eq!(outcome, PaymentOutcome::Cancelled);
        assert!(backend.verified.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_checkout_is_an_error() {
        let workflow = PaymentWorkflow::new(
            FakeBackend::new(VerificationStatus::Success),
            FakeCheckout::new(CheckoutOutcome::Failed("card declined".to_string())),
        );

        let err = workflow.pay(amount(), contact()).await.unwrap_err();
        assert!(matches!(err, PaymentError::CheckoutFailed(ref r) if r == "card declined"));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn rejected_signature_is_verification_failure() {
        let workflow = PaymentWorkflow::new(
            FakeBackend::new(VerificationStatus::Failure),
            FakeCheckout::new(CheckoutOutcome::Completed(confirmation("order_1"))),
        );

        let outcome = workflow.pay(amount(), contact()).await.unwrap();
        assert_eq!(
            outcome,
            PaymentOutcome::VerificationFailed(confirmation("order_1"))
        );
    }

    #[tokio::test]
    async fn mismatched_order_is_not_sent_for_verification() {
        let backend = FakeBackend::new(VerificationStatus::Success);
        let workflow = PaymentWorkflow::new(
            backend.clone(),
            FakeCheckout::new(CheckoutOutcome::Completed(confirmation("order_other"))),
        );

        let outcome = workflow.pay(amount(), contact()).await.unwrap();
        assert!(matches!(outcome, PaymentOutcome::VerificationFailed(_)));
        assert!(backend.verified.lock().unwrap().is_empty());
    }
}
