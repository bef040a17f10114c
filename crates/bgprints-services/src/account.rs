//! Account service: sign-up, confirmation, sign-in with optional MFA, sign-out.
//!
//! Forms are validated locally before the identity provider is contacted.

use std::sync::Arc;

use async_trait::async_trait;
use bgprints_core::validation::{validate_confirmation_code, validate_username, LoginForm, SignupForm};
use bgprints_core::{ErrorMetadata, FieldError, LogLevel};
use chrono::NaiveDate;

/// Tokens for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub username: String,
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Second factor requested by the provider during sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfaChallenge {
    pub username: String,
    /// Opaque provider session carried into the code submission
    pub session: String,
    pub destination: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn(AuthSession),
    MfaRequired(MfaChallenge),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// A confirmation code was sent; `destination` is where, if the provider says.
    ConfirmationRequired { destination: Option<String> },
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Incorrect username or password")]
    NotAuthorized,

    #[error("User is not confirmed")]
    UserNotConfirmed,

    #[error("Username already exists")]
    UsernameExists,

    #[error("Invalid verification code")]
    CodeMismatch,

    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// Hosted identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, form: &SignupForm) -> Result<SignUpOutcome, IdentityError>;

    async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), IdentityError>;

    async fn sign_in(&self, form: &LoginForm) -> Result<SignInOutcome, IdentityError>;

    async fn submit_mfa_code(
        &self,
        challenge: &MfaChallenge,
        code: &str,
    ) -> Result<AuthSession, IdentityError>;

    async fn sign_out(&self, session: &AuthSession) -> Result<(), IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Invalid form: {}", join(.0))]
    Invalid(Vec<FieldError>),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("No MFA challenge is pending")]
    NoPendingChallenge,

    #[error("Not signed in")]
    NotSignedIn,
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Vec<FieldError>> for AccountError {
    fn from(errors: Vec<FieldError>) -> Self {
        AccountError::Invalid(errors)
    }
}

impl From<FieldError> for AccountError {
    fn from(error: FieldError) -> Self {
        AccountError::Invalid(vec![error])
    }
}

impl ErrorMetadata for AccountError {
    fn error_code(&self) -> &'static str {
        match self {
            AccountError::Invalid(_) => "VALIDATION_FAILED",
            AccountError::Identity(IdentityError::NotAuthorized) => "NOT_AUTHORIZED",
            AccountError::Identity(IdentityError::UserNotConfirmed) => "USER_NOT_CONFIRMED",
            AccountError::Identity(IdentityError::UsernameExists) => "USERNAME_EXISTS",
            AccountError::Identity(IdentityError::CodeMismatch) => "CODE_MISMATCH",
            AccountError::Identity(IdentityError::Provider(_)) => "IDENTITY_PROVIDER_ERROR",
            AccountError::NoPendingChallenge => "NO_PENDING_CHALLENGE",
            AccountError::NotSignedIn => "NOT_SIGNED_IN",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, AccountError::Identity(IdentityError::Provider(_)))
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AccountError::Invalid(_) => Some("Correct the highlighted fields"),
            AccountError::Identity(IdentityError::UserNotConfirmed) => {
                Some("Enter the confirmation code sent to you")
            }
            AccountError::Identity(IdentityError::CodeMismatch) => Some("Check the code and retry"),
            AccountError::NoPendingChallenge => Some("Sign in again"),
            _ => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            AccountError::Invalid(errors) => errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "Please check the form.".to_string()),
            AccountError::Identity(IdentityError::Provider(_)) => {
                "Something went wrong. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AccountError::Identity(IdentityError::Provider(_)) => LogLevel::Error,
            _ => LogLevel::Debug,
        }
    }
}

pub struct AccountService {
    provider: Arc<dyn IdentityProvider>,
    session: Option<AuthSession>,
    pending: Option<MfaChallenge>,
}

impl AccountService {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            session: None,
            pending: None,
        }
    }

    pub fn current_session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    pub fn pending_challenge(&self) -> Option<&MfaChallenge> {
        self.pending.as_ref()
    }

    /// Register a new user. `today` anchors the minimum-age check.
    pub async fn sign_up(
        &self,
        form: &SignupForm,
        today: NaiveDate,
    ) -> Result<SignUpOutcome, AccountError> {
        form.validate(today)?;
        let outcome = self.provider.sign_up(form).await?;
        tracing::info!(username = %form.username, "Sign-up submitted");
        Ok(outcome)
    }

    pub async fn confirm_sign_up(&self, username: &str, code: &str) -> Result<(), AccountError> {
        let errors: Vec<FieldError> = [validate_username(username), validate_confirmation_code(code)]
            .into_iter()
            .filter_map(Result::err)
            .collect();
        if !errors.is_empty() {
            return Err(AccountError::Invalid(errors));
        }

        self.provider.confirm_sign_up(username, code.trim()).await?;
        tracing::info!(username = %username, "Sign-up confirmed");
        Ok(())
    }

    pub async fn sign_in(&mut self, form: &LoginForm) -> Result<SignInOutcome, AccountError> {
        form.check()?;

        let outcome = self.provider.sign_in(form).await.inspect_err(|e| {
            tracing::debug!(username = %form.username, error = %e, "Sign-in failed");
        })?;

        match &outcome {
            SignInOutcome::SignedIn(session) => {
                tracing::info!(username = %session.username, "Signed in");
                self.session = Some(session.clone());
                self.pending = None;
            }
            SignInOutcome::MfaRequired(challenge) => {
                tracing::info!(username = %challenge.username, "MFA code required");
                self.pending = Some(challenge.clone());
            }
        }
        Ok(outcome)
    }

    /// Answer the pending MFA challenge. A wrong code keeps the challenge so the
    /// user can retry.
    pub async fn submit_mfa_code(&mut self, code: &str) -> Result<AuthSession, AccountError> {
        validate_confirmation_code(code)?;
        let challenge = self.pending.as_ref().ok_or(AccountError::NoPendingChallenge)?;

        let session = self.provider.submit_mfa_code(challenge, code.trim()).await?;
        tracing::info!(username = %session.username, "Signed in with MFA");
        self.pending = None;
        self.session = Some(session.clone());
        Ok(session)
    }

    /// Sign out. The local session is dropped even if the provider call fails.
    pub async fn sign_out(&mut self) -> Result<(), AccountError> {
        let session = self.session.take().ok_or(AccountError::NotSignedIn)?;
        self.pending = None;
        self.provider.sign_out(&session).await?;
        tracing::info!(username = %session.username, "Signed out");
        Ok(())
    }
}
