//! Terminal implementations of the service collaborators.
//!
//! Every adapter reads from one shared `Terminal`, so the upload shell, the file
//! picker and the confirmation prompt consume the same input stream in order.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bgprints_core::models::{CheckoutRequest, ContentRef, FileHandle, PaymentConfirmation};
use bgprints_services::{
    CheckoutGateway, CheckoutOutcome, Confirmation, ConfirmationPrompt, ConfirmationRequest,
    FilePicker, PickOutcome, PickerError,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Line-oriented input shared by the interactive adapters.
pub struct Terminal<R> {
    lines: Mutex<Lines<R>>,
}

impl Terminal<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> Terminal<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Print `prompt` and read one trimmed line. `None` at end of input.
    pub async fn ask(&self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{}", prompt);
        std::io::stdout().flush()?;
        let mut lines = self.lines.lock().await;
        Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
    }
}

/// Build a handle for a file on disk; the bytes are read at upload time.
pub async fn file_handle_from_path(path: &Path) -> Result<FileHandle, PickerError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| PickerError::Unreadable(format!("{}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(PickerError::Unreadable(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PickerError::Unreadable(format!("{} has no usable name", path.display())))?;
    let mime_type = mime_guess::from_path(path).first_or_octet_stream();

    Ok(FileHandle::new(
        name,
        metadata.len(),
        mime_type.essence_str(),
        ContentRef::Path(path.to_path_buf()),
    ))
}

/// Asks for a path on the terminal; a blank answer cancels the pick.
pub struct PathPicker<R> {
    terminal: Arc<Terminal<R>>,
}

impl<R> PathPicker<R> {
    pub fn new(terminal: Arc<Terminal<R>>) -> Self {
        Self { terminal }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FilePicker for PathPicker<R> {
    async fn pick(&self) -> Result<PickOutcome, PickerError> {
        let answer = self
            .terminal
            .ask("File path (blank to cancel): ")
            .await
            .map_err(|e| PickerError::Unavailable(e.to_string()))?;

        match answer {
            None => Ok(PickOutcome::Cancelled),
            Some(path) if path.is_empty() => Ok(PickOutcome::Cancelled),
            Some(path) => file_handle_from_path(Path::new(&path))
                .await
                .map(PickOutcome::Picked),
        }
    }
}

/// Yes/no question on the terminal. Anything but "y"/"yes" declines.
pub struct TerminalPrompt<R> {
    terminal: Arc<Terminal<R>>,
}

impl<R> TerminalPrompt<R> {
    pub fn new(terminal: Arc<Terminal<R>>) -> Self {
        Self { terminal }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> ConfirmationPrompt for TerminalPrompt<R> {
    async fn confirm(&self, request: &ConfirmationRequest) -> Confirmation {
        let question = format!("{}: {} [y/N] ", request.title, request.message);
        match self.terminal.ask(&question).await {
            Ok(Some(answer)) if matches!(answer.to_lowercase().as_str(), "y" | "yes") => {
                Confirmation::Confirmed
            }
            Ok(_) => Confirmation::Cancelled,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read confirmation");
                Confirmation::Cancelled
            }
        }
    }
}

/// Confirms everything (`--yes`).
pub struct AutoConfirm;

#[async_trait]
impl ConfirmationPrompt for AutoConfirm {
    async fn confirm(&self, _request: &ConfirmationRequest) -> Confirmation {
        Confirmation::Confirmed
    }
}

/// Checkout done out of band: the user pays on the gateway's hosted page and
/// types back the payment id and signature it shows.
pub struct ManualCheckout<R> {
    terminal: Arc<Terminal<R>>,
}

impl<R> ManualCheckout<R> {
    pub fn new(terminal: Arc<Terminal<R>>) -> Self {
        Self { terminal }
    }
}

/// Minor units as a decimal amount ("14950" -> "149.50").
pub fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> CheckoutGateway for ManualCheckout<R> {
    async fn open(&self, request: &CheckoutRequest) -> CheckoutOutcome {
        println!(
            "\n{} - {}\nAmount: {} {}\nOrder: {}",
            request.merchant_name,
            request.description,
            format_minor_units(request.amount),
            request.currency,
            request.order_id
        );
        if let Some(key_id) = &request.key_id {
            println!("Key: {}", key_id);
        }
        println!(
            "Paying as {} <{}>, {}",
            request.prefill.name, request.prefill.email, request.prefill.contact
        );

        let payment_id = match self.terminal.ask("Payment ID (blank to cancel): ").await {
            Ok(Some(id)) if !id.is_empty() => id,
            Ok(_) => return CheckoutOutcome::Cancelled,
            Err(e) => return CheckoutOutcome::Failed(e.to_string()),
        };
        let signature = match self.terminal.ask("Signature (blank to cancel): ").await {
            Ok(Some(sig)) if !sig.is_empty() => sig,
            Ok(_) => return CheckoutOutcome::Cancelled,
            Err(e) => return CheckoutOutcome::Failed(e.to_string()),
        };

        CheckoutOutcome::Completed(PaymentConfirmation {
            razorpay_payment_id: payment_id,
            razorpay_order_id: request.order_id.clone(),
            razorpay_signature: signature,
        })
    }
}
