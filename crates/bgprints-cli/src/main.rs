//! BG-Prints CLI: browse print services and vendors, upload files, pay.
//!
//! Set BGPRINTS_API_URL (or API_URL). Quota limits and the search radius come
//! from the BGPRINTS_* variables; see `ClientConfig::from_env`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bgprints_api_client::api::ALL_SERVICES;
use bgprints_api_client::ApiClient;
use bgprints_cli::adapters::{
    file_handle_from_path, AutoConfirm, ManualCheckout, PathPicker, Terminal, TerminalPrompt,
};
use bgprints_cli::{init_tracing, parse_attachment, render_snapshot, shell, truncate_string};
use bgprints_core::discovery::distance_to;
use bgprints_core::models::{PaymentAmount, PaymentContact, ServiceId, Vendor, VendorId};
use bgprints_core::{
    filter_vendors, sort_vendors, within_radius, ClientConfig, Coordinates, ErrorMetadata,
    VendorSort,
};
use bgprints_services::{
    AttachOutcome, ConfirmationPrompt, HttpPaymentBackend, HttpUploadTransport, PaymentOutcome,
    PaymentWorkflow, UploadSession,
};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "bgprints", about = "BG-Prints marketplace CLI")]
struct Cli {
    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the service catalogue
    Services,
    /// Find vendors near a location
    Vendors {
        /// Only vendors offering this service (default: any)
        #[arg(long)]
        service: Option<ServiceId>,
        /// Latitude of the search origin
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude of the search origin
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Match business or service name
        #[arg(long)]
        search: Option<String>,
        /// Sort order: rating, distance or none
        #[arg(long, default_value = "none")]
        sort: VendorSort,
        /// Search radius in km (default: BGPRINTS_SEARCH_RADIUS_KM)
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Show one vendor
    Vendor {
        /// Vendor ID
        id: VendorId,
    },
    /// Attach files for a vendor's services and upload them
    Upload {
        /// Vendor ID
        #[arg(long)]
        vendor: VendorId,
        /// SERVICE=PATH, repeatable
        #[arg(long = "attach", value_parser = parse_attachment)]
        attach: Vec<(ServiceId, PathBuf)>,
        /// Upload the attached files without opening the shell
        #[arg(long)]
        submit: bool,
        /// Remove without asking for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// List uploaded files
    Files {
        /// Only files for this vendor
        #[arg(long)]
        vendor: Option<VendorId>,
    },
    /// Delete an uploaded file record
    DeleteFile {
        /// File record ID
        id: i64,
    },
    /// Pay for file processing
    Pay {
        /// Amount in rupees
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        contact: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn print_vendor_table(vendors: &[&Vendor], origin: Coordinates) {
    if vendors.is_empty() {
        println!("No vendors found.");
        return;
    }

    println!(
        "{:>6} {:<30} {:>6} {:>9}  {}",
        "ID", "Business", "Rating", "Dist (km)", "Services"
    );
    println!("{}", "-".repeat(90));
    for vendor in vendors {
        let rating = vendor
            .rating()
            .map(|r| format!("{:.1}", r))
            .unwrap_or_else(|| "-".to_string());
        let distance = distance_to(vendor, origin)
            .map(|d| format!("{:.2}", d))
            .unwrap_or_else(|| "-".to_string());
        let services = vendor
            .active_services()
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:>6} {:<30} {:>6} {:>9}  {}",
            vendor.id,
            truncate_string(&vendor.business_name, 30),
            rating,
            distance,
            truncate_string(&services, 40)
        );
    }
}

fn print_vendor(vendor: &Vendor) {
    println!("\n=== {} (#{}) ===\n", vendor.business_name, vendor.id);
    println!("Contact:   {} <{}> {}", vendor.contact_person, vendor.contact_email, vendor.contact_phone_number);
    println!("Address:   {}", vendor.address);
    println!(
        "Location:  {}, {}",
        vendor.location_latitude, vendor.location_longitude
    );
    println!(
        "Rating:    {}",
        vendor.reviews_and_ratings.as_deref().unwrap_or("-")
    );
    println!("Formats:   {}", vendor.accepted_file_formats);
    println!("Pricing:   {}", vendor.pricing_information);
    println!("Payments:  {}", vendor.payment_methods);
    println!("\nServices:");
    for service in vendor.active_services() {
        println!("  {:>4}  {:<30} {}", service.id, service.name, service.pricing);
    }
}

async fn run_upload(
    client: &ApiClient,
    config: &ClientConfig,
    vendor_id: VendorId,
    attach: Vec<(ServiceId, PathBuf)>,
    submit: bool,
    yes: bool,
) -> anyhow::Result<()> {
    let vendor = client
        .get_vendor(vendor_id)
        .await
        .with_context(|| format!("Failed to load vendor {}", vendor_id))?;

    let terminal = Arc::new(Terminal::stdin());
    let prompt: Arc<dyn ConfirmationPrompt> = if yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(TerminalPrompt::new(terminal.clone()))
    };
    let mut session = UploadSession::for_vendor(
        &vendor,
        config.quota,
        Arc::new(PathPicker::new(terminal.clone())),
        prompt,
        Arc::new(HttpUploadTransport::new(client.clone())),
    );
    tracing::debug!(session_id = %session.id(), vendor = %vendor.business_name, "Upload session ready");

    for (service_id, path) in attach {
        let file = file_handle_from_path(&path)
            .await
            .with_context(|| format!("Cannot attach {}", path.display()))?;
        match session.attach_file(service_id, file) {
            Ok(AttachOutcome::Attached(_)) | Ok(AttachOutcome::Cancelled) => {}
            Err(e) => shell::report(&e),
        }
    }

    let limits = session.limits();
    if submit {
        print!(
            "{}",
            render_snapshot(&session.snapshot(), limits.max_files, limits.max_total_size)
        );
        let receipt = session.submit().await.map_err(|e| {
            shell::report(&e);
            anyhow::anyhow!(e)
        })?;
        println!(
            "Files have been successfully uploaded ({} stored).",
            receipt.file_count()
        );
        return Ok(());
    }

    println!("Uploading to {}", vendor.business_name);
    let services: Vec<_> = vendor.active_services().into_iter().cloned().collect();
    shell::run(&mut session, terminal.as_ref(), &services).await
}

async fn run_payment(
    client: &ApiClient,
    config: &ClientConfig,
    amount: Decimal,
    contact: PaymentContact,
) -> anyhow::Result<()> {
    let terminal = Arc::new(Terminal::stdin());
    let workflow = PaymentWorkflow::new(
        Arc::new(HttpPaymentBackend::new(client.clone())),
        Arc::new(ManualCheckout::new(terminal)),
    )
    .with_key_id(config.payment_key_id.clone());

    match workflow.pay(PaymentAmount(amount), contact).await {
        Ok(PaymentOutcome::Paid(confirmation)) => {
            println!("Payment Successful");
            println!("Your payment was processed successfully. Thank you for your business!");
            println!("Payment ID: {}", confirmation.razorpay_payment_id);
            Ok(())
        }
        Ok(PaymentOutcome::Cancelled) => {
            println!("Payment cancelled.");
            Ok(())
        }
        Ok(PaymentOutcome::VerificationFailed(confirmation)) => {
            println!("Payment Not Completed");
            println!("We couldn't confirm your payment. Please check your account or try again.");
            anyhow::bail!(
                "Verification failed for payment {}",
                confirmation.razorpay_payment_id
            )
        }
        Err(e) => {
            println!("Payment Not Completed");
            println!("{}", e.client_message());
            Err(anyhow::anyhow!(e))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env()
        .context("Invalid configuration. Check BGPRINTS_API_URL (or API_URL) and BGPRINTS_* limits")?;
    let client = ApiClient::from_config(&config).context("Failed to create API client")?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Services => {
            let services = client.list_services().await?;
            if cli.json {
                print_json(&services)?;
            } else {
                for service in &services {
                    println!(
                        "{:>4}  {:<30} {:<20} {}",
                        service.id,
                        truncate_string(&service.name, 30),
                        truncate_string(&service.pricing, 20),
                        service.duration
                    );
                }
            }
        }
        Commands::Vendors {
            service,
            lat,
            lon,
            search,
            sort,
            radius,
        } => {
            let origin = Coordinates::new(lat, lon);
            let radius = radius.unwrap_or(config.search_radius_km);
            let nearby = client
                .vendors_near(service.unwrap_or(ALL_SERVICES), origin)
                .await?;
            let nearby = within_radius(nearby, origin, radius);
            let mut matches = filter_vendors(&nearby, search.as_deref().unwrap_or(""));
            sort_vendors(&mut matches, sort, origin);

            if cli.json {
                print_json(&matches)?;
            } else {
                print_vendor_table(&matches, origin);
            }
        }
        Commands::Vendor { id } => {
            let vendor = client.get_vendor(id).await?;
            if cli.json {
                print_json(&vendor)?;
            } else {
                print_vendor(&vendor);
            }
        }
        Commands::Upload {
            vendor,
            attach,
            submit,
            yes,
        } => {
            run_upload(&client, &config, vendor, attach, submit, yes).await?;
        }
        Commands::Files { vendor } => {
            let files = client.list_uploaded_files(vendor).await?;
            if cli.json {
                print_json(&files)?;
            } else if files.is_empty() {
                println!("No files found.");
            } else {
                println!(
                    "{:>6} {:>7} {:>8} {:<20} {}",
                    "ID", "Vendor", "Service", "Uploaded At", "URL"
                );
                for file in &files {
                    println!(
                        "{:>6} {:>7} {:>8} {:<20} {}",
                        file.id,
                        file.vendor_id,
                        file.service_id,
                        file.uploaded_at.format("%Y-%m-%d %H:%M:%S"),
                        truncate_string(&file.file_url, 60)
                    );
                }
            }
        }
        Commands::DeleteFile { id } => {
            client.delete_uploaded_file(id).await?;
            print_json(
                &serde_json::json!({ "success": true, "message": format!("File {} deleted", id) }),
            )?;
        }
        Commands::Pay {
            amount,
            name,
            email,
            contact,
        } => {
            let contact = PaymentContact {
                name,
                email,
                contact,
            };
            run_payment(&client, &config, amount, contact).await?;
        }
    }

    Ok(())
}
