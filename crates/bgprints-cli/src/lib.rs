//! Shared helpers for the `bgprints` binary: tracing setup, terminal adapters
//! for the service collaborators, and the interactive upload shell.

pub mod adapters;
pub mod shell;

use std::path::PathBuf;

use bgprints_core::error::format_bytes;
use bgprints_core::models::{AttachmentSnapshot, ServiceId};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse a `SERVICE=PATH` pair given to `upload --attach`.
pub fn parse_attachment(value: &str) -> Result<(ServiceId, PathBuf), String> {
    let (service, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SERVICE=PATH, got '{}'", value))?;
    let service: ServiceId = service.parse().map_err(|e: anyhow::Error| e.to_string())?;
    if path.trim().is_empty() {
        return Err(format!("missing path for service {}", service));
    }
    Ok((service, PathBuf::from(path)))
}

/// Render the attachment set the way the upload screen lists it.
pub fn render_snapshot(snapshot: &AttachmentSnapshot, max_files: usize, max_total: u64) -> String {
    let mut out = format!(
        "{}/{} files, {} of {}\n",
        snapshot.total_count,
        max_files,
        format_bytes(snapshot.total_size),
        format_bytes(max_total)
    );
    if snapshot.is_empty() {
        out.push_str("  (no files attached)\n");
        return out;
    }
    for service in &snapshot.services {
        out.push_str(&format!("  service {}:\n", service.service_id));
        for file in &service.files {
            out.push_str(&format!(
                "    {:<40} {:>8}  {}\n",
                truncate_string(&file.name, 40),
                format_bytes(file.size),
                file.mime_type
            ));
        }
    }
    out
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgprints_core::models::FileHandle;
    use bgprints_core::UploadQuotaManager;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("hello", 0), "...");
    }

    #[test]
    fn truncate_string_counts_characters() {
        assert_eq!(truncate_string("प्रिंट शॉप", 20), "प्रिंट शॉप");
    }

    #[test]
    fn parse_attachment_pairs() {
        let (service, path) = parse_attachment("3=docs/thesis.pdf").unwrap();
        assert_eq!(service, ServiceId(3));
        assert_eq!(path, PathBuf::from("docs/thesis.pdf"));

        assert!(parse_attachment("docs/thesis.pdf").is_err());
        assert!(parse_attachment("color=a.pdf").is_err());
        assert!(parse_attachment("3=").is_err());
    }

    #[test]
    fn render_lists_files_per_service() {
        let mut quota = UploadQuotaManager::default();
        quota
            .request_add(
                ServiceId(2),
                FileHandle::in_memory("poster.png", "image/png", vec![0u8; 2048]),
            )
            .unwrap();
        let text = render_snapshot(&quota.snapshot(), 5, 100 * 1024 * 1024);
        assert!(text.starts_with("1/5 files, 2KB of 100MB"));
        assert!(text.contains("service 2:"));
        assert!(text.contains("poster.png"));
    }

    #[test]
    fn render_empty_snapshot() {
        let text = render_snapshot(&AttachmentSnapshot::default(), 5, 1024);
        assert!(text.contains("no files attached"));
    }
}
