//! Upload quota bookkeeping.
//!
//! `UploadQuotaManager` tracks which files are attached to which requested
//! services during one vendor-upload session and enforces the per-file,
//! aggregate size and file-count caps. Every operation takes `&mut self` and
//! updates the attachment set and both running totals together, so the totals
//! always equal the sums over the set.
//!
//! Invariants after every accepted operation:
//! - `total_count` is the number of attached files and never exceeds `max_files`
//! - `total_size` is the sum of their sizes and never exceeds `max_total_size`
//! - a file name appears at most once per service
//! - no service maps to an empty list

use crate::config::QuotaLimits;
use crate::error::{QuotaRejection, QuotaResource};
use crate::models::{
    AttachmentSnapshot, FileHandle, ServiceAttachments, ServiceId, Submission, SubmissionEntry,
};

#[derive(Debug, Clone)]
pub struct UploadQuotaManager {
    limits: QuotaLimits,
    /// Services in first-attached order
    attachments: Vec<ServiceAttachments>,
    total_size: u64,
    total_count: usize,
}

impl Default for UploadQuotaManager {
    fn default() -> Self {
        Self::new(QuotaLimits::default())
    }
}

impl UploadQuotaManager {
    pub fn new(limits: QuotaLimits) -> Self {
        Self {
            limits,
            attachments: Vec::new(),
            total_size: 0,
            total_count: 0,
        }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    pub fn files_for(&self, service_id: ServiceId) -> Option<&[FileHandle]> {
        self.position(service_id)
            .map(|idx| self.attachments[idx].files.as_slice())
    }

    pub fn snapshot(&self) -> AttachmentSnapshot {
        AttachmentSnapshot {
            services: self.attachments.clone(),
            total_size: self.total_size,
            total_count: self.total_count,
        }
    }

    /// Attach `candidate` to `service_id`.
    ///
    /// Checks run in this order and the first failure is returned:
    /// file count cap, per-file size cap, aggregate size cap, duplicate name
    /// within the service. A rejection leaves the state untouched.
    pub fn request_add(
        &mut self,
        service_id: ServiceId,
        candidate: FileHandle,
    ) -> Result<AttachmentSnapshot, QuotaRejection> {
        if self.total_count >= self.limits.max_files {
            return Err(QuotaRejection::LimitReached {
                resource: QuotaResource::Files,
                limit: self.limits.max_files,
            });
        }

        if candidate.size > self.limits.max_file_size {
            return Err(QuotaRejection::FileTooLarge {
                name: candidate.name,
                size: candidate.size,
                limit: self.limits.max_file_size,
            });
        }

        let attempted = self.total_size.saturating_add(candidate.size);
        if attempted > self.limits.max_total_size {
            return Err(QuotaRejection::AggregateLimitExceeded {
                attempted,
                limit: self.limits.max_total_size,
            });
        }

        let idx = match self.position(service_id) {
            Some(idx) => {
                if self.attachments[idx].contains(&candidate.name) {
                    return Err(QuotaRejection::DuplicateFile {
                        service_id,
                        name: candidate.name,
                    });
                }
                idx
            }
            None => {
                self.attachments.push(ServiceAttachments {
                    service_id,
                    files: Vec::new(),
                });
                self.attachments.len() - 1
            }
        };

        tracing::debug!(
            service_id = %service_id,
            file = %candidate.name,
            size = candidate.size,
            total_size = attempted,
            total_count = self.total_count + 1,
            "Attachment accepted"
        );

        self.attachments[idx].files.push(candidate);
        self.total_size = attempted;
        self.total_count += 1;

        Ok(self.snapshot())
    }

    /// Detach the file named `file_name` from `service_id`.
    ///
    /// Removing a file that is not attached is a no-op. Confirmation is the
    /// caller's job; once invoked the removal is unconditional.
    pub fn request_remove(&mut self, service_id: ServiceId, file_name: &str) -> AttachmentSnapshot {
        let Some(idx) = self.position(service_id) else {
            return self.snapshot();
        };
        let Some(file_idx) = self.attachments[idx]
            .files
            .iter()
            .position(|f| f.name == file_name)
        else {
            return self.snapshot();
        };

        let removed = self.attachments[idx].files.remove(file_idx);
        self.total_size -= removed.size;
        self.total_count -= 1;
        if self.attachments[idx].files.is_empty() {
            self.attachments.remove(idx);
        }

        tracing::debug!(
            service_id = %service_id,
            file = %removed.name,
            total_size = self.total_size,
            total_count = self.total_count,
            "Attachment removed"
        );

        self.snapshot()
    }

    /// Detach every file from `service_id`. No-op if nothing is attached to it.
    pub fn request_remove_all(&mut self, service_id: ServiceId) -> AttachmentSnapshot {
        if let Some(idx) = self.position(service_id) {
            let removed = self.attachments.remove(idx);
            self.total_size -= removed.total_size();
            self.total_count -= removed.files.len();

            tracing::debug!(
                service_id = %service_id,
                removed = removed.files.len(),
                total_size = self.total_size,
                total_count = self.total_count,
                "Service attachments cleared"
            );
        }
        self.snapshot()
    }

    /// Flatten the set into `(service, file)` pairs for the upload transport.
    ///
    /// Services come in first-attached order and files in attachment order, so
    /// repeated calls without mutation return identical submissions.
    pub fn build_submission(&self) -> Result<Submission, QuotaRejection> {
        if self.attachments.is_empty() {
            return Err(QuotaRejection::EmptySubmission);
        }

        let entries = self
            .attachments
            .iter()
            .flat_map(|service| {
                service.files.iter().map(move |file| SubmissionEntry {
                    service_id: service.service_id,
                    file: file.clone(),
                })
            })
            .collect();

        Ok(Submission { entries })
    }

    /// Drop every attachment, e.g. after the transport reported success.
    pub fn reset(&mut self) {
        self.attachments.clear();
        self.total_size = 0;
        self.total_count = 0;
    }

    fn position(&self, service_id: ServiceId) -> Option<usize> {
        self.attachments
            .iter()
            .position(|s| s.service_id == service_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentRef;
    use std::path::PathBuf;

    const MB: u64 = 1024 * 1024;
    const A: ServiceId = ServiceId(1);
    const B: ServiceId = ServiceId(2);

    fn file(name: &str, size: u64) -> FileHandle {
        FileHandle::new(
            name,
            size,
            "application/pdf",
            ContentRef::Path(PathBuf::from(format!("/tmp/{}", name))),
        )
    }

    fn manager() -> UploadQuotaManager {
        UploadQuotaManager::new(QuotaLimits::new(5, 50 * MB, 100 * MB))
    }

    #[test]
    fn five_files_fit_and_sixth_hits_limit() {
        let mut quota = manager();
        for i in 0..5 {
            quota
                .request_add(A, file(&format!("page{}.pdf", i), 10 * MB))
                .unwrap();
        }
        assert_eq!(quota.total_count(), 5);
        assert_eq!(quota.total_size(), 50 * MB);

        let err = quota.request_add(B, file("extra.pdf", 1)).unwrap_err();
        assert_eq!(
            err,
            QuotaRejection::LimitReached {
                resource: QuotaResource::Files,
                limit: 5
            }
        );
        assert_eq!(quota.total_count(), 5);
    }

    #[test]
    fn oversized_file_is_rejected_without_state_change() {
        let mut quota = manager();
        let err = quota.request_add(A, file("poster.pdf", 60 * MB)).unwrap_err();
        assert!(matches!(err, QuotaRejection::FileTooLarge { size, .. } if size == 60 * MB));
        assert_eq!(quota.total_count(), 0);
        assert!(quota.is_empty());
    }

    #[test]
    fn file_exactly_at_cap_is_accepted() {
        let mut quota = manager();
        quota.request_add(A, file("cap.pdf", 50 * MB)).unwrap();
        quota.request_add(B, file("cap.pdf", 50 * MB)).unwrap();
        assert_eq!(quota.total_size(), 100 * MB);
    }

    #[test]
    fn duplicate_names_are_scoped_per_service() {
        let mut quota = manager();
        quota.request_add(A, file("invoice.pdf", MB)).unwrap();
        let err = quota.request_add(A, file("invoice.pdf", MB)).unwrap_err();
        assert_eq!(
            err,
            QuotaRejection::DuplicateFile {
                service_id: A,
                name: "invoice.pdf".to_string()
            }
        );
        quota.request_add(B, file("invoice.pdf", MB)).unwrap();
        assert_eq!(quota.total_count(), 2);
    }

    #[test]
    fn aggregate_cap_rejects_and_keeps_total() {
        let mut quota = manager();
        quota.request_add(A, file("a.pdf", 40 * MB)).unwrap();
        let err = quota.request_add(B, file("b.pdf", 70 * MB)).unwrap_err();
        // 70MB also exceeds the per-file cap, which is checked first
        assert!(matches!(err, QuotaRejection::FileTooLarge { .. }));

        quota.request_add(A, file("c.pdf", 45 * MB)).unwrap();
        let err = quota.request_add(B, file("d.pdf", 20 * MB)).unwrap_err();
        assert_eq!(
            err,
            QuotaRejection::AggregateLimitExceeded {
                attempted: 105 * MB,
                limit: 100 * MB
            }
        );
        assert_eq!(quota.total_size(), 85 * MB);
    }

    #[test]
    fn aggregate_scenario_with_wider_per_file_cap() {
        let mut quota = UploadQuotaManager::new(QuotaLimits::new(5, 100 * MB, 100 * MB));
        quota.request_add(A, file("a.pdf", 40 * MB)).unwrap();
        let err = quota.request_add(B, file("b.pdf", 70 * MB)).unwrap_err();
        assert!(matches!(err, QuotaRejection::AggregateLimitExceeded { .. }));
        assert_eq!(quota.total_size(), 40 * MB);
    }

    #[test]
    fn count_check_wins_over_size_checks() {
        let mut quota = UploadQuotaManager::new(QuotaLimits::new(1, 10, 10));
        quota.request_add(A, file("a", 1)).unwrap();
        // Also too large and a duplicate, but the count cap is checked first
        let err = quota.request_add(A, file("a", 100)).unwrap_err();
        assert!(matches!(err, QuotaRejection::LimitReached { .. }));
    }

    #[test]
    fn remove_updates_totals_and_drops_empty_service() {
        let mut quota = manager();
        quota.request_add(A, file("a.pdf", 3 * MB)).unwrap();
        quota.request_add(A, file("b.pdf", 4 * MB)).unwrap();

        let snapshot = quota.request_remove(A, "a.pdf");
        assert_eq!(snapshot.total_count, 1);
        assert_eq!(snapshot.total_size, 4 * MB);

        let snapshot = quota.request_remove(A, "b.pdf");
        assert!(snapshot.files_for(A).is_none());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total_size, 0);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut quota = manager();
        quota.request_add(A, file("a.pdf", MB)).unwrap();
        quota.request_add(A, file("b.pdf", MB)).unwrap();
        let first = quota.request_remove(A, "a.pdf");
        let second = quota.request_remove(A, "a.pdf");
        assert_eq!(first, second);
        assert_eq!(quota.request_remove(B, "a.pdf"), second);
    }

    #[test]
    fn remove_all_clears_service() {
        let mut quota = manager();
        quota.request_add(A, file("x.pdf", 2 * MB)).unwrap();
        quota.request_add(B, file("y.pdf", 3 * MB)).unwrap();
        let snapshot = quota.request_remove_all(A);
        assert!(snapshot.files_for(A).is_none());
        assert_eq!(snapshot.total_count, 1);
        assert_eq!(snapshot.total_size, 3 * MB);

        let snapshot = quota.request_remove_all(B);
        assert_eq!(snapshot.total_count, 0);
        assert_eq!(quota.request_remove_all(B), snapshot);
    }

    #[test]
    fn empty_submission_is_rejected() {
        let quota = manager();
        assert_eq!(
            quota.build_submission().unwrap_err(),
            QuotaRejection::EmptySubmission
        );
    }

    #[test]
    fn submission_order_is_first_attached_then_attachment_order() {
        let mut quota = manager();
        quota.request_add(B, file("b1", 1)).unwrap();
        quota.request_add(A, file("a1", 1)).unwrap();
        quota.request_add(B, file("b2", 1)).unwrap();

        let submission = quota.build_submission().unwrap();
        let order: Vec<(i64, &str)> = submission
            .entries
            .iter()
            .map(|e| (e.service_id.0, e.file.name.as_str()))
            .collect();
        assert_eq!(order, vec![(2, "b1"), (2, "b2"), (1, "a1")]);
        assert_eq!(quota.build_submission().unwrap(), submission);
    }

    #[test]
    fn service_re_attached_after_clear_moves_to_end() {
        let mut quota = manager();
        quota.request_add(A, file("a1", 1)).unwrap();
        quota.request_add(B, file("b1", 1)).unwrap();
        quota.request_remove_all(A);
        quota.request_add(A, file("a2", 1)).unwrap();

        let ids: Vec<ServiceId> = quota.build_submission().unwrap().service_ids();
        assert_eq!(ids, vec![B, A]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut quota = manager();
        quota.request_add(A, file("a", 10)).unwrap();
        quota.reset();
        assert!(quota.is_empty());
        assert_eq!(quota.total_count(), 0);
        assert_eq!(quota.total_size(), 0);
        assert!(quota.build_submission().is_err());
    }
}
