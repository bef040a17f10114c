//! Property tests for the upload quota manager.
//!
//! Random sequences of add/remove/remove-all operations must keep the running
//! totals consistent with the attachment set and inside the configured caps.

use bgprints_core::models::{AttachmentSnapshot, FileHandle, ServiceId};
use bgprints_core::{QuotaLimits, UploadQuotaManager};
use proptest::prelude::*;

const MAX_FILES: usize = 5;
const MAX_FILE_SIZE: u64 = 50;
const MAX_TOTAL_SIZE: u64 = 100;

#[derive(Debug, Clone)]
enum Op {
    Add { service: i64, name: u8, size: u64 },
    Remove { service: i64, name: u8 },
    RemoveAll { service: i64 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..3i64, 0..6u8, 0..70u64).prop_map(|(service, name, size)| Op::Add { service, name, size }),
        2 => (0..3i64, 0..6u8).prop_map(|(service, name)| Op::Remove { service, name }),
        1 => (0..3i64).prop_map(|service| Op::RemoveAll { service }),
    ]
}

fn file(name: u8, size: u64) -> FileHandle {
    FileHandle::in_memory(format!("file-{}.pdf", name), "application/pdf", vec![0u8; size as usize])
}

fn apply(quota: &mut UploadQuotaManager, op: &Op) {
    match op {
        Op::Add { service, name, size } => {
            let _ = quota.request_add(ServiceId(*service), file(*name, *size));
        }
        Op::Remove { service, name } => {
            quota.request_remove(ServiceId(*service), &format!("file-{}.pdf", name));
        }
        Op::RemoveAll { service } => {
            quota.request_remove_all(ServiceId(*service));
        }
    }
}

fn assert_consistent(snapshot: &AttachmentSnapshot) -> Result<(), TestCaseError> {
    let count: usize = snapshot.services.iter().map(|s| s.files.len()).sum();
    let size: u64 = snapshot
        .services
        .iter()
        .flat_map(|s| s.files.iter())
        .map(|f| f.size)
        .sum();
    prop_assert_eq!(snapshot.total_count, count);
    prop_assert_eq!(snapshot.total_size, size);
    prop_assert!(snapshot.total_count <= MAX_FILES);
    prop_assert!(snapshot.total_size <= MAX_TOTAL_SIZE);

    for service in &snapshot.services {
        prop_assert!(!service.files.is_empty(), "empty list kept for {}", service.service_id);
        let mut names: Vec<&str> = service.files.iter().map(|f| f.name.as_str()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        prop_assert_eq!(before, names.len(), "duplicate names in {}", service.service_id);
    }
    Ok(())
}

proptest! {
    /// Totals match the set and stay inside the caps after every operation.
    #[test]
    fn totals_track_attachments(ops in prop::collection::vec(op(), 0..60)) {
        let mut quota = UploadQuotaManager::new(QuotaLimits::new(MAX_FILES, MAX_FILE_SIZE, MAX_TOTAL_SIZE));
        for op in &ops {
            apply(&mut quota, op);
            assert_consistent(&quota.snapshot())?;
        }
    }

    /// Removing the same file twice leaves the same state as removing it once.
    #[test]
    fn remove_is_idempotent(ops in prop::collection::vec(op(), 0..30), service in 0..3i64, name in 0..6u8) {
        let mut quota = UploadQuotaManager::new(QuotaLimits::new(MAX_FILES, MAX_FILE_SIZE, MAX_TOTAL_SIZE));
        for op in &ops {
            apply(&mut quota, op);
        }
        let file_name = format!("file-{}.pdf", name);
        let first = quota.request_remove(ServiceId(service), &file_name);
        let second = quota.request_remove(ServiceId(service), &file_name);
        prop_assert_eq!(first, second);
    }

    /// Building a submission twice without mutation yields the same ordered pairs.
    #[test]
    fn submission_is_deterministic(ops in prop::collection::vec(op(), 0..30)) {
        let mut quota = UploadQuotaManager::new(QuotaLimits::new(MAX_FILES, MAX_FILE_SIZE, MAX_TOTAL_SIZE));
        for op in &ops {
            apply(&mut quota, op);
        }
        let first = quota.build_submission();
        let second = quota.build_submission();
        prop_assert_eq!(first.is_ok(), !quota.is_empty());
        prop_assert_eq!(first, second);
    }

    /// A rejected add never changes the state.
    #[test]
    fn rejections_do_not_mutate(ops in prop::collection::vec(op(), 0..30), service in 0..3i64, name in 0..6u8, size in 0..120u64) {
        let mut quota = UploadQuotaManager::new(QuotaLimits::new(MAX_FILES, MAX_FILE_SIZE, MAX_TOTAL_SIZE));
        for op in &ops {
            apply(&mut quota, op);
        }
        let before = quota.snapshot();
        if quota.request_add(ServiceId(service), file(name, size)).is_err() {
            prop_assert_eq!(quota.snapshot(), before);
        }
    }
}
