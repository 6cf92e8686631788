//! Report store trait and in-memory implementation.

mod memory;
mod mutator;

pub use memory::InMemoryReportStore;
pub use mutator::{apply_patch, attachment_audit_line, entry_audit_line, update_audit_line};
pub use report_types::{ReportStore, ReportStoreError};
