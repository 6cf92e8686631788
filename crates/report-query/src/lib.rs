//! Read-side shaping of reports: entry queries and compact/full views.

mod pipeline;
mod view;

pub use pipeline::{query_entries, EntryPage, EntryQuery, Pagination, SortField, SortOrder};
pub use view::{project, CompactView, FullView, ReportView};
