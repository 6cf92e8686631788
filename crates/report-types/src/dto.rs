//! Request and response DTOs for the report API.

use crate::{Priority, ReportStatus, ValidationError};
use serde::{Deserialize, Serialize};

/// Create-report request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReportRequest {
    pub title: String,
    #[serde(default)]
    pub status: Option<ReportStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl CreateReportRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("title must be a non-empty string"));
        }
        Ok(())
    }
}

/// Partial update of a report. `version` enables the optimistic concurrency check;
/// when absent the update is applied unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<ReportStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub version: Option<u64>,
}

impl ReportPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref title) = self.title {
            if title.trim().is_empty() {
                return Err(ValidationError::new("title must be a non-empty string"));
            }
        }
        Ok(())
    }
}

/// Append-entry request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendEntryRequest {
    pub content: String,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl AppendEntryRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.content.trim().is_empty() {
            return Err(ValidationError::new("content must be a non-empty string"));
        }
        Ok(())
    }
}

/// Raw GET query string. Every value is kept as a string so malformed numbers can
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub include: Option<String>,
    #[serde(default, rename = "entries_highPriorityOnly")]
    pub entries_high_priority_only: Option<String>,
    #[serde(default)]
    pub entries_sort: Option<String>,
    #[serde(default)]
    pub entries_page: Option<String>,
    #[serde(default)]
    pub entries_size: Option<String>,
}

impl ReportQuery {
    /// Build from raw query pairs. A repeated key keeps its last value; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut q = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "view" => &mut q.view,
                "include" => &mut q.include,
                "entries_highPriorityOnly" => &mut q.entries_high_priority_only,
                "entries_sort" => &mut q.entries_sort,
                "entries_page" => &mut q.entries_page,
                "entries_size" => &mut q.entries_size,
                _ => continue,
            };
            *slot = Some(value);
        }
        q
    }

    /// True when `include` lists `entries`.
    pub fn includes_entries(&self) -> bool {
        self.include
            .as_deref()
            .map(|s| s.split(',').any(|part| part.trim() == "entries"))
            .unwrap_or(false)
    }

    pub fn is_compact(&self) -> bool {
        self.view.as_deref() == Some("compact")
    }
}

/// Body returned on an optimistic concurrency failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionConflictData {
    pub current_version: u64,
    pub submitted_version: u64,
}

/// Response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseResponse<T> {
    #[serde(default = "default_code")]
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn default_code() -> i32 {
    200
}

impl<T> BaseResponse<T> {
    pub fn ok(code: i32, message: impl Into<String>, data: T) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }
}
