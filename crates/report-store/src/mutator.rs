//! Versioned mutation of a report record.

use chrono::{DateTime, SecondsFormat, Utc};
use report_types::{Report, ReportPatch, ReportStoreError};

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Audit line for an update. An empty change set is recorded as `none`.
pub fn update_audit_line(changed: &[&str], at: DateTime<Utc>) -> String {
    let fields = if changed.is_empty() {
        "none".to_string()
    } else {
        changed.join(", ")
    };
    format!("Updated fields: {} at {}", fields, ts(at))
}

pub fn attachment_audit_line(original_name: &str, at: DateTime<Utc>) -> String {
    format!("Attachment uploaded: {} at {}", original_name, ts(at))
}

pub fn entry_audit_line(entry_id: &str, at: DateTime<Utc>) -> String {
    format!("Entry added: {} at {}", entry_id, ts(at))
}

/// Apply `patch` to `report`, returning the names of the fields that changed.
///
/// A present `patch.version` must equal the current version, otherwise the report is
/// left untouched and `VersionConflict` is returned. On success the version is
/// incremented by one and `updated_at` set to `now` even when no field changed.
pub fn apply_patch(
    report: &mut Report,
    patch: &ReportPatch,
    now: DateTime<Utc>,
) -> Result<Vec<&'static str>, ReportStoreError> {
    if let Some(submitted) = patch.version {
        if submitted != report.version {
            return Err(ReportStoreError::VersionConflict {
                current: report.version,
                submitted,
            });
        }
    }

    let mut changed = Vec::new();
    if let Some(ref title) = patch.title {
        if *title != report.title {
            report.title = title.clone();
            changed.push("title");
        }
    }
    if let Some(status) = patch.status {
        if status != report.status {
            report.status = status;
            changed.push("status");
        }
    }
    if let Some(priority) = patch.priority {
        if priority != report.priority {
            report.priority = priority;
            changed.push("priority");
        }
    }

    report.updated_at = now;
    report.version += 1;
    report.metrics = report.live_metrics();
    report.audit_logs.push(update_audit_line(&changed, now));
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_types::{Priority, ReportStatus};

    fn report() -> Report {
        Report::new(
            "r1".to_string(),
            "Q1".to_string(),
            ReportStatus::Draft,
            Priority::Medium,
            Utc::now(),
        )
    }

    #[test]
    fn applies_changed_fields_and_bumps_version() {
        let mut r = report();
        let patch = ReportPatch {
            title: Some("Q1 final".to_string()),
            status: Some(ReportStatus::Submitted),
            priority: Some(Priority::Medium),
            version: Some(1),
        };
        let changed = apply_patch(&mut r, &patch, Utc::now()).unwrap();
        assert_eq!(changed, vec!["title", "status"]);
        assert_eq!(r.version, 2);
        assert_eq!(r.title, "Q1 final");
        assert_eq!(r.status, ReportStatus::Submitted);
        assert!(r.audit_logs[0].starts_with("Updated fields: title, status at "));
    }

    #[test]
    fn stale_version_leaves_report_untouched() {
        let mut r = report();
        apply_patch(&mut r, &ReportPatch::default(), Utc::now()).unwrap();
        let before = r.clone();
        let patch = ReportPatch {
            title: Some("other".to_string()),
            version: Some(1),
            ..Default::default()
        };
        let err = apply_patch(&mut r, &patch, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            ReportStoreError::VersionConflict {
                current: 2,
                submitted: 1
            }
        );
        assert_eq!(r, before);
    }

    #[test]
    fn noop_patch_still_increments_and_audits_none() {
        let mut r = report();
        let patch = ReportPatch {
            title: Some("Q1".to_string()),
            ..Default::default()
        };
        let changed = apply_patch(&mut r, &patch, Utc::now()).unwrap();
        assert!(changed.is_empty());
        assert_eq!(r.version, 2);
        assert!(r.audit_logs[0].starts_with("Updated fields: none at "));
    }

    #[test]
    fn missing_version_forces_update() {
        let mut r = report();
        for _ in 0..3 {
            apply_patch(&mut r, &ReportPatch::default(), Utc::now()).unwrap();
        }
        let patch = ReportPatch {
            priority: Some(Priority::High),
            ..Default::default()
        };
        apply_patch(&mut r, &patch, Utc::now()).unwrap();
        assert_eq!(r.version, 5);
        assert_eq!(r.priority, Priority::High);
        assert_eq!(r.audit_logs.len(), 4);
    }
}
