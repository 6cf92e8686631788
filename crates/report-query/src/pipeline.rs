//! Entry query pipeline: filter, then stable sort, then paginate.

use report_types::{Entry, Priority, ReportQuery};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Entry attributes that can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Content,
    CreatedAt,
    Priority,
}

impl SortField {
    /// Unknown names yield `None`, which sorts nothing.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "id" => Some(SortField::Id),
            "content" => Some(SortField::Content),
            "createdAt" => Some(SortField::CreatedAt),
            "priority" => Some(SortField::Priority),
            _ => None,
        }
    }

    fn compare(self, a: &Entry, b: &Entry) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Content => a.content.cmp(&b.content),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `desc` (any case) is descending; every other token is ascending.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// Typed entry query. `page` and `size` are clamped when the query runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    pub high_priority_only: bool,
    pub sort_field: Option<SortField>,
    pub sort_order: SortOrder,
    pub page: i64,
    pub size: i64,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            high_priority_only: false,
            sort_field: None,
            sort_order: SortOrder::Asc,
            page: DEFAULT_PAGE as i64,
            size: DEFAULT_PAGE_SIZE as i64,
        }
    }
}

fn parse_int_or(raw: Option<&str>, default: u64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(default as i64)
}

impl EntryQuery {
    /// Build from raw `entries_*` query parameters. `entries_sort` is `<field>_<asc|desc>`.
    pub fn from_query(q: &ReportQuery) -> Self {
        let (sort_field, sort_order) = match q.entries_sort.as_deref() {
            Some(raw) => match raw.rsplit_once('_') {
                Some((field, order)) => (SortField::parse(field), SortOrder::parse(order)),
                None => (SortField::parse(raw), SortOrder::Asc),
            },
            None => (None, SortOrder::Asc),
        };
        Self {
            high_priority_only: q.entries_high_priority_only.as_deref() == Some("true"),
            sort_field,
            sort_order,
            page: parse_int_or(q.entries_page.as_deref(), DEFAULT_PAGE),
            size: parse_int_or(q.entries_size.as_deref(), DEFAULT_PAGE_SIZE),
        }
    }
}

/// Pagination descriptor, computed over the filtered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub size: u64,
    pub total_pages: u64,
    pub total_entries: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryPage {
    pub entries: Vec<Entry>,
    pub pagination: Pagination,
}

/// Run the pipeline over `entries`. Never fails; out-of-range pages are empty.
pub fn query_entries(entries: &[Entry], q: &EntryQuery) -> EntryPage {
    let mut selected: Vec<&Entry> = entries
        .iter()
        .filter(|e| !q.high_priority_only || e.priority == Priority::High)
        .collect();

    if let Some(field) = q.sort_field {
        // sort_by is stable, so ties keep filtered order in both directions.
        selected.sort_by(|a, b| match q.sort_order {
            SortOrder::Asc => field.compare(a, b),
            SortOrder::Desc => field.compare(b, a),
        });
    }

    let page = q.page.max(1) as u64;
    let size = q.size.clamp(1, MAX_PAGE_SIZE as i64) as u64;
    let total_entries = selected.len() as u64;
    let total_pages = total_entries.div_ceil(size);
    let offset = (page - 1).saturating_mul(size);

    let sliced: Vec<Entry> = if offset >= total_entries {
        Vec::new()
    } else {
        selected
            .into_iter()
            .skip(offset as usize)
            .take(size as usize)
            .cloned()
            .collect()
    };

    EntryPage {
        entries: sliced,
        pagination: Pagination {
            page,
            size,
            total_pages,
            total_entries,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entries(n: usize) -> Vec<Entry> {
        let priorities = [Priority::Medium, Priority::High, Priority::Low];
        (0..n)
            .map(|i| Entry {
                id: format!("e{:02}", i),
                content: format!("content {}", n - i),
                created_at: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
                priority: priorities[i % 3],
            })
            .collect()
    }

    fn ids(page: &EntryPage) -> Vec<String> {
        page.entries.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn full_page_without_sort_is_identity() {
        let all = entries(37);
        let q = EntryQuery {
            size: 100,
            ..Default::default()
        };
        let out = query_entries(&all, &q);
        assert_eq!(out.entries, all);
        assert_eq!(out.pagination.total_entries, 37);
        assert_eq!(out.pagination.total_pages, 1);
    }

    #[test]
    fn second_page_of_twenty_five() {
        let all = entries(25);
        let q = EntryQuery {
            page: 2,
            size: 10,
            ..Default::default()
        };
        let out = query_entries(&all, &q);
        assert_eq!(out.entries, all[10..20].to_vec());
        assert_eq!(
            out.pagination,
            Pagination {
                page: 2,
                size: 10,
                total_pages: 3,
                total_entries: 25
            }
        );
    }

    #[test]
    fn page_and_size_are_clamped() {
        let all = entries(5);
        let out = query_entries(
            &all,
            &EntryQuery {
                page: -3,
                size: 0,
                ..Default::default()
            },
        );
        assert_eq!(out.pagination.page, 1);
        assert_eq!(out.pagination.size, 1);
        assert_eq!(out.pagination.total_pages, 5);
        assert_eq!(ids(&out), vec!["e00"]);

        let out = query_entries(
            &all,
            &EntryQuery {
                size: 1000,
                ..Default::default()
            },
        );
        assert_eq!(out.pagination.size, 100);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let all = entries(5);
        let out = query_entries(
            &all,
            &EntryQuery {
                page: 4,
                size: 2,
                ..Default::default()
            },
        );
        assert!(out.entries.is_empty());
        assert_eq!(out.pagination.total_pages, 3);
        let out = query_entries(
            &all,
            &EntryQuery {
                page: i64::MAX,
                size: 100,
                ..Default::default()
            },
        );
        assert!(out.entries.is_empty());
    }

    #[test]
    fn slices_across_pages_cover_filtered_collection() {
        let all = entries(23);
        for size in 1..=12 {
            let first = query_entries(
                &all,
                &EntryQuery {
                    high_priority_only: true,
                    size,
                    ..Default::default()
                },
            );
            let mut seen = 0;
            for page in 1..=first.pagination.total_pages as i64 + 1 {
                let out = query_entries(
                    &all,
                    &EntryQuery {
                        high_priority_only: true,
                        page,
                        size,
                        ..Default::default()
                    },
                );
                seen += out.entries.len() as u64;
                assert!(out.entries.iter().all(|e| e.priority == Priority::High));
            }
            assert_eq!(seen, first.pagination.total_entries);
        }
    }

    #[test]
    fn filter_counts_only_high_priority() {
        let all = entries(9);
        let out = query_entries(
            &all,
            &EntryQuery {
                high_priority_only: true,
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), vec!["e01", "e04", "e07"]);
        assert_eq!(out.pagination.total_entries, 3);
        assert_eq!(out.pagination.total_pages, 1);
    }

    #[test]
    fn priority_sort_uses_rank_and_is_stable() {
        let all = entries(6);
        let asc = query_entries(
            &all,
            &EntryQuery {
                sort_field: Some(SortField::Priority),
                ..Default::default()
            },
        );
        assert_eq!(ids(&asc), vec!["e02", "e05", "e00", "e03", "e01", "e04"]);

        let desc = query_entries(
            &all,
            &EntryQuery {
                sort_field: Some(SortField::Priority),
                sort_order: SortOrder::Desc,
                ..Default::default()
            },
        );
        assert_eq!(ids(&desc), vec!["e01", "e04", "e00", "e03", "e02", "e05"]);
        let asc_ranks: Vec<u8> = asc.entries.iter().map(|e| e.priority.rank()).collect();
        let mut desc_ranks: Vec<u8> = desc.entries.iter().map(|e| e.priority.rank()).collect();
        desc_ranks.reverse();
        assert_eq!(asc_ranks, desc_ranks);
    }

    #[test]
    fn sort_by_text_and_time() {
        let all = entries(4);
        let out = query_entries(
            &all,
            &EntryQuery {
                sort_field: Some(SortField::Content),
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), vec!["e03", "e02", "e01", "e00"]);
        let out = query_entries(
            &all,
            &EntryQuery {
                sort_field: Some(SortField::CreatedAt),
                sort_order: SortOrder::Desc,
                ..Default::default()
            },
        );
        assert_eq!(ids(&out), vec!["e03", "e02", "e01", "e00"]);
    }

    #[test]
    fn parses_raw_query_with_fallbacks() {
        let raw = ReportQuery {
            entries_high_priority_only: Some("true".to_string()),
            entries_sort: Some("createdAt_desc".to_string()),
            entries_page: Some("abc".to_string()),
            entries_size: Some("25".to_string()),
            ..Default::default()
        };
        let q = EntryQuery::from_query(&raw);
        assert!(q.high_priority_only);
        assert_eq!(q.sort_field, Some(SortField::CreatedAt));
        assert_eq!(q.sort_order, SortOrder::Desc);
        assert_eq!(q.page, 1);
        assert_eq!(q.size, 25);

        let raw = ReportQuery {
            entries_high_priority_only: Some("yes".to_string()),
            entries_sort: Some("weight_sideways".to_string()),
            ..Default::default()
        };
        let q = EntryQuery::from_query(&raw);
        assert!(!q.high_priority_only);
        assert_eq!(q.sort_field, None);
        assert_eq!(q.sort_order, SortOrder::Asc);
        assert_eq!(q.size, 10);
    }

    #[test]
    fn unknown_sort_field_keeps_order() {
        let all = entries(5);
        let raw = ReportQuery {
            entries_sort: Some("color_desc".to_string()),
            ..Default::default()
        };
        let out = query_entries(&all, &EntryQuery::from_query(&raw));
        assert_eq!(out.entries, all);
    }
}
