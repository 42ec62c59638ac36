//! Sidebar aggregation.
//!
//! The sidebar table has been written in two conventions:
//!
//! - **Aggregate**: one record carrying `latest: [...]` and
//!   `categories: [...]` lists.
//! - **Per-row**: one record per entry, discriminated by `type`
//!   (`"latest"` or `"category"`).
//!
//! [`detect_layout`] decides which one applies by looking at the first
//! record only, and [`aggregate`] never mixes the two.

use serde_json::{Map, Value};
use tracing::warn;

use crate::models::{RawRecord, Sidebar, SidebarCategory};
use crate::normalize::{kind_of, normalize_lenient, scalar_text, text_field};

/// Which storage convention a set of sidebar records follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SidebarLayout<'a> {
    /// Everything comes from this single record.
    Aggregate(&'a Map<String, Value>),
    /// Every record contributes one entry.
    PerRow(&'a [Map<String, Value>]),
}

/// Classify normalized sidebar records by the shape of the first one.
pub fn detect_layout(records: &[Map<String, Value>]) -> SidebarLayout<'_> {
    match records.first() {
        Some(first)
            if matches!(first.get("latest"), Some(Value::Array(_)))
                || matches!(first.get("categories"), Some(Value::Array(_))) =>
        {
            SidebarLayout::Aggregate(first)
        }
        _ => SidebarLayout::PerRow(records),
    }
}

/// Reconcile raw sidebar records into a [`Sidebar`]. Never fails on shape.
pub fn aggregate(records: &[RawRecord]) -> Sidebar {
    let normalized: Vec<Map<String, Value>> = records.iter().map(normalize_lenient).collect();
    match detect_layout(&normalized) {
        SidebarLayout::Aggregate(record) => from_aggregate(record),
        SidebarLayout::PerRow(rows) => from_rows(rows),
    }
}

fn from_aggregate(record: &Map<String, Value>) -> Sidebar {
    let latest = list(record, "latest")
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(fields) => text_field(fields, &["title", "name"]),
            other => entry_text(other, "latest"),
        })
        .collect();

    let categories = list(record, "categories")
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(fields) => category(fields),
            other => entry_text(other, "categories").map(|name| SidebarCategory {
                slug: slugify(&name),
                name,
            }),
        })
        .collect();

    Sidebar { latest, categories }
}

fn list<'a>(record: &'a Map<String, Value>, field: &str) -> &'a [Value] {
    match record.get(field) {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

fn entry_text(value: &Value, field: &str) -> Option<String> {
    scalar_text(value).unwrap_or_else(|error| {
        warn!(field, found = kind_of(value), %error, "ignoring sidebar entry");
        None
    })
}

fn from_rows(rows: &[Map<String, Value>]) -> Sidebar {
    let mut sidebar = Sidebar::default();
    for row in rows {
        match row.get("type").and_then(Value::as_str) {
            Some("latest") => {
                if let Some(title) = text_field(row, &["title", "name"]) {
                    sidebar.latest.push(title);
                }
            }
            Some("category") => {
                if let Some(category) = category(row) {
                    sidebar.categories.push(category);
                }
            }
            _ => {}
        }
    }
    sidebar
}

/// A category from `name` and an optional explicit `slug`; `None` without a name.
fn category(fields: &Map<String, Value>) -> Option<SidebarCategory> {
    let name = text_field(fields, &["name"])?;
    let slug = text_field(fields, &["slug"]).unwrap_or_else(|| slugify(&name));
    Some(SidebarCategory { name, slug })
}

/// Lower-case `name` and replace each run of whitespace with a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
                in_space = true;
            }
        } else {
            slug.extend(c.to_lowercase());
            in_space = false;
        }
    }
    slug
}
