//! Core data models used throughout the portal.
//!
//! Raw records come out of the storage backend with no guaranteed shape;
//! everything downstream works on the canonical [`Article`] and [`Sidebar`]
//! entities, which are rebuilt on every request and never cached.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Untyped row returned by a storage scan.
pub type RawRecord = Map<String, Value>;

/// Canonical article entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Option<String>,
    pub title: String,
    pub summary: String,
    pub author: String,
    pub published_at: String,
    /// Opaque object-store key; a weak reference with no ownership.
    pub image_key: Option<String>,
    pub tags: Vec<String>,
    /// `None` when there is no image or when resolving it failed.
    pub image_url: Option<String>,
}

/// A category link shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarCategory {
    pub name: String,
    pub slug: String,
}

/// Canonical sidebar entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidebar {
    pub latest: Vec<String>,
    pub categories: Vec<SidebarCategory>,
}
