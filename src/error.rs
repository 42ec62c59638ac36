//! Error taxonomy for the content pipeline.
//!
//! Each stage fails with its own type so callers can decide locally how to
//! recover:
//!
//! | Error | Raised by | Recovery |
//! |-------|-----------|----------|
//! | [`StorageError`] | [`RecordStore::scan`](crate::storage::RecordStore::scan) | surfaced; the home page degrades to an empty state |
//! | [`ResolutionError`] | [`ImageResolver::resolve`](crate::resolver::ImageResolver::resolve) | absorbed; the article keeps `image_url = None` |
//! | [`MalformedValue`] | [`normalize`](crate::normalize::normalize) | absorbed per field; the field falls back to its default |

use thiserror::Error;

/// A scan against the storage backend failed.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to reach storage backend for table '{table}': {source}")]
    Transport {
        table: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("scan of table '{table}' rejected (HTTP {status}): {message}")]
    Rejected {
        table: String,
        status: u16,
        message: String,
    },

    #[error("invalid scan response for table '{table}': {source}")]
    Decode {
        table: String,
        #[source]
        source: serde_json::Error,
    },
}

/// An image key could not be turned into an access URL.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("image key must not be empty")]
    InvalidKey,

    #[error("object '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },

    #[error("access denied to object '{key}' in bucket '{bucket}'")]
    AccessDenied { bucket: String, key: String },

    #[error("failed to reach object store for '{key}': {source}")]
    Network {
        key: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("object store returned HTTP {status} for '{key}'")]
    UnexpectedStatus { key: String, status: u16 },
}

/// A stored value that cannot be coerced into its plain form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedValue {
    #[error("number attribute has non-numeric payload '{0}'")]
    NotANumber(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
}
