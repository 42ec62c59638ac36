//! In-memory storage and image fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use news_portal::error::{ResolutionError, StorageError};
use news_portal::models::RawRecord;
use news_portal::resolver::ImageResolver;
use news_portal::service::ContentService;
use news_portal::storage::{RecordStore, ScanRequest};

pub const NEWS: &str = "News";
pub const SIDEBAR: &str = "Sidebar";
pub const IMAGE_HOST: &str = "https://img.test";

/// Tables held in memory; tables listed in `failing` reject every scan.
#[derive(Default)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<RawRecord>>,
    failing: HashSet<String>,
}

impl MemoryStore {
    pub fn with_table(mut self, table: &str, records: Value) -> Self {
        let records: Vec<RawRecord> =
            serde_json::from_value(records).expect("records must be a JSON array of objects");
        self.tables.insert(table.to_string(), records);
        self
    }

    pub fn failing(mut self, table: &str) -> Self {
        self.failing.insert(table.to_string());
        self
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn scan(&self, request: &ScanRequest) -> Result<Vec<RawRecord>, StorageError> {
        if self.failing.contains(&request.table) {
            return Err(StorageError::Rejected {
                table: request.table.clone(),
                status: 500,
                message: "InternalServerError: backend unavailable".to_string(),
            });
        }
        let records = self.tables.get(&request.table).cloned().unwrap_or_default();
        Ok(records.into_iter().take(request.limit as usize).collect())
    }
}

/// Resolves `key` to `{IMAGE_HOST}/{key}`; keys in `missing` are not found.
#[derive(Default)]
pub struct FakeResolver {
    missing: HashSet<String>,
}

impl FakeResolver {
    pub fn missing(keys: &[&str]) -> Self {
        Self {
            missing: keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ImageResolver for FakeResolver {
    async fn resolve(&self, key: &str) -> Result<String, ResolutionError> {
        if key.trim().is_empty() {
            return Err(ResolutionError::InvalidKey);
        }
        if self.missing.contains(key) {
            return Err(ResolutionError::NotFound {
                bucket: "test-bucket".to_string(),
                key: key.to_string(),
            });
        }
        Ok(format!("{}/{}", IMAGE_HOST, key))
    }
}

pub fn service(store: MemoryStore, resolver: FakeResolver) -> ContentService {
    ContentService::new(
        Arc::new(store),
        Arc::new(resolver),
        ScanRequest::new(NEWS, 100),
        ScanRequest::new(SIDEBAR, 100),
    )
}
