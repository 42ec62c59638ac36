//! The content service: everything the presentation layer needs.
//!
//! [`ContentService`] owns no data. Each call scans the storage backend,
//! normalizes and projects what comes back, and hands the canonical
//! entities to the caller; nothing is kept between requests. The storage
//! client and image resolver are injected, so tests run the full pipeline
//! against in-memory fakes.
//!
//! ```text
//! news scan ──▶ normalize ──▶ project ──▶ resolve images ──▶ filter ─┐
//!                                                                    ├──▶ HomePage
//! sidebar scan ──▶ normalize ──▶ aggregate ──────────────────────────┘
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

use crate::config::Config;
use crate::error::StorageError;
use crate::filter::filter_articles;
use crate::models::{Article, Sidebar};
use crate::projector::{attach_image, project, project_all};
use crate::resolver::{ImageResolver, S3Presigner};
use crate::sidebar::aggregate;
use crate::sigv4::AwsCredentials;
use crate::storage::{DynamoDbClient, RecordStore, ScanRequest};

/// Read-only view over the news and sidebar collections.
#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn RecordStore>,
    resolver: Arc<dyn ImageResolver>,
    news: ScanRequest,
    sidebar: ScanRequest,
}

/// Everything the home page shows. `search_query` and `category_filter`
/// echo the request back for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub items: Vec<Article>,
    pub sidebar: Sidebar,
    pub search_query: String,
    pub category_filter: String,
}

impl HomePage {
    /// What a reader sees when the backend is unavailable.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            sidebar: Sidebar::default(),
            search_query: String::new(),
            category_filter: String::new(),
        }
    }
}

impl ContentService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        resolver: Arc<dyn ImageResolver>,
        news: ScanRequest,
        sidebar: ScanRequest,
    ) -> Self {
        Self {
            store,
            resolver,
            news,
            sidebar,
        }
    }

    /// Service with injected clients and scans taken from `config`.
    pub fn with_config(
        config: &Config,
        store: Arc<dyn RecordStore>,
        resolver: Arc<dyn ImageResolver>,
    ) -> Self {
        Self::new(
            store,
            resolver,
            config.news.scan_request(),
            config.sidebar.scan_request(),
        )
    }

    /// Service backed by DynamoDB and S3, with credentials from the environment.
    pub fn connect(config: &Config) -> Result<Self> {
        let creds = AwsCredentials::from_env()?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("news-portal/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let store = DynamoDbClient::new(
            http.clone(),
            creds.clone(),
            config.aws.region.clone(),
            config.aws.endpoint_url.as_deref(),
        );
        let resolver = S3Presigner::new(http, creds, config.aws.region.clone(), &config.images);

        Ok(Self::with_config(config, Arc::new(store), Arc::new(resolver)))
    }

    pub fn resolver(&self) -> &dyn ImageResolver {
        self.resolver.as_ref()
    }

    /// Every article in the news collection, images resolved.
    pub async fn fetch_articles(&self) -> Result<Vec<Article>, StorageError> {
        let records = self.store.scan(&self.news).await?;
        Ok(project_all(self.resolver.as_ref(), &records).await)
    }

    pub async fn fetch_sidebar(&self) -> Result<Sidebar, StorageError> {
        let records = self.store.scan(&self.sidebar).await?;
        Ok(aggregate(&records))
    }

    /// Filtered articles plus the sidebar. Both scans run concurrently.
    pub async fn list_articles(
        &self,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<(Vec<Article>, Sidebar), StorageError> {
        let (articles, sidebar) =
            futures::try_join!(self.fetch_articles(), self.fetch_sidebar())?;
        Ok((filter_articles(articles, search, category), sidebar))
    }

    /// The article whose id is `id`, or `None`.
    ///
    /// Only the matching article's image is resolved.
    pub async fn get_article_by_id(&self, id: &str) -> Result<Option<Article>, StorageError> {
        let records = self.store.scan(&self.news).await?;
        let found = records
            .iter()
            .map(project)
            .find(|article| article.id.as_deref() == Some(id));
        match found {
            Some(article) => Ok(Some(attach_image(self.resolver.as_ref(), article).await)),
            None => Ok(None),
        }
    }

    /// Home page data. Never fails: a storage error is logged and the empty
    /// page is returned instead.
    pub async fn home(&self, search: Option<&str>, category: Option<&str>) -> HomePage {
        match self.list_articles(search, category).await {
            Ok((items, sidebar)) => HomePage {
                items,
                sidebar,
                search_query: search.unwrap_or_default().to_string(),
                category_filter: category.unwrap_or_default().to_string(),
            },
            Err(err) => {
                error!(error = %err, "failed to load home page");
                HomePage::empty()
            }
        }
    }

    /// Sidebar for secondary pages; an unavailable sidebar is shown empty.
    pub async fn sidebar_or_empty(&self) -> Sidebar {
        self.fetch_sidebar().await.unwrap_or_else(|err| {
            error!(error = %err, "failed to load sidebar");
            Sidebar::default()
        })
    }
}
