//! Portal configuration.
//!
//! Read from an optional TOML file, then overridden by environment
//! variables, then validated. Every section has defaults, so an empty file
//! (or no file at all) yields a working configuration for the default AWS
//! deployment.
//!
//! # Example
//!
//! ```toml
//! [site]
//! name = "Amar Ujala"
//!
//! [aws]
//! region = "ap-south-1"
//! # endpoint_url = "http://localhost:4566"   # LocalStack / DynamoDB Local
//!
//! [news]
//! table = "News"
//! scan_limit = 100
//! # filter = { attribute = "status", equals = "published" }
//!
//! [sidebar]
//! table = "Sidebar"
//! scan_limit = 100
//!
//! [images]
//! bucket = "portal-images-cc-assignment"
//! expires_secs = 3600
//! verify_objects = true
//!
//! [server]
//! bind = "0.0.0.0:3000"
//! ```
//!
//! # Environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `AWS_REGION` | `aws.region` |
//! | `NEWS_TABLE` | `news.table` |
//! | `SIDEBAR_TABLE` | `sidebar.table` |
//! | `BUCKET_NAME` | `images.bucket` |
//! | `PORT` | port of `server.bind` |

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

use crate::storage::{ScanFilter, ScanRequest};

/// Config file used when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "./config/portal.toml";

/// Largest page DynamoDB returns from a single `Scan`.
const MAX_SCAN_LIMIT: u32 = 1000;

/// Longest validity SigV4 allows for a presigned URL (seven days).
const MAX_PRESIGN_SECS: u64 = 604_800;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default = "default_news_table", deserialize_with = "news_table")]
    pub news: TableConfig,
    #[serde(default = "default_sidebar_table", deserialize_with = "sidebar_table")]
    pub sidebar: TableConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
        }
    }
}

fn default_site_name() -> String {
    "Amar Ujala".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AwsConfig {
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom DynamoDB endpoint (LocalStack, DynamoDB Local).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint_url: None,
        }
    }
}

fn default_region() -> String {
    "ap-south-1".to_string()
}

/// A scanned collection.
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub table: String,
    pub scan_limit: u32,
    pub filter: Option<FilterConfig>,
}

/// A `[news]` / `[sidebar]` section as written; `table` defaults per section.
#[derive(Deserialize)]
struct TableSection {
    #[serde(default)]
    table: Option<String>,
    #[serde(default = "default_scan_limit")]
    scan_limit: u32,
    #[serde(default)]
    filter: Option<FilterConfig>,
}

impl TableSection {
    fn or_named(self, default_table: &str) -> TableConfig {
        TableConfig {
            table: self.table.unwrap_or_else(|| default_table.to_string()),
            scan_limit: self.scan_limit,
            filter: self.filter,
        }
    }
}

fn news_table<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TableConfig, D::Error> {
    TableSection::deserialize(deserializer)
        .map(|section| section.or_named(DEFAULT_NEWS_TABLE))
}

fn sidebar_table<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TableConfig, D::Error> {
    TableSection::deserialize(deserializer)
        .map(|section| section.or_named(DEFAULT_SIDEBAR_TABLE))
}

impl TableConfig {
    fn named(table: &str) -> Self {
        Self {
            table: table.to_string(),
            scan_limit: default_scan_limit(),
            filter: None,
        }
    }

    /// The scan this section describes.
    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            table: self.table.clone(),
            limit: self.scan_limit,
            filter: self.filter.as_ref().and_then(FilterConfig::to_scan_filter),
        }
    }
}

const DEFAULT_NEWS_TABLE: &str = "News";
const DEFAULT_SIDEBAR_TABLE: &str = "Sidebar";

fn default_news_table() -> TableConfig {
    TableConfig::named(DEFAULT_NEWS_TABLE)
}

fn default_sidebar_table() -> TableConfig {
    TableConfig::named(DEFAULT_SIDEBAR_TABLE)
}

fn default_scan_limit() -> u32 {
    100
}

/// Narrows a scan by equality or prefix on one attribute.
#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    pub attribute: String,
    #[serde(default)]
    pub equals: Option<String>,
    #[serde(default)]
    pub begins_with: Option<String>,
}

impl FilterConfig {
    fn to_scan_filter(&self) -> Option<ScanFilter> {
        match (&self.equals, &self.begins_with) {
            (Some(value), None) => Some(ScanFilter::Equals {
                attribute: self.attribute.clone(),
                value: value.clone(),
            }),
            (None, Some(prefix)) => Some(ScanFilter::BeginsWith {
                attribute: self.attribute.clone(),
                prefix: prefix.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImagesConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_expires_secs")]
    pub expires_secs: u64,
    /// Confirm each object exists (signed `HEAD`) before presigning.
    #[serde(default = "default_verify_objects")]
    pub verify_objects: bool,
    /// Custom S3 endpoint (MinIO, LocalStack). Uses path-style addressing.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            expires_secs: default_expires_secs(),
            verify_objects: default_verify_objects(),
            endpoint_url: None,
        }
    }
}

fn default_bucket() -> String {
    "portal-images-cc-assignment".to_string()
}
fn default_expires_secs() -> u64 {
    3600
}
fn default_verify_objects() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

/// Load, override from the process environment, and validate.
///
/// With `path = None` the default path is used when it exists; otherwise
/// built-in defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            parse_file(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => Config::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate(&config)?;
    Ok(config)
}

fn parse_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content).with_context(|| "Failed to parse config file")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            aws: AwsConfig::default(),
            news: default_news_table(),
            sidebar: default_sidebar_table(),
            images: ImagesConfig::default(),
            http: HttpConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Apply environment overrides. `lookup` returns the value of a variable;
/// empty values are ignored.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(region) = get("AWS_REGION") {
        config.aws.region = region;
    }
    if let Some(table) = get("NEWS_TABLE") {
        config.news.table = table;
    }
    if let Some(table) = get("SIDEBAR_TABLE") {
        config.sidebar.table = table;
    }
    if let Some(bucket) = get("BUCKET_NAME") {
        config.images.bucket = bucket;
    }
    if let Some(port) = get("PORT") {
        let host = config
            .server
            .bind
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| config.server.bind.clone());
        config.server.bind = format!("{}:{}", host, port.trim());
    }
}

/// Check invariants the rest of the portal relies on.
pub fn validate(config: &Config) -> Result<()> {
    if config.aws.region.trim().is_empty() {
        bail!("aws.region must not be empty");
    }

    for (section, table) in [("news", &config.news), ("sidebar", &config.sidebar)] {
        if table.table.trim().is_empty() {
            bail!("{}.table must not be empty", section);
        }
        if table.scan_limit == 0 || table.scan_limit > MAX_SCAN_LIMIT {
            bail!("{}.scan_limit must be in 1..={}", section, MAX_SCAN_LIMIT);
        }
        if let Some(ref filter) = table.filter {
            if filter.attribute.trim().is_empty() {
                bail!("{}.filter.attribute must not be empty", section);
            }
            if filter.to_scan_filter().is_none() {
                bail!(
                    "{}.filter needs exactly one of `equals` or `begins_with`",
                    section
                );
            }
        }
    }

    if config.images.bucket.trim().is_empty() {
        bail!("images.bucket must not be empty");
    }
    if config.images.expires_secs == 0 || config.images.expires_secs > MAX_PRESIGN_SECS {
        bail!("images.expires_secs must be in 1..={}", MAX_PRESIGN_SECS);
    }

    if config.http.timeout_secs == 0 {
        bail!("http.timeout_secs must be > 0");
    }

    match config.server.bind.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => {}
        _ => bail!(
            "server.bind must be host:port, got '{}'",
            config.server.bind
        ),
    }

    Ok(())
}
