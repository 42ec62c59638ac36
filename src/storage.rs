//! Storage backend access.
//!
//! The portal only ever performs one bounded scan per collection per
//! request. [`RecordStore`] is the seam the content service depends on;
//! [`DynamoDbClient`] implements it against the DynamoDB JSON API with
//! SigV4 signing (see [`crate::sigv4`]).
//!
//! Records are returned exactly as stored, typed attribute wrappers included.
//! Normalization happens downstream in [`crate::normalize`].

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::StorageError;
use crate::models::RawRecord;
use crate::sigv4::{self, AwsCredentials, Endpoint, HeaderSigningRequest, Scope};

const SCAN_TARGET: &str = "DynamoDB_20120810.Scan";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// A single bounded scan of a named collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub table: String,
    /// Upper bound on returned records.
    pub limit: u32,
    pub filter: Option<ScanFilter>,
}

impl ScanRequest {
    pub fn new(table: impl Into<String>, limit: u32) -> Self {
        Self {
            table: table.into(),
            limit,
            filter: None,
        }
    }
}

/// Server-side narrowing of a scan on one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanFilter {
    Equals { attribute: String, value: String },
    BeginsWith { attribute: String, prefix: String },
}

/// A source of raw records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Return up to `request.limit` records in backend-defined order.
    async fn scan(&self, request: &ScanRequest) -> Result<Vec<RawRecord>, StorageError>;
}

/// DynamoDB client speaking the JSON 1.0 protocol.
pub struct DynamoDbClient {
    http: reqwest::Client,
    creds: AwsCredentials,
    region: String,
    endpoint: Endpoint,
}

impl DynamoDbClient {
    /// Client for `region`, or for a custom endpoint such as DynamoDB Local.
    pub fn new(
        http: reqwest::Client,
        creds: AwsCredentials,
        region: impl Into<String>,
        endpoint_url: Option<&str>,
    ) -> Self {
        let region = region.into();
        let endpoint = match endpoint_url {
            Some(url) => Endpoint::parse(url),
            None => Endpoint::https(format!("dynamodb.{}.amazonaws.com", region)),
        };
        Self {
            http,
            creds,
            region,
            endpoint,
        }
    }
}

#[async_trait]
impl RecordStore for DynamoDbClient {
    async fn scan(&self, request: &ScanRequest) -> Result<Vec<RawRecord>, StorageError> {
        let body = build_scan_body(request).to_string();
        let signed = sigv4::sign_headers(
            &self.creds,
            Scope {
                region: &self.region,
                service: "dynamodb",
            },
            &HeaderSigningRequest {
                method: "POST",
                host: &self.endpoint.host,
                canonical_uri: "/",
                headers: &[("content-type", CONTENT_TYPE), ("x-amz-target", SCAN_TARGET)],
                payload: body.as_bytes(),
            },
            Utc::now(),
        );

        let mut req = self
            .http
            .post(format!("{}/", self.endpoint.base_url()))
            .body(body);
        for (name, value) in &signed {
            req = req.header(name.as_str(), value.as_str());
        }

        debug!(table = %request.table, limit = request.limit, "scanning table");
        let resp = req.send().await.map_err(|source| StorageError::Transport {
            table: request.table.clone(),
            source,
        })?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|source| StorageError::Transport {
            table: request.table.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(StorageError::Rejected {
                table: request.table.clone(),
                status: status.as_u16(),
                message: describe_error(&String::from_utf8_lossy(&bytes)),
            });
        }

        let parsed: ScanResponse =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Decode {
                table: request.table.clone(),
                source,
            })?;
        debug!(table = %request.table, count = parsed.items.len(), "scan complete");
        Ok(parsed.items)
    }
}

/// Build the JSON body of a `Scan` call.
pub fn build_scan_body(request: &ScanRequest) -> Value {
    let mut body = json!({
        "TableName": request.table,
        "Limit": request.limit,
    });

    let (expression, attribute, value) = match &request.filter {
        None => return body,
        Some(ScanFilter::Equals { attribute, value }) => ("#f = :v", attribute, value),
        Some(ScanFilter::BeginsWith { attribute, prefix }) => {
            ("begins_with(#f, :v)", attribute, prefix)
        }
    };
    body["FilterExpression"] = json!(expression);
    body["ExpressionAttributeNames"] = json!({ "#f": attribute });
    body["ExpressionAttributeValues"] = json!({ ":v": { "S": value } });
    body
}

#[derive(Deserialize)]
struct ScanResponse {
    #[serde(rename = "Items", default)]
    items: Vec<RawRecord>,
}

/// DynamoDB spells the message key `message` or `Message` depending on the
/// error; either may be present.
#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "Message", default)]
    message_upper: Option<String>,
}

/// Render a DynamoDB error body as `ExceptionName: message`.
///
/// Bodies that are not DynamoDB errors are passed through, truncated.
fn describe_error(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            kind: Some(kind),
            message,
            message_upper,
        }) => {
            let name = kind.rsplit('#').next().unwrap_or(&kind);
            match message.or(message_upper) {
                Some(message) => format!("{}: {}", name, message),
                None => name.to_string(),
            }
        }
        _ => body.chars().take(500).collect(),
    }
}
