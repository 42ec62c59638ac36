//! Image reference resolution.
//!
//! Turns an opaque object-store key into a time-limited URL a browser can
//! load directly. [`S3Presigner`] signs a SigV4 query-string URL locally; when
//! `verify_objects` is on it first issues a signed `HEAD` so missing or
//! forbidden objects surface as a [`ResolutionError`] instead of a dead link.
//!
//! Resolvers hold no mutable state and are shared behind `Arc`, so any number
//! of resolutions can be in flight at once. [`resolve_all`] fans a batch out
//! and keeps every key's outcome separate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::StatusCode;

use crate::config::ImagesConfig;
use crate::error::ResolutionError;
use crate::sigv4::{self, AwsCredentials, Endpoint, HeaderSigningRequest, Scope};

/// Resolves an image key to an access URL.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, key: &str) -> Result<String, ResolutionError>;
}

/// Resolve every key concurrently.
///
/// The output has one entry per input key, in input order, whatever order
/// the individual resolutions finish in. A failure only affects its own
/// entry.
pub async fn resolve_all<R>(
    resolver: &R,
    keys: &[String],
) -> Vec<Result<String, ResolutionError>>
where
    R: ImageResolver + ?Sized,
{
    join_all(keys.iter().map(|key| resolver.resolve(key))).await
}

/// Presigned-URL resolver for an S3 (or S3-compatible) bucket.
pub struct S3Presigner {
    http: reqwest::Client,
    creds: AwsCredentials,
    region: String,
    bucket: String,
    /// `Some` for custom endpoints, which are addressed path-style.
    custom_endpoint: Option<Endpoint>,
    expires_secs: u64,
    verify_objects: bool,
}

impl S3Presigner {
    pub fn new(
        http: reqwest::Client,
        creds: AwsCredentials,
        region: impl Into<String>,
        images: &ImagesConfig,
    ) -> Self {
        Self {
            http,
            creds,
            region: region.into(),
            bucket: images.bucket.clone(),
            custom_endpoint: images.endpoint_url.as_deref().map(Endpoint::parse),
            expires_secs: images.expires_secs,
            verify_objects: images.verify_objects,
        }
    }

    fn scope(&self) -> Scope<'_> {
        Scope {
            region: &self.region,
            service: "s3",
        }
    }

    /// Endpoint and canonical URI of an object.
    ///
    /// AWS uses virtual-hosted addressing
    /// (`<bucket>.s3.<region>.amazonaws.com/<key>`); custom endpoints use
    /// path-style (`<endpoint>/<bucket>/<key>`).
    fn locate(&self, key: &str) -> (Endpoint, String) {
        let encoded_key = sigv4::encode_key_path(key);
        match self.custom_endpoint {
            Some(ref endpoint) => (
                endpoint.clone(),
                format!("/{}/{}", sigv4::uri_encode(&self.bucket), encoded_key),
            ),
            None => (
                Endpoint::https(format!("{}.s3.{}.amazonaws.com", self.bucket, self.region)),
                format!("/{}", encoded_key),
            ),
        }
    }

    /// Presigned `GET` URL for `key`, valid for the configured window from `now`.
    pub fn presign_at(&self, key: &str, now: DateTime<Utc>) -> String {
        let (endpoint, canonical_uri) = self.locate(key);
        sigv4::presign_url(
            &self.creds,
            self.scope(),
            &endpoint,
            &canonical_uri,
            self.expires_secs,
            now,
        )
    }

    /// Confirm the object exists and is readable with a signed `HEAD`.
    async fn head_object(&self, key: &str) -> Result<(), ResolutionError> {
        let (endpoint, canonical_uri) = self.locate(key);
        let signed = sigv4::sign_headers(
            &self.creds,
            self.scope(),
            &HeaderSigningRequest {
                method: "HEAD",
                host: &endpoint.host,
                canonical_uri: &canonical_uri,
                headers: &[],
                payload: b"",
            },
            Utc::now(),
        );

        let mut req = self
            .http
            .head(format!("{}{}", endpoint.base_url(), canonical_uri));
        for (name, value) in &signed {
            req = req.header(name.as_str(), value.as_str());
        }

        let resp = req.send().await.map_err(|source| ResolutionError::Network {
            key: key.to_string(),
            source,
        })?;

        match resp.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ResolutionError::NotFound {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            }),
            StatusCode::FORBIDDEN => Err(ResolutionError::AccessDenied {
                bucket: self.bucket.clone(),
                key: key.to_string(),
            }),
            status => Err(ResolutionError::UnexpectedStatus {
                key: key.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}

#[async_trait]
impl ImageResolver for S3Presigner {
    async fn resolve(&self, key: &str) -> Result<String, ResolutionError> {
        if key.trim().is_empty() {
            return Err(ResolutionError::InvalidKey);
        }
        if self.verify_objects {
            self.head_object(key).await?;
        }
        Ok(self.presign_at(key, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn presigner(endpoint_url: Option<&str>) -> S3Presigner {
        let images = ImagesConfig {
            bucket: "portal-images".into(),
            expires_secs: 3600,
            verify_objects: false,
            endpoint_url: endpoint_url.map(str::to_string),
        };
        S3Presigner::new(
            reqwest::Client::new(),
            AwsCredentials {
                access_key_id: "AKIDEXAMPLE".into(),
                secret_access_key: "secret".into(),
                session_token: None,
            },
            "ap-south-1",
            &images,
        )
    }

    #[test]
    fn test_virtual_hosted_url() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let url = presigner(None).presign_at("news/hero image.jpg", now);
        assert!(url.starts_with(
            "https://portal-images.s3.ap-south-1.amazonaws.com/news/hero%20image.jpg?"
        ));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Date=20240301T083000Z"));
        assert!(url.contains("&X-Amz-Signature="));
    }

    #[test]
    fn test_path_style_url_for_custom_endpoint() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let url = presigner(Some("http://localhost:9000")).presign_at("a.png", now);
        assert!(url.starts_with("http://localhost:9000/portal-images/a.png?"));
    }

    #[test]
    fn test_presign_is_deterministic_for_same_instant() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let p = presigner(None);
        assert_eq!(p.presign_at("a.png", now), p.presign_at("a.png", now));
        assert_ne!(p.presign_at("a.png", now), p.presign_at("b.png", now));
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let err = presigner(None).resolve("  ").await.unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidKey));
    }

    #[tokio::test]
    async fn test_resolve_without_verification_does_no_io() {
        let url = presigner(None).resolve("a.png").await.unwrap();
        assert!(url.contains("/a.png?"));
    }

    struct OddKeysFail;

    #[async_trait]
    impl ImageResolver for OddKeysFail {
        async fn resolve(&self, key: &str) -> Result<String, ResolutionError> {
            let n: u32 = key.parse().unwrap();
            // Later keys finish first.
            tokio::time::sleep(std::time::Duration::from_millis(u64::from(10 - n))).await;
            if n % 2 == 1 {
                Err(ResolutionError::NotFound {
                    bucket: "b".into(),
                    key: key.to_string(),
                })
            } else {
                Ok(format!("url-{}", key))
            }
        }
    }

    #[tokio::test]
    async fn test_resolve_all_isolates_failures_and_keeps_order() {
        let keys: Vec<String> = (0..6).map(|n| n.to_string()).collect();
        let results = resolve_all(&OddKeysFail, &keys).await;
        assert_eq!(results.len(), 6);
        for (n, result) in results.iter().enumerate() {
            if n % 2 == 1 {
                assert!(result.is_err());
            } else {
                assert_eq!(result.as_ref().unwrap(), &format!("url-{}", n));
            }
        }
    }
}
