//! Article projection.
//!
//! Several generations of article schema live side by side in the news
//! table, so every canonical field is read through a fallback chain of
//! historical field names:
//!
//! | Field | Candidates | Default |
//! |-------|------------|---------|
//! | `id` | `id`, `ID` | `None` |
//! | `title` | `title`, `heading`, `name` | `""` |
//! | `summary` | `summary` | `""` |
//! | `author` | `author` | `""` |
//! | `publishedAt` | `publishedAt` | `""` |
//! | `imageKey` | `imageKey`, `image` | `None` |
//! | `tags` | `tags` | `[]` |
//!
//! A field holding an unusable value (say, a map where a title belongs) is
//! logged and skipped; the chain moves on and the rest of the record is
//! unaffected.

use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::warn;

use crate::models::{Article, RawRecord};
use crate::normalize::{is_falsy, kind_of, normalize_lenient, text_field};
use crate::resolver::ImageResolver;

/// Map a raw record to an [`Article`], without touching the object store.
pub fn project(record: &RawRecord) -> Article {
    let fields = normalize_lenient(record);
    project_fields(&fields)
}

fn project_fields(fields: &Map<String, Value>) -> Article {
    Article {
        id: text_field(fields, &["id", "ID"]),
        title: text_field(fields, &["title", "heading", "name"]).unwrap_or_default(),
        summary: text_field(fields, &["summary"]).unwrap_or_default(),
        author: text_field(fields, &["author"]).unwrap_or_default(),
        published_at: text_field(fields, &["publishedAt"]).unwrap_or_default(),
        image_key: text_field(fields, &["imageKey", "image"]),
        tags: tags(fields.get("tags")),
        image_url: None,
    }
}

/// Tags are always a list: arrays keep their order, a lone truthy scalar
/// becomes a one-element list, anything else is empty.
fn tags(value: Option<&Value>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(tag_text).collect(),
        Some(scalar) if is_falsy(scalar) => Vec::new(),
        Some(scalar) => tag_text(scalar).into_iter().collect(),
    }
}

fn tag_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => {
            warn!(found = kind_of(other), "ignoring tag with unexpected type");
            None
        }
    }
}

/// Fill in `image_url` for an article.
///
/// Never fails: with no key no I/O happens, and a resolution failure is
/// logged and leaves `image_url` as `None`.
pub async fn attach_image<R>(resolver: &R, mut article: Article) -> Article
where
    R: ImageResolver + ?Sized,
{
    article.image_url = match article.image_key.as_deref() {
        None => None,
        Some(key) => match resolver.resolve(key).await {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(key, error = %err, "failed to resolve image");
                None
            }
        },
    };
    article
}

/// Project a batch and resolve all images concurrently.
///
/// Output order matches `records`; total latency is that of the slowest
/// single resolution.
pub async fn project_all<R>(resolver: &R, records: &[RawRecord]) -> Vec<Article>
where
    R: ImageResolver + ?Sized,
{
    join_all(
        records
            .iter()
            .map(project)
            .map(|article| attach_image(resolver, article)),
    )
    .await
}
