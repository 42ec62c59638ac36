//! End-to-end tests of the content service over in-memory backends.

mod common;

use serde_json::json;

use common::{service, FakeResolver, MemoryStore, IMAGE_HOST, NEWS, SIDEBAR};
use news_portal::models::{Sidebar, SidebarCategory};
use news_portal::resolver::resolve_all;
use news_portal::service::HomePage;

fn portal_store() -> MemoryStore {
    MemoryStore::default()
        .with_table(
            NEWS,
            json!([
                {
                    "id": {"S": "1"},
                    "title": {"S": "Monsoon reaches Kerala"},
                    "summary": {"S": "Early onset this year"},
                    "author": {"S": "Weather Desk"},
                    "publishedAt": {"S": "2024-06-01"},
                    "imageKey": {"S": "news/monsoon.jpg"},
                    "tags": {"L": [{"S": "Weather"}, {"S": "India"}]}
                },
                {
                    "ID": {"N": "2"},
                    "heading": {"S": "Budget session opens"},
                    "image": {"S": "news/missing.jpg"},
                    "tags": {"SS": ["Politics"]}
                },
                {
                    "id": "3",
                    "name": "Cup final tonight",
                    "author": "Sports Desk",
                    "tags": "Sports"
                }
            ]),
        )
        .with_table(
            SIDEBAR,
            json!([
                {"type": {"S": "latest"}, "title": {"S": "Monsoon reaches Kerala"}},
                {"type": {"S": "category"}, "name": {"S": "World News"}},
                {"type": {"S": "category"}, "name": {"S": "Sports"}, "slug": {"S": "sport"}}
            ]),
        )
}

#[tokio::test]
async fn test_distilled_article_scenario() {
    let store = MemoryStore::default().with_table(
        NEWS,
        json!([
            {"title": "A", "tags": ["x", "y"]},
            {"heading": "B", "tags": "z"}
        ]),
    );
    let svc = service(store, FakeResolver::default());

    let all = svc.fetch_articles().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].title, "A");
    assert_eq!(all[0].tags, vec!["x", "y"]);
    assert_eq!(all[1].title, "B");
    assert_eq!(all[1].tags, vec!["z"]);

    let (filtered, _) = svc.list_articles(None, Some("z")).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].title, "B");
}

#[tokio::test]
async fn test_distilled_sidebar_scenario() {
    let store = MemoryStore::default().with_table(
        SIDEBAR,
        json!([
            {"type": "latest", "title": "T1"},
            {"type": "category", "name": "Tech"}
        ]),
    );
    let svc = service(store, FakeResolver::default());

    let sidebar = svc.fetch_sidebar().await.unwrap();
    assert_eq!(
        sidebar,
        Sidebar {
            latest: vec!["T1".into()],
            categories: vec![SidebarCategory {
                name: "Tech".into(),
                slug: "tech".into(),
            }],
        }
    );
}

#[tokio::test]
async fn test_mixed_shapes_project_and_resolve() {
    let svc = service(portal_store(), FakeResolver::missing(&["news/missing.jpg"]));

    let articles = svc.fetch_articles().await.unwrap();
    assert_eq!(articles.len(), 3);

    let first = &articles[0];
    assert_eq!(first.id.as_deref(), Some("1"));
    assert_eq!(first.published_at, "2024-06-01");
    assert_eq!(first.tags, vec!["Weather", "India"]);
    assert_eq!(
        first.image_url.as_deref(),
        Some(format!("{}/news/monsoon.jpg", IMAGE_HOST).as_str())
    );

    // Numeric id from the legacy `ID` attribute; image lookup failed.
    let second = &articles[1];
    assert_eq!(second.id.as_deref(), Some("2"));
    assert_eq!(second.title, "Budget session opens");
    assert_eq!(second.image_key.as_deref(), Some("news/missing.jpg"));
    assert_eq!(second.image_url, None);

    let third = &articles[2];
    assert_eq!(third.title, "Cup final tonight");
    assert_eq!(third.tags, vec!["Sports"]);
    assert_eq!(third.image_key, None);
    assert_eq!(third.image_url, None);
}

#[tokio::test]
async fn test_list_articles_filters_and_keeps_sidebar() {
    let svc = service(portal_store(), FakeResolver::default());

    let (articles, sidebar) = svc.list_articles(Some("DESK"), None).await.unwrap();
    let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, ["Monsoon reaches Kerala", "Cup final tonight"]);
    assert_eq!(sidebar.latest, vec!["Monsoon reaches Kerala"]);
    assert_eq!(
        sidebar.categories,
        vec![
            SidebarCategory {
                name: "World News".into(),
                slug: "world-news".into(),
            },
            SidebarCategory {
                name: "Sports".into(),
                slug: "sport".into(),
            },
        ]
    );

    let (articles, _) = svc
        .list_articles(Some("desk"), Some("sports"))
        .await
        .unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].id.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_list_articles_fails_when_either_scan_fails() {
    let svc = service(portal_store().failing(SIDEBAR), FakeResolver::default());
    assert!(svc.list_articles(None, None).await.is_err());

    let svc = service(portal_store().failing(NEWS), FakeResolver::default());
    assert!(svc.list_articles(None, None).await.is_err());
}

#[tokio::test]
async fn test_home_echoes_filters() {
    let svc = service(portal_store(), FakeResolver::default());

    let page = svc.home(Some("budget"), None).await;
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.search_query, "budget");
    assert_eq!(page.category_filter, "");
    assert!(!page.sidebar.categories.is_empty());
}

#[tokio::test]
async fn test_home_degrades_to_empty_page() {
    let svc = service(portal_store().failing(NEWS), FakeResolver::default());
    assert_eq!(svc.home(Some("budget"), Some("politics")).await, HomePage::empty());
}

#[tokio::test]
async fn test_get_article_by_id() {
    let svc = service(portal_store(), FakeResolver::default());

    let article = svc.get_article_by_id("2").await.unwrap().unwrap();
    assert_eq!(article.title, "Budget session opens");
    assert_eq!(
        article.image_url.as_deref(),
        Some(format!("{}/news/missing.jpg", IMAGE_HOST).as_str())
    );

    assert_eq!(svc.get_article_by_id("404").await.unwrap(), None);
}

#[tokio::test]
async fn test_get_article_by_id_propagates_storage_error() {
    let svc = service(portal_store().failing(NEWS), FakeResolver::default());
    assert!(svc.get_article_by_id("1").await.is_err());
}

#[tokio::test]
async fn test_sidebar_or_empty() {
    let svc = service(portal_store().failing(SIDEBAR), FakeResolver::default());
    assert_eq!(svc.sidebar_or_empty().await, Sidebar::default());
}

#[tokio::test]
async fn test_resolve_all_isolates_failures() {
    let svc = service(MemoryStore::default(), FakeResolver::missing(&["b.jpg"]));
    let keys = vec!["a.jpg".to_string(), "b.jpg".to_string(), " ".to_string()];

    let results = resolve_all(svc.resolver(), &keys).await;
    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].as_deref().ok(),
        Some(format!("{}/a.jpg", IMAGE_HOST).as_str())
    );
    assert!(results[1].is_err());
    assert!(results[2].is_err());
}

#[tokio::test]
async fn test_empty_tables() {
    let svc = service(MemoryStore::default(), FakeResolver::default());
    let (articles, sidebar) = svc.list_articles(None, None).await.unwrap();
    assert!(articles.is_empty());
    assert_eq!(sidebar, Sidebar::default());
}
