//! Request-time article filtering.
//!
//! Both predicates are case-insensitive substring matches:
//!
//! - **search** matches title, summary, author, or any tag;
//! - **category** matches any tag, so `"news"` also selects `"world news"`.
//!
//! A missing, empty, or whitespace-only value means "no filter". When both
//! are given an article must satisfy both. Input order is preserved.

use crate::models::Article;

/// Keep the articles that match `search` and `category`.
pub fn filter_articles(
    articles: Vec<Article>,
    search: Option<&str>,
    category: Option<&str>,
) -> Vec<Article> {
    let search = needle(search);
    let category = needle(category);
    if search.is_none() && category.is_none() {
        return articles;
    }

    articles
        .into_iter()
        .filter(|article| search.as_deref().map_or(true, |q| matches_search(article, q)))
        .filter(|article| category.as_deref().map_or(true, |c| matches_category(article, c)))
        .collect()
}

/// Lower-cased filter text, or `None` when the input is blank.
fn needle(input: Option<&str>) -> Option<String> {
    input
        .filter(|text| !text.trim().is_empty())
        .map(str::to_lowercase)
}

/// `query` must already be lower-case.
fn matches_search(article: &Article, query: &str) -> bool {
    [&article.title, &article.summary, &article.author]
        .into_iter()
        .chain(article.tags.iter())
        .any(|text| text.to_lowercase().contains(query))
}

/// `category` must already be lower-case.
fn matches_category(article: &Article, category: &str) -> bool {
    article
        .tags
        .iter()
        .any(|tag| tag.to_lowercase().contains(category))
}
