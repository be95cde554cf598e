use crate::NotifierError;

mod errors;
mod identifier;

/// Title used when the upstream item has none
pub const NO_TITLE: &str = "No title";

/// A news article normalized from any source
#[derive(Clone, Debug, PartialEq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub source: String,
}

/// What one source produced during a fetch cycle. A failed source carries the
/// reason instead of articles, and never affects the other sources.
#[derive(Debug)]
pub struct FetchOutcome {
    pub source: String,
    pub result: Result<Vec<Article>, NotifierError>,
}

impl FetchOutcome {
    #[must_use]
    pub fn fetched(source: &str, articles: Vec<Article>) -> Self {
        Self {
            source: source.to_string(),
            result: Ok(articles),
        }
    }

    #[must_use]
    pub fn failed(source: &str, error: NotifierError) -> Self {
        Self {
            source: source.to_string(),
            result: Err(error),
        }
    }

    #[cfg(test)]
    pub fn is_failed(&self) -> bool {
        self.result.is_err()
    }
}

pub trait Fetch {
    /// Fetch the latest articles, one outcome per upstream source
    async fn fetch(&self) -> Vec<FetchOutcome>;
}

/// Use a trimmed title, or the placeholder when it is missing or blank
pub fn title_or_default(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => NO_TITLE.to_string(),
    }
}

/// Check if a URL is missing or empty
pub fn is_missing_url(item_url: &str) -> bool {
    item_url.trim().is_empty()
}

pub mod prelude {
    pub use super::errors::*;
    pub use super::identifier::*;
    pub use super::{
        is_missing_url, title_or_default, Article, Fetch, FetchOutcome,
    };
}
