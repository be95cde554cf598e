use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{api_article_id, title_or_default, Article};

/// Display label of articles from the TradingEconomics API
pub const TE_SOURCE: &str = "TradingEconomics";

/// A news item as returned by the TradingEconomics API
#[derive(Debug, Deserialize)]
pub struct JsonNewsItem {
    id: Option<Value>,
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
}

impl JsonNewsItem {
    /// The upstream id, either a JSON number or a non-blank string
    pub fn native_id(&self) -> Option<String> {
        match &self.id {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    /// Normalize into an article; items without an id are dropped.
    pub fn as_article(&self, site_url: &Url) -> Option<Article> {
        let native_id = self.native_id()?;
        let link = article_full_url(site_url, self.url.as_deref().unwrap_or_default());

        Some(Article {
            id: api_article_id(&native_id),
            title: title_or_default(self.title.as_deref()),
            link,
            description: self
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(ToString::to_string),
            source: TE_SOURCE.to_string(),
        })
    }
}

/// Build the full article URL from the relative path the API returns.
/// Absolute URLs are kept as they are; anything else is appended to the
/// site, so a `//host/x` path can never point at another host.
pub fn article_full_url(site_url: &Url, relative_url: &str) -> String {
    let path = relative_url.trim();
    if let Ok(absolute) = Url::parse(path) {
        return absolute.to_string();
    }
    let base = site_url.as_str().trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn site() -> Url {
        Url::parse("https://tradingeconomics.com").unwrap()
    }

    fn item(json: &str) -> JsonNewsItem {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_article_full_url() {
        assert_eq!(
            article_full_url(&site(), "/news/1"),
            "https://tradingeconomics.com/news/1"
        );
        assert_eq!(
            article_full_url(&site(), "united-states/news/2"),
            "https://tradingeconomics.com/united-states/news/2"
        );
        assert_eq!(
            article_full_url(&site(), " https://example.com/x "),
            "https://example.com/x"
        );
        assert_eq!(article_full_url(&site(), ""), "https://tradingeconomics.com/");
    }

    #[test]
    fn test_scheme_relative_path_stays_on_site() {
        assert_eq!(
            article_full_url(&site(), "//other.host/x"),
            "https://tradingeconomics.com//other.host/x"
        );
    }

    #[test]
    fn test_as_article() {
        let article = item(
            r#"{"id": 42, "title": "Rates rise", "url": "/news/1", "description": " Fed hikes. ", "date": "2024-01-01"}"#,
        )
        .as_article(&site())
        .unwrap();

        assert_eq!(article.id, "te:42");
        assert_eq!(article.title, "Rates rise");
        assert_eq!(article.link, "https://tradingeconomics.com/news/1");
        assert_eq!(article.description.as_deref(), Some("Fed hikes."));
        assert_eq!(article.source, TE_SOURCE);
    }

    #[test]
    fn test_string_id_and_missing_fields() {
        let article = item(r#"{"id": "77", "title": null, "description": ""}"#)
            .as_article(&site())
            .unwrap();
        assert_eq!(article.id, "te:77");
        assert_eq!(article.title, "No title");
        assert!(article.description.is_none());
    }

    #[test]
    fn test_missing_id_is_dropped() {
        assert!(item(r#"{"title": "No id"}"#).as_article(&site()).is_none());
        assert!(item(r#"{"id": null}"#).as_article(&site()).is_none());
        assert!(item(r#"{"id": " "}"#).as_article(&site()).is_none());
        assert!(item(r#"{"id": [1]}"#).as_article(&site()).is_none());
    }
}
