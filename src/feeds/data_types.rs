use std::sync::LazyLock;

use regex::Regex;

use crate::{feed_article_id, is_missing_url, title_or_default, Article};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

/// The fields of an RSS item the notifier cares about
#[derive(Clone, Debug)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
}

impl FeedEntry {
    pub fn from(item: &rss::Item) -> FeedEntry {
        // fall back to a permalink guid when the item has no <link>
        let link = item
            .link()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .or_else(|| {
                item.guid()
                    .filter(|g| g.is_permalink() && g.value().trim().starts_with("http"))
                    .map(|g| g.value().trim())
            })
            .unwrap_or_default()
            .to_string();

        let description = item
            .description()
            .map(strip_html)
            .filter(|d| !d.is_empty());

        Self {
            title: title_or_default(item.title()),
            link,
            description,
        }
    }

    /// Turn the entry into an article of the named feed; entries without a
    /// link are dropped.
    pub fn into_article(self, source_name: &str) -> Option<Article> {
        if is_missing_url(&self.link) {
            return None;
        }
        Some(Article {
            id: feed_article_id(source_name, &self.link),
            title: self.title,
            link: self.link,
            description: self.description,
            source: source_name.to_string(),
        })
    }
}

/// Strip markup from a feed summary, leaving plain text
pub fn strip_html(html: &str) -> String {
    let text = TAG.replace_all(html, "");
    html_escape::decode_html_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Stocks <b>fell</b> &amp; bonds\n rallied.</p>"),
            "Stocks fell & bonds rallied."
        );
        assert_eq!(strip_html("<img src=\"x.png\"/>"), "");
        assert_eq!(strip_html("plain"), "plain");
    }

    #[test]
    fn test_strip_html_decodes_entities() {
        assert_eq!(
            strip_html("<p>Fed&#8217;s move &mdash; markets &#x27;rally&#x27;</p>"),
            "Fed\u{2019}s move \u{2014} markets 'rally'"
        );
        assert_eq!(strip_html("Q1&nbsp;&nbsp;results &lt;b&gt;"), "Q1 results <b>");
    }

    #[test]
    fn test_entry_from_item() {
        let mut item = rss::Item::default();
        item.set_title(" Markets close higher ".to_string());
        item.set_link(" https://example.com/a ".to_string());
        item.set_description("<p>Summary</p>".to_string());

        let entry = FeedEntry::from(&item);
        assert_eq!(entry.title, "Markets close higher");
        assert_eq!(entry.link, "https://example.com/a");
        assert_eq!(entry.description.as_deref(), Some("Summary"));

        let article = entry.into_article("WSJ Markets").unwrap();
        assert_eq!(article.source, "WSJ Markets");
        assert_eq!(
            article.id,
            crate::feed_article_id("WSJ Markets", "https://example.com/a")
        );
    }

    #[test]
    fn test_guid_fallback() {
        let mut guid = rss::Guid::default();
        guid.set_value("https://example.com/from-guid".to_string());
        guid.set_permalink(true);
        let mut item = rss::Item::default();
        item.set_guid(guid);

        let entry = FeedEntry::from(&item);
        assert_eq!(entry.link, "https://example.com/from-guid");
        assert_eq!(entry.title, "No title");
        assert!(entry.description.is_none());
    }

    #[test]
    fn test_entry_without_link_is_dropped() {
        let mut guid = rss::Guid::default();
        guid.set_value("tag:example.com,2024:1".to_string());
        guid.set_permalink(false);
        let mut item = rss::Item::default();
        item.set_title("No link".to_string());
        item.set_guid(guid);

        assert!(FeedEntry::from(&item).into_article("FT Home").is_none());
    }
}
