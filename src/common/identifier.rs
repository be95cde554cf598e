use sha2::{Digest, Sha256};

/// Namespace of articles coming from the TradingEconomics API
pub const API_NAMESPACE: &str = "te";
/// Namespace of articles coming from RSS feeds
pub const FEED_NAMESPACE: &str = "rss";

/// Join a namespace and a source-specific key into an article identifier.
#[must_use]
pub fn assign_id(namespace: &str, natural_key: &str) -> String {
    format!("{namespace}:{natural_key}")
}

/// Identifier of an API article, e.g. `te:42`
#[must_use]
pub fn api_article_id(native_id: &str) -> String {
    assign_id(API_NAMESPACE, native_id)
}

/// Identifier of a feed article: `rss:<slug>:<sha256 of the link>`. The same
/// source name and link always give the same identifier.
#[must_use]
pub fn feed_article_id(source_name: &str, link: &str) -> String {
    let key = format!("{}:{}", slugify(source_name), link_digest(link));
    assign_id(FEED_NAMESPACE, &key)
}

/// Slug used in state keys: `WSJ Markets` -> `wsj-markets`
#[must_use]
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

fn link_digest(link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// True for identifiers written by versions that stored bare API ids.
#[must_use]
pub fn is_legacy_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(':') && id.chars().all(|c| c.is_ascii_digit())
}

/// Rewrite a legacy bare id into the current namespaced form; everything
/// else is returned unchanged.
#[must_use]
pub fn migrate_legacy_id(id: String) -> String {
    if is_legacy_id(&id) {
        api_article_id(&id)
    } else {
        id
    }
}
