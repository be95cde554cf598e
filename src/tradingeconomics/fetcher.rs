use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::{config::AppConfig, Article, Fetch, FetchOutcome, NotifierError};

use super::data_types::{JsonNewsItem, TE_SOURCE};

pub struct TEFetcher {
    client: reqwest::Client,
    api_url: String,
    site_url: Url,
    api_key: String,
    limit: usize,
}

impl TEFetcher {
    /// Create a new fetcher with the given configuration
    pub fn new(config: &AppConfig) -> Result<TEFetcher, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()?;
        Ok(Self {
            client,
            api_url: config.te_api_url.clone(),
            site_url: Url::parse(&config.te_site_url)?,
            api_key: config.te_api_key.clone(),
            limit: config.api_limit,
        })
    }

    /// Fetch the latest news, newest first, at most `limit` of them. Items
    /// without an id or that fail to decode are skipped one by one; a payload
    /// that is not a list fails the whole source.
    async fn fetch_articles(&self) -> Result<Vec<Article>, NotifierError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("c", self.api_key.clone()),
                ("f", "json".to_string()),
                ("limit", self.limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::UnexpectedStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let Value::Array(entries) = response.json::<Value>().await? else {
            return Err(NotifierError::UnexpectedPayload(
                "expected a list of news items".to_string(),
            ));
        };

        let mut articles = Vec::new();
        for entry in entries.into_iter().take(self.limit) {
            match serde_json::from_value::<JsonNewsItem>(entry) {
                Ok(item) => match item.as_article(&self.site_url) {
                    Some(article) => articles.push(article),
                    None => debug!("skipping news item without id"),
                },
                Err(e) => debug!(error = %e, "skipping malformed news item"),
            }
        }

        Ok(articles)
    }
}

impl Fetch for TEFetcher {
    async fn fetch(&self) -> Vec<FetchOutcome> {
        let outcome = match self.fetch_articles().await {
            Ok(articles) => {
                info!(source = TE_SOURCE, count = articles.len(), "fetched news");
                FetchOutcome::fetched(TE_SOURCE, articles)
            }
            Err(e) => {
                warn!(source = TE_SOURCE, error = %e, "TradingEconomics API request failed");
                FetchOutcome::failed(TE_SOURCE, e)
            }
        };
        vec![outcome]
    }
}
