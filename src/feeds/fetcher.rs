use rss::Channel;
use tracing::{info, warn};

use crate::{
    config::{AppConfig, RssSource},
    Article, Fetch, FetchOutcome, NotifierError,
};

use super::data_types::FeedEntry;

const USER_AGENT: &str = "NewsNotifier/1.0";

pub struct RssFetcher {
    client: reqwest::Client,
    sources: Vec<RssSource>,
    limit: usize,
}

impl RssFetcher {
    /// Create a new fetcher over the configured feeds
    pub fn new(config: &AppConfig) -> Result<RssFetcher, NotifierError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            sources: config.rss_sources.clone(),
            limit: config.feed_limit,
        })
    }

    /// Pull a single feed. Only the first `limit` entries are looked at, in
    /// the feed's own order; entries without a link are dropped.
    async fn pull_feed_items(&self, source: &RssSource) -> Result<Vec<Article>, NotifierError> {
        let response = self.client.get(&source.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::UnexpectedStatus {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let content = response.bytes().await?;
        let channel = Channel::read_from(&content[..])?;
        let articles = channel
            .items()
            .iter()
            .take(self.limit)
            .filter_map(|item| FeedEntry::from(item).into_article(&source.name))
            .collect();

        Ok(articles)
    }
}

impl Fetch for RssFetcher {
    /// Every feed is fetched on its own; one failing feed does not affect the
    /// others.
    async fn fetch(&self) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::new();
        for source in &self.sources {
            match self.pull_feed_items(source).await {
                Ok(articles) => {
                    if articles.is_empty() {
                        warn!(source = source.name.as_str(), url = source.url.as_str(), "RSS feed is empty");
                    } else {
                        info!(source = source.name.as_str(), count = articles.len(), "fetched feed");
                    }
                    outcomes.push(FetchOutcome::fetched(&source.name, articles));
                }
                Err(e) => {
                    warn!(
                        source = source.name.as_str(),
                        url = source.url.as_str(),
                        error = %e,
                        "failed to fetch RSS feed"
                    );
                    outcomes.push(FetchOutcome::failed(&source.name, e));
                }
            }
        }
        outcomes
    }
}
