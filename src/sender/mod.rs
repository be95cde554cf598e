use serde::Serialize;
use tracing::{debug, warn};

use crate::{config::AppConfig, Article, NotifierError};

/// Accent color of the embed (Discord blurple)
const EMBED_COLOR: u32 = 3_447_003;
/// Description characters shown in the embed before the ellipsis
const SNIPPET_LEN: usize = 200;

pub trait Notify {
    /// Deliver one article. An error is a failure for this article only.
    async fn notify(&self, article: &Article) -> Result<(), NotifierError>;
}

#[derive(Debug, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub description: String,
    pub color: u32,
}

impl WebhookPayload {
    /// Text content is `[source] title` and the link; the embed is only
    /// added when the article has a description.
    #[must_use]
    pub fn from_article(article: &Article) -> Self {
        let title = if article.source.is_empty() {
            article.title.clone()
        } else {
            format!("[{}] {}", article.source, article.title)
        };
        let embeds = match &article.description {
            Some(description) => vec![Embed {
                title: title.clone(),
                url: article.link.clone(),
                description: snippet(description),
                color: EMBED_COLOR,
            }],
            None => vec![],
        };

        Self {
            content: format!("{title}\n{}", article.link),
            embeds,
        }
    }
}

fn snippet(description: &str) -> String {
    if description.chars().count() > SNIPPET_LEN {
        let cut: String = description.chars().take(SNIPPET_LEN).collect();
        format!("{cut}…")
    } else {
        description.to_string()
    }
}

pub struct DiscordSender {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordSender {
    /// Create a sender for the configured webhook; fails if none is set.
    pub fn new(config: &AppConfig) -> Result<Self, NotifierError> {
        let webhook_url = config.webhook_url()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(config.webhook_timeout())
            .build()?;
        Ok(Self {
            client,
            webhook_url,
        })
    }
}

impl Notify for DiscordSender {
    async fn notify(&self, article: &Article) -> Result<(), NotifierError> {
        let payload = WebhookPayload::from_article(article);
        let response = match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(id = article.id.as_str(), error = %e, "Discord webhook request failed");
                return Err(NotifierError::Http(e));
            }
        };

        let status = response.status().as_u16();
        if status == 200 || status == 204 {
            debug!(id = article.id.as_str(), "notification sent");
            return Ok(());
        }

        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(200)
            .collect();
        warn!(id = article.id.as_str(), status, body = body.as_str(), "Discord webhook rejected the message");
        Err(NotifierError::UnexpectedStatus { status, body })
    }
}
