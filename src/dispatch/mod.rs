use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::{
    config::AppConfig,
    feeds::prelude::RssFetcher,
    sender::{DiscordSender, Notify},
    storage::{SeenSet, SeenStore, StateFile},
    tradingeconomics::prelude::TEFetcher,
    Article, Fetch, FetchOutcome, NotifierError,
};

/// What happened to the candidates of one cycle
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Clone, Debug, Default)]
pub struct CycleReport {
    pub candidates: usize,
    pub failed_sources: Vec<String>,
    pub dispatch: DispatchReport,
    pub persisted: bool,
}

pub struct Dispatcher {
    send_delay: Duration,
}

impl Dispatcher {
    #[must_use]
    pub fn new(send_delay: Duration) -> Self {
        Self { send_delay }
    }

    /// Notify every article whose id is not in `seen`, in the given order,
    /// waiting `send_delay` between consecutive sends.
    ///
    /// An article is marked seen once the send was attempted, whether it
    /// succeeded or not. Failed sends are not retried in a later cycle.
    pub async fn dispatch<N: Notify>(
        &self,
        articles: &[Article],
        seen: &mut SeenSet,
        notifier: &N,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut first_send = true;

        for article in articles {
            if article.id.is_empty() || seen.contains(&article.id) {
                report.skipped += 1;
                continue;
            }

            if !first_send {
                tokio::time::sleep(self.send_delay).await;
            }
            first_send = false;

            match notifier.notify(article).await {
                Ok(()) => {
                    info!(id = article.id.as_str(), source = article.source.as_str(), "notified");
                    report.sent += 1;
                }
                Err(e) => {
                    warn!(id = article.id.as_str(), error = %e, "notification failed; marking as seen anyway");
                    report.failed += 1;
                }
            }
            seen.insert(&article.id);
        }

        report
    }
}

/// Flatten per-source outcomes into candidates, keeping source order.
/// Failed sources contribute no articles and are returned by name.
pub fn collect_articles(outcomes: Vec<FetchOutcome>) -> (Vec<Article>, Vec<String>) {
    let mut articles = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(mut fetched) => articles.append(&mut fetched),
            Err(_) => failed.push(outcome.source),
        }
    }
    (articles, failed)
}

/// One cycle: load seen ids, fetch all sources, notify new articles, then
/// persist once. Nothing is persisted before the last send, so ids notified
/// by a cycle that gets killed midway will be notified again.
pub async fn run_cycle<N: Notify, S: SeenStore>(
    config: &AppConfig,
    notifier: &N,
    store: &S,
) -> Result<CycleReport, NotifierError> {
    let mut seen = store.load();
    if seen.is_empty() {
        info!("no seen ids yet; every fetched article counts as new");
    }

    let mut outcomes = TEFetcher::new(config)?.fetch().await;
    if config.rss_enabled {
        outcomes.extend(RssFetcher::new(config)?.fetch().await);
    }
    let (articles, failed_sources) = collect_articles(outcomes);

    let dispatcher = Dispatcher::new(config.send_delay());
    let dispatch = dispatcher.dispatch(&articles, &mut seen, notifier).await;

    let persisted = match store.save(&seen) {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "could not save seen ids");
            false
        }
    };

    Ok(CycleReport {
        candidates: articles.len(),
        failed_sources,
        dispatch,
        persisted,
    })
}

/// Run a cycle against the configured webhook and state file. A missing
/// webhook fails before any work is done.
pub async fn run(config: &AppConfig) -> Result<CycleReport, NotifierError> {
    let sender = DiscordSender::new(config)?;
    let store = StateFile::new(&config.state_file, config.max_seen_ids);
    debug!(state_file = %store.path().display(), "using state file");
    let report = run_cycle(config, &sender, &store).await?;

    info!(
        candidates = report.candidates,
        sent = report.dispatch.sent,
        failed = report.dispatch.failed,
        skipped = report.dispatch.skipped,
        failed_sources = report.failed_sources.len(),
        persisted = report.persisted,
        "cycle finished"
    );
    Ok(report)
}
