//! One synchronization pass over the watch-list.
//!
//! Feeds are processed strictly in list order. The first failure of any
//! kind ends the pass; watermarks advanced before it are still saved so
//! those entries are not dispatched again on the next run.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::Instrument;

use crate::config::{ConfigStore, Configuration, WatchedFeed};
use crate::dispatch::{Dispatcher, ShellDispatcher};
use crate::error::Error;
use crate::fetch::{FeedSource, HttpFeedSource};
use crate::telemetry::{self, ctx::LogCtx};
use crate::telemetry::ops::sync::{Phase as SyncPhase, Synchronize};
use crate::template;

pub mod types;

use types::{PlannedDispatch, SyncOutcome, SyncPlan, SyncReport};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

enum FeedOutcome {
    Unchanged,
    Dispatched,
    Planned(PlannedDispatch),
}

pub struct Synchronizer<S, D> {
    source: S,
    dispatcher: D,
    fetch_timeout: Duration,
    dry_run: bool,
}

impl<S: FeedSource, D: Dispatcher> Synchronizer<S, D> {
    pub fn new(source: S, dispatcher: D) -> Self {
        Self { source, dispatcher, fetch_timeout: FETCH_TIMEOUT, dry_run: false }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Fetch and expand only: nothing is dispatched and the store is not written.
    pub fn dry_run(mut self, yes: bool) -> Self {
        self.dry_run = yes;
        self
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S { &self.source }

    #[cfg(test)]
    pub(crate) fn dispatcher(&self) -> &D { &self.dispatcher }

    pub async fn run(&self, store: &ConfigStore) -> crate::error::Result<SyncOutcome> {
        let log = telemetry::sync();
        let mut cfg = {
            let _s = log.span(&SyncPhase::Load).entered();
            store.load()?
        };
        if cfg.command_template.is_empty() && !cfg.feeds.is_empty() {
            log.warn("command template is empty; set one with `rssd set-exec`");
        }

        let mut report = SyncReport::default();
        let mut plan = SyncPlan { feeds: cfg.feeds.len(), dispatches: Vec::new() };
        let pass = self.pass(&log, &mut cfg, &mut report, &mut plan).await;

        if self.dry_run {
            return pass.map(|_| SyncOutcome::Planned(plan));
        }

        let saved = {
            let _s = log.span(&SyncPhase::Save).entered();
            store.save(&cfg)
        };
        match (pass, saved) {
            (Ok(()), Ok(())) => Ok(SyncOutcome::Applied(report)),
            (Ok(()), Err(e)) => Err(e),
            (Err(e), Ok(())) => {
                log.info_kv("💾 progress saved before abort", [("dispatched", report.dispatched.to_string())]);
                Err(e)
            }
            (Err(e), Err(save_err)) => {
                log.error(format!("could not persist progress: {save_err}"));
                Err(e)
            }
        }
    }

    async fn pass(
        &self,
        log: &LogCtx<Synchronize>,
        cfg: &mut Configuration,
        report: &mut SyncReport,
        plan: &mut SyncPlan,
    ) -> crate::error::Result<()> {
        for feed in cfg.feeds.iter_mut() {
            let span = log.span_kv(&SyncPhase::Feed, [("url", feed.url.clone())]);
            let outcome = self
                .sync_feed(log, feed, &cfg.command_template)
                .instrument(span)
                .await?;
            report.checked += 1;
            match outcome {
                FeedOutcome::Unchanged => report.unchanged += 1,
                FeedOutcome::Dispatched => report.dispatched += 1,
                FeedOutcome::Planned(p) => plan.dispatches.push(p),
            }
        }
        Ok(())
    }

    async fn sync_feed(
        &self,
        log: &LogCtx<Synchronize>,
        feed: &mut WatchedFeed,
        command_template: &str,
    ) -> crate::error::Result<FeedOutcome> {
        let doc = self
            .source
            .fetch(&feed.url, self.fetch_timeout)
            .instrument(log.span(&SyncPhase::Fetch))
            .await?;
        let Some(newest) = doc.newest() else {
            return Err(Error::Parse { url: feed.url.clone(), reason: "feed has no entries".into() });
        };
        let newest_id = newest.link.clone();

        if newest_id == feed.last_seen_id {
            log.info_kv("↩️ unchanged", [("url", feed.url.clone())]);
            return Ok(FeedOutcome::Unchanged);
        }

        let command = {
            let _s = log.span(&SyncPhase::Expand).entered();
            template::expand(command_template, &doc)
        };

        if self.dry_run {
            log.info_kv("📝 would dispatch", [("url", feed.url.clone()), ("command", command.clone())]);
            return Ok(FeedOutcome::Planned(PlannedDispatch { url: feed.url.clone(), newest: newest_id, command }));
        }

        log.info_kv("🚀 dispatch", [("url", feed.url.clone()), ("entry", newest_id.clone())]);
        self.dispatcher
            .run(&command)
            .instrument(log.span(&SyncPhase::Dispatch))
            .await?;
        feed.last_seen_id = newest_id;
        Ok(FeedOutcome::Dispatched)
    }
}

fn fetch_timeout_from_env() -> Duration {
    std::env::var("RSSD_FETCH_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(FETCH_TIMEOUT)
}

/// `rssd` with no subcommand.
pub async fn run(store: &ConfigStore, dry_run: bool) -> Result<()> {
    let log = telemetry::sync();
    let span = log.root_span_kv([
        ("config", store.path().display().to_string()),
        ("dry_run", dry_run.to_string()),
    ]);
    run_pass(&log, store, dry_run).instrument(span).await
}

async fn run_pass(log: &LogCtx<Synchronize>, store: &ConfigStore, dry_run: bool) -> Result<()> {
    let started = Instant::now();

    let sync = Synchronizer::new(HttpFeedSource::new()?, ShellDispatcher::default())
        .with_fetch_timeout(fetch_timeout_from_env())
        .dry_run(dry_run);
    match sync.run(store).await? {
        SyncOutcome::Applied(report) => {
            log.totals(report.checked, report.dispatched, report.unchanged);
            if telemetry::config::json_mode() {
                log.result_timed(&report, started)?;
            }
        }
        SyncOutcome::Planned(plan) => {
            log.info(format!("📝 Sync plan: feeds={} dispatches={}", plan.feeds, plan.dispatches.len()));
            if telemetry::config::json_mode() {
                log.plan(&plan)?;
            }
        }
    }
    Ok(())
}
