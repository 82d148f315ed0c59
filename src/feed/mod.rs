use anyhow::Result;
use url::Url;

use crate::config::{ConfigStore, Configuration, WatchedFeed};
use crate::error::Error;
use crate::telemetry::{self};
use crate::telemetry::ops::feed::Phase as FeedPhase;

pub mod types;

pub fn add_feed(store: &ConfigStore, url: String) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span_kv([("url", url.clone())]).entered();
    let _s = log.span(&FeedPhase::Add).entered();

    let mut cfg = store.load()?;
    push_feed(&mut cfg, &url)?;
    store.save(&cfg)?;

    log.info_kv("➕ Feed added", [("url", url.clone()), ("watched", cfg.feeds.len().to_string())]);
    if telemetry::config::json_mode() {
        log.result(&types::FeedAddResult { url, watched: cfg.feeds.len() })?;
    }
    Ok(())
}

fn push_feed(cfg: &mut Configuration, url: &str) -> Result<(), Error> {
    // friendly error before touching the store
    if Url::parse(url).is_err() {
        return Err(Error::InvalidUrl(url.to_string()));
    }
    if cfg.contains(url) {
        return Err(Error::DuplicateFeed(url.to_string()));
    }
    cfg.feeds.push(WatchedFeed::new(url));
    Ok(())
}

pub fn ls_feeds(store: &ConfigStore) -> Result<()> {
    let log = telemetry::feed();
    let _g = log.root_span().entered();
    let _s = log.span(&FeedPhase::List).entered();

    let cfg = store.load()?;
    if telemetry::config::json_mode() {
        let feeds = cfg
            .feeds
            .iter()
            .map(|f| types::FeedRow { url: f.url.clone(), last: f.last_seen_id.clone() })
            .collect();
        log.result(&types::FeedList { command_template: cfg.command_template, feeds })?;
    } else {
        print!("{}", render_table(&cfg.feeds));
    }
    Ok(())
}

fn render_table(feeds: &[WatchedFeed]) -> String {
    let w_url = feeds.iter().map(|f| f.url.chars().count()).max().unwrap_or(0).max("FEED".len());
    let w_last = feeds.iter().map(|f| f.last_seen_id.chars().count()).max().unwrap_or(0).max("LAST".len());

    let mut out = String::new();
    let rule = format!("+-{}-+-{}-+\n", "-".repeat(w_url), "-".repeat(w_last));
    out.push_str(&rule);
    out.push_str(&format!("| {:<w_url$} | {:<w_last$} |\n", "FEED", "LAST"));
    out.push_str(&rule);
    for f in feeds {
        out.push_str(&format!("| {:<w_url$} | {:<w_last$} |\n", f.url, f.last_seen_id));
    }
    if !feeds.is_empty() {
        out.push_str(&rule);
    }
    out
}
