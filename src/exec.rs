use anyhow::Result;
use serde::Serialize;

use crate::config::ConfigStore;
use crate::telemetry::{self};
use crate::telemetry::ops::exec::Phase as ExecPhase;
use crate::template::PLACEHOLDERS;

#[derive(Serialize)]
struct ExecSetResult {
    command_template: String,
    placeholders: Vec<&'static str>,
}

pub fn set_exec(store: &ConfigStore, command_template: String) -> Result<()> {
    let log = telemetry::exec();
    let _g = log.root_span_kv([("template", command_template.clone())]).entered();
    let _s = log.span(&ExecPhase::Set).entered();

    let mut cfg = store.load()?;
    cfg.command_template = command_template;
    store.save(&cfg)?;

    let used = placeholders_in(&cfg.command_template);
    log.info_kv("✅ Command template set", [("placeholders", used.join(","))]);
    if telemetry::config::json_mode() {
        log.result(&ExecSetResult { command_template: cfg.command_template, placeholders: used })?;
    }
    Ok(())
}

fn placeholders_in(template: &str) -> Vec<&'static str> {
    // no token occurs inside another, so contains() is exact
    PLACEHOLDERS.iter().copied().filter(|p| template.contains(p)).collect()
}
