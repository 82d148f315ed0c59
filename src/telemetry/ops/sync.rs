use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Synchronize;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Load, Feed, Fetch, Expand, Dispatch, Save }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Load => "load",
        Phase::Feed => "feed",
        Phase::Fetch => "fetch",
        Phase::Expand => "expand",
        Phase::Dispatch => "dispatch",
        Phase::Save => "save",
    }}
    fn span(&self) -> Span { match self {
        Phase::Load => info_span!("load"),
        Phase::Feed => info_span!("feed"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Expand => info_span!("expand"),
        Phase::Dispatch => info_span!("dispatch"),
        Phase::Save => info_span!("save"),
    }}
}

impl OpMarker for Synchronize {
    const NAME: &'static str = "sync";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("sync") }
}
