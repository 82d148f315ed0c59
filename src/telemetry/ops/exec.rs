use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Exec;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Set }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self { Phase::Set => "set" } }
    fn span(&self) -> Span { match self { Phase::Set => info_span!("set") } }
}

impl OpMarker for Exec {
    const NAME: &'static str = "exec";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("exec") }
}
