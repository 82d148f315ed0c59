pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

pub fn sync() -> LogCtx<ops::sync::Synchronize> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn feed() -> LogCtx<ops::feed::Feed> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn exec() -> LogCtx<ops::exec::Exec> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
