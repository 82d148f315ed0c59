pub mod sync;
pub mod feed;
pub mod exec;
