pub mod config;
pub mod error;
pub mod logging;

pub mod annotate;
pub mod assemble;
pub mod browser;
pub mod capture;
pub mod dedup;
pub mod output;
pub mod scheduler;
pub mod scope;
pub mod screener;
pub mod target;

pub use screener::{Screener, ScreenerBuilder};
