//! DarkLens Runtime
//!
//! Drives the crawl:
//! - `Harvester` feeds the frontier from directory sources
//! - `FrontierManager` loads active seeds
//! - `CrawlSession` walks each seed depth-first behind the domain breaker
//!   and cool-down guard, merging every page into the link store
//! - `Crawler` repeats sessions forever, surviving any single failure

pub mod breaker;
pub mod config;
pub mod cooldown;
pub mod crawler;
pub mod error;
pub mod frontier;
pub mod harvest;
pub mod outcome;
pub mod session;

pub use breaker::*;
pub use config::*;
pub use cooldown::*;
pub use crawler::*;
pub use error::*;
pub use frontier::*;
pub use harvest::*;
pub use outcome::*;
pub use session::*;
