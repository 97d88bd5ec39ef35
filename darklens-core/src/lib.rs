//! DarkLens Core - link catalog model and pure scoring primitives
//!
//! This crate provides the foundational pieces the crawler builds on:
//! - The persisted `LinkRecord` and the per-crawl `Observation`
//! - Keyword vocabularies, risk classification and tag extraction
//! - Onion URL helpers (base domain keys, hidden-service checks)
//! - Multi-source record merging and trending scores
//! - The built-in seed directory registry

pub mod error;
pub mod merge;
pub mod onion;
pub mod record;
pub mod risk;
pub mod seeds;
pub mod tags;
pub mod vocabulary;

pub use error::*;
pub use merge::*;
pub use onion::*;
pub use record::*;
pub use risk::*;
pub use seeds::*;
pub use tags::*;
pub use vocabulary::*;

/// Default maximum link-following depth below a seed
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Minimum time between two crawls of the same URL, in hours
pub const COOLDOWN_HOURS: i64 = 2;

/// Trending weight of a single corroborating source, in milliseconds
pub const SOURCE_WEIGHT_MS: i64 = 1000;
