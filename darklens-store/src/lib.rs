//! DarkLens Store - persistence collaborators
//!
//! - `LinkStore`: link catalog and crawl frontier
//! - `BlobStore`: screenshot storage
//!
//! Each trait ships with an in-memory implementation and a durable one
//! (SQLite for links, a directory for blobs).

pub mod blob;
pub mod error;
pub mod link_store;
pub mod memory;
pub mod sqlite;

pub use blob::*;
pub use error::*;
pub use link_store::*;
pub use memory::*;
pub use sqlite::*;
