//! DarkLens Tor Layer
//!
//! Provides the page fetching capability the crawler drives:
//! - SOCKS5h proxy client (DNS resolution via Tor)
//! - `PageFetcher` contract and the HTTP-over-Tor implementation
//! - HTML extraction of title, visible text and onion links
//! - Error page detection

pub mod fetcher;
pub mod html;
pub mod proxy;
pub mod validate;

pub use fetcher::*;
pub use html::*;
pub use proxy::*;
pub use validate::*;
