//! Built-in seed directory registry
//!
//! Well-known link directories used to bootstrap an empty frontier.

use serde::Serialize;

/// A link directory usable as a crawl seed
#[derive(Debug, Clone, Serialize)]
pub struct SeedDirectory {
    /// Seed URL
    pub url: &'static str,
    /// Human-readable description
    pub description: &'static str,
}

/// Default seed directories
pub static DEFAULT_SEEDS: &[SeedDirectory] = &[
    SeedDirectory {
        url: "http://zqktlwiuavvvqqt4ybvgvi7tyo4hjl5xgfuvpdf6otjiycgwqbym2qad.onion/wiki/index.php/Main_Page",
        description: "The Hidden Wiki (v3 mirror)",
    },
    SeedDirectory {
        url: "http://torlinksge6enmcyyuxjpjkoouw4oorgdgeo7ftnq3zodj7g2zxi3kyd.onion/",
        description: "TorLinks (Hidden Wiki alternative)",
    },
    SeedDirectory {
        url: "http://jaz45aabn5vkemy4jkg4mi4syheisqn2wn2n4fsuitpccdackjwxplad.onion/",
        description: "OnionLinks (Hidden Wiki mirror)",
    },
];
