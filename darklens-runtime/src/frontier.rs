//! Frontier manager
//!
//! Loads the active seed URLs that start each crawl cycle.

use std::sync::Arc;
use tracing::{debug, error, warn};

use darklens_store::{FrontierOrder, LinkStore, StoreError};

/// Reads the active frontier, newest first
#[derive(Clone)]
pub struct FrontierManager {
    store: Arc<dyn LinkStore>,
}

impl FrontierManager {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }

    /// Active seed URLs; empty when the store cannot be read
    pub async fn load_frontier(&self) -> Vec<String> {
        let seeds = match self.store.list_active_frontier(FrontierOrder::CreatedAtDesc).await {
            Ok(seeds) => seeds,
            Err(StoreError::MissingOrderKey(column)) => {
                warn!("Frontier has no '{}' column, ordering by id", column);
                match self.store.list_active_frontier(FrontierOrder::IdDesc).await {
                    Ok(seeds) => seeds,
                    Err(e) => {
                        error!("Failed to load frontier: {}", e);
                        Vec::new()
                    }
                }
            }
            Err(e) => {
                error!("Failed to load frontier: {}", e);
                Vec::new()
            }
        };

        debug!("Loaded {} active seeds", seeds.len());
        seeds
    }
}
