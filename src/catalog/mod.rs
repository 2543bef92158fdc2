//! Product / news catalog.
//!
//! [`Catalog`] owns the two [`RecordCache`]s and the [`RecordSource`] that
//! fills them.  It is created once by `main`, shared read-only with every
//! channel session through an `Arc`, and refreshed in the background by
//! [`spawn_refresh_loop`].
//!
//! A failed or unconfigured fetch never empties a list that was already
//! loaded; it is logged and the previous snapshot stays in place.

pub mod cache;
pub mod records;
pub mod sheets;

use std::sync::Arc;
use std::time::Duration;

pub use cache::RecordCache;
pub use records::{News, Product};
pub use sheets::{CatalogError, RecordSource, SheetsSource};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Cached products and news plus their source.
pub struct Catalog {
    products: RecordCache<Product>,
    news: RecordCache<News>,
    source: Arc<dyn RecordSource>,
}

impl Catalog {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            products: RecordCache::new(),
            news: RecordCache::new(),
            source,
        }
    }

    /// Current product snapshot (empty before the first refresh).
    pub fn products(&self) -> Arc<Vec<Product>> {
        self.products.read()
    }

    /// Current news snapshot (empty before the first refresh).
    pub fn news(&self) -> Arc<Vec<News>> {
        self.news.read()
    }

    /// Re-fetch both lists.  Errors are logged; the previous list is kept.
    pub async fn refresh(&self) {
        match self.source.fetch_products().await {
            Ok(products) => {
                log::info!("catalog: loaded {} products", products.len());
                self.products.replace(products);
            }
            Err(CatalogError::NotConfigured) => {
                log::warn!("catalog: GOOGLE_SHEETS_ID is not set; product list stays empty");
            }
            Err(e) => log::error!("catalog: product refresh failed: {e}"),
        }

        match self.source.fetch_news().await {
            Ok(news) => {
                log::info!("catalog: loaded {} news items", news.len());
                self.news.replace(news);
            }
            Err(CatalogError::NotConfigured) => {
                log::warn!("catalog: GOOGLE_SHEETS_ID is not set; news list stays empty");
            }
            Err(e) => log::error!("catalog: news refresh failed: {e}"),
        }
    }
}

/// Refresh `catalog` now and then every `interval`.
///
/// A zero `interval` performs only the initial refresh.
pub fn spawn_refresh_loop(catalog: Arc<Catalog>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        catalog.refresh().await;
        log::info!("catalog: initial data fetch (books & news) complete");
        if interval.is_zero() {
            return;
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // first tick completes immediately
        loop {
            ticker.tick().await;
            catalog.refresh().await;
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
