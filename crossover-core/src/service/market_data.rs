use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{DataOrigin, LoadedBars, ServiceError};
use crate::config::Settings;
use crate::exchange::{BarParams, MarketDataProvider};
use crossover_common::data::{BarCache, CacheStatus};

/// Market data service that coordinates between the exchange and the bar cache
pub struct MarketDataService {
    /// Exchange implementation
    provider: Arc<dyn MarketDataProvider>,
    /// Cache file for the requested symbol
    cache: BarCache,
}

impl MarketDataService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: BarCache) -> Self {
        Self { provider, cache }
    }

    /// Service whose cache file lives under `settings.cache.dir`
    pub fn from_settings(provider: Arc<dyn MarketDataProvider>, settings: &Settings, symbol: &str) -> Self {
        let cache = BarCache::new(&settings.cache.dir, symbol).with_max_age(settings.cache.max_age());
        Self::new(provider, cache)
    }

    pub fn cache(&self) -> &BarCache {
        &self.cache
    }

    /// Load bars from the cache when it is usable, otherwise fetch and store.
    ///
    /// `refresh` skips the cache lookup entirely.
    pub async fn load_bars(&self, params: &BarParams, refresh: bool) -> Result<LoadedBars, ServiceError> {
        if refresh {
            info!("Refresh requested, ignoring {}", self.cache.path().display());
            return self.refresh(params).await;
        }

        match self.cache.status()? {
            CacheStatus::Fresh => {
                info!("Loading historical data from local file...");
                if self.cache.max_age().is_none() {
                    warn!(
                        "Using {} without a max age; delete it or pass --refresh to re-fetch",
                        self.cache.path().display()
                    );
                }

                let bars = self.cache.load()?;
                if !bars.is_empty() {
                    return Ok(LoadedBars {
                        symbol: params.symbol.clone(),
                        bars,
                        origin: DataOrigin::Cache,
                    });
                }
                warn!("Cache file {} holds no bars", self.cache.path().display());
            }
            CacheStatus::Stale { age } => {
                warn!(
                    "Cache file {} is stale ({}s old)",
                    self.cache.path().display(),
                    age.as_secs()
                );
            }
            CacheStatus::Missing => {
                debug!("No cache file at {}", self.cache.path().display());
            }
        }

        self.refresh(params).await
    }

    /// Fetch from the exchange and overwrite the cache
    pub async fn refresh(&self, params: &BarParams) -> Result<LoadedBars, ServiceError> {
        info!(
            "Fetching historical data for {} from {} to {}...",
            params.symbol, params.start, params.end
        );

        let bars = self.provider.get_bars(params).await?;
        if bars.is_empty() {
            return Err(ServiceError::Validation(format!(
                "No bars returned for {} between {} and {}",
                params.symbol, params.start, params.end
            )));
        }

        let written = self.cache.store(&bars)?;
        info!("Saved {} bars to {}", written, self.cache.path().display());

        Ok(LoadedBars {
            symbol: params.symbol.clone(),
            bars,
            origin: DataOrigin::Exchange,
        })
    }
}
