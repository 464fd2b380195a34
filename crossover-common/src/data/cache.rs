// =================================================================
// data/cache.rs - On-disk CSV Bar Cache
// =================================================================

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info};

use super::types::{Bar, DataResult};

const CACHE_FILE_SUFFIX: &str = "_1min.csv";
const PARTIAL_EXTENSION: &str = "csv.partial";

/// Cache file name for a symbol, e.g. `SPY_1min.csv`
pub fn cache_file_name(symbol: &str) -> String {
    format!("{}{}", symbol, CACHE_FILE_SUFFIX)
}

/// Freshness of the cache file relative to the configured max age
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Missing,
    Fresh,
    Stale { age: Duration },
}

/// CSV file holding the fetched bars of one symbol.
///
/// Without a max age any existing file counts as fresh, so its contents are
/// never re-validated against the exchange.
#[derive(Debug, Clone)]
pub struct BarCache {
    path: PathBuf,
    max_age: Option<Duration>,
}

impl BarCache {
    pub fn new(dir: impl AsRef<Path>, symbol: &str) -> Self {
        Self {
            path: dir.as_ref().join(cache_file_name(symbol)),
            max_age: None,
        }
    }

    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Scratch file `store` writes before renaming it over `path`
    fn partial_path(&self) -> PathBuf {
        self.path.with_extension(PARTIAL_EXTENSION)
    }

    pub fn status(&self) -> DataResult<CacheStatus> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(CacheStatus::Missing),
            Err(e) => return Err(e.into()),
        };

        let Some(max_age) = self.max_age else {
            return Ok(CacheStatus::Fresh);
        };

        // A modification time in the future counts as age zero
        let age = SystemTime::now()
            .duration_since(metadata.modified()?)
            .unwrap_or(Duration::ZERO);

        if age < max_age {
            Ok(CacheStatus::Fresh)
        } else {
            Ok(CacheStatus::Stale { age })
        }
    }

    /// Read every bar back in file order
    pub fn load(&self) -> DataResult<Vec<Bar>> {
        let mut reader = csv::Reader::from_reader(File::open(&self.path)?);
        let bars = reader
            .deserialize::<Bar>()
            .collect::<Result<Vec<_>, _>>()?;

        info!("Loaded {} bars from {}", bars.len(), self.path.display());
        Ok(bars)
    }

    /// Overwrite the cache file with `bars`, header row first.
    ///
    /// The cache file only ever appears complete: rows go to a scratch file
    /// in the same directory which is then renamed into place.
    pub fn store(&self, bars: &[Bar]) -> DataResult<usize> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let partial = self.partial_path();
        let mut writer = csv::Writer::from_path(&partial)?;
        for bar in bars {
            writer.serialize(bar)?;
        }
        writer.flush()?;
        drop(writer);
        fs::rename(&partial, &self.path)?;

        debug!("Wrote {} bars to {}", bars.len(), self.path.display());
        Ok(bars.len())
    }
}
