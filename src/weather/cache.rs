//! Weather cache stores with time-to-live.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::WeatherSeries;
use super::errors::WeatherError;

/// A key/value store for weather years with per-entry expiry.
///
/// Implementations must be safe to share between concurrent simulations.
/// Writes are last-writer-wins; a failing store behaves like an empty one.
pub trait WeatherCache: Send + Sync {
    /// Returns the entry for `key` unless it is missing or expired.
    fn get(&self, key: &str) -> Option<Arc<WeatherSeries>>;

    /// Stores `series` under `key` for `ttl`.
    fn set(&self, key: &str, series: Arc<WeatherSeries>, ttl: TimeDelta);
}

impl<T: WeatherCache + ?Sized> WeatherCache for Box<T> {
    fn get(&self, key: &str) -> Option<Arc<WeatherSeries>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, series: Arc<WeatherSeries>, ttl: TimeDelta) {
        (**self).set(key, series, ttl);
    }
}

/// Expiry instant for an entry written now, saturating instead of overflowing.
fn expiry(ttl: TimeDelta) -> DateTime<Utc> {
    Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(if ttl < TimeDelta::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

#[derive(Debug)]
struct Entry {
    series: Arc<WeatherSeries>,
    expires_at: DateTime<Utc>,
}

/// In-process cache. Cheap to share behind `&` across threads.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl WeatherCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Arc<WeatherSeries>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        (Utc::now() < entry.expires_at).then(|| Arc::clone(&entry.series))
    }

    fn set(&self, key: &str, series: Arc<WeatherSeries>, ttl: TimeDelta) {
        let expires_at = expiry(ttl);
        self.entries
            .write()
            .insert(key.to_string(), Entry { series, expires_at });
    }
}

#[derive(Serialize)]
struct CachedRef<'a> {
    expires_at: DateTime<Utc>,
    series: &'a WeatherSeries,
}

#[derive(Deserialize)]
struct Cached {
    expires_at: DateTime<Utc>,
    series: WeatherSeries,
}

/// Cache directory holding one JSON document per key.
///
/// Survives process restarts, so repeated quotes for the same site skip the
/// provider for the whole TTL.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn read(&self, key: &str) -> Result<Option<Cached>, WeatherError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, series: &WeatherSeries, ttl: TimeDelta) -> Result<(), WeatherError> {
        fs::create_dir_all(&self.dir)?;
        let doc = CachedRef {
            expires_at: expiry(ttl),
            series,
        };
        let json = serde_json::to_vec(&doc)?;

        // Write then rename so readers never see a half-written file.
        let tmp = self.dir.join(format!("{key}.json.tmp-{}", std::process::id()));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.path_for(key))?;
        Ok(())
    }
}

impl WeatherCache for FileCache {
    fn get(&self, key: &str) -> Option<Arc<WeatherSeries>> {
        match self.read(key) {
            Ok(Some(cached)) if Utc::now() < cached.expires_at => Some(Arc::new(cached.series)),
            Ok(Some(_)) => {
                debug!(key, "cached weather expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "unreadable weather cache entry");
                None
            }
        }
    }

    fn set(&self, key: &str, series: Arc<WeatherSeries>, ttl: TimeDelta) {
        if let Err(e) = self.write(key, &series, ttl) {
            warn!(key, error = %e, "failed to write weather cache entry");
        }
    }
}
