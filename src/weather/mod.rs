//! Hourly weather for one representative year: provider, cache, and fallback.

pub mod cache;
pub mod errors;
pub mod pvgis;
pub mod synthetic;

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

pub use cache::{FileCache, MemoryCache, WeatherCache};
pub use errors::WeatherError;
pub use pvgis::{OfflineSource, PvgisSource, WeatherSource};

use crate::error::SeriesError;
use crate::sim::series::HOURS_PER_YEAR;

/// Default lifetime of a cached weather year, in days.
pub const DEFAULT_CACHE_TTL_DAYS: i64 = 30;

/// Default bound on a provider request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// A geographic location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Degrees north (negative for south).
    pub latitude: f64,
    /// Degrees east (negative for west).
    pub longitude: f64,
    /// Metres above sea level, if known.
    #[serde(default)]
    pub altitude_m: Option<f64>,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude_m: None,
        }
    }

    /// Latitude and longitude in hundredths of a degree.
    ///
    /// Locations within the same 0.01° cell share weather.
    pub fn grid_cell(&self) -> (i64, i64) {
        (
            (self.latitude * 100.0).round() as i64,
            (self.longitude * 100.0).round() as i64,
        )
    }

    /// Cache key derived from the rounded coordinate.
    pub fn cache_key(&self) -> String {
        let (lat, lon) = self.grid_cell();
        format!("weather_{lat}_{lon}")
    }

    /// Whole-hour offset of local mean time from UTC.
    pub fn utc_offset_hours(&self) -> i32 {
        (self.longitude / 15.0).round() as i32
    }
}

/// One hour of canonical weather data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// Global horizontal irradiance (W/m²).
    pub ghi: f64,
    /// Direct normal irradiance (W/m²).
    pub dni: f64,
    /// Diffuse horizontal irradiance (W/m²).
    pub dhi: f64,
    /// Air temperature at 2 m (°C).
    pub temp_air: f64,
    /// Wind speed at 10 m (m/s).
    pub wind_speed: f64,
}

/// Where a weather year came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherOrigin {
    /// Fetched from an external provider (possibly via the cache).
    Provider,
    /// Generated locally because the provider was unavailable.
    Synthetic,
}

/// A full year of hourly weather for one coordinate, UTC-indexed.
///
/// Immutable once built; shared read-only through the cache as `Arc<WeatherSeries>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSeries {
    coordinate: Coordinate,
    origin: WeatherOrigin,
    records: Vec<WeatherRecord>,
}

impl WeatherSeries {
    /// Builds a series, checking it covers exactly one year.
    ///
    /// # Errors
    ///
    /// Returns a `SeriesError` if `records` is not [`HOURS_PER_YEAR`] long.
    pub fn new(
        coordinate: Coordinate,
        origin: WeatherOrigin,
        records: Vec<WeatherRecord>,
    ) -> Result<Self, SeriesError> {
        if records.len() != HOURS_PER_YEAR {
            return Err(SeriesError {
                expected: HOURS_PER_YEAR,
                actual: records.len(),
            });
        }
        Ok(Self::from_parts(coordinate, origin, records))
    }

    /// Builds a series whose length the caller already guarantees.
    pub(crate) fn from_parts(
        coordinate: Coordinate,
        origin: WeatherOrigin,
        records: Vec<WeatherRecord>,
    ) -> Self {
        debug_assert_eq!(records.len(), HOURS_PER_YEAR);
        Self {
            coordinate,
            origin,
            records,
        }
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    pub fn origin(&self) -> WeatherOrigin {
        self.origin
    }

    pub fn records(&self) -> &[WeatherRecord] {
        &self.records
    }

    /// Annual global horizontal irradiation in kWh/m².
    pub fn annual_ghi_kwh_m2(&self) -> f64 {
        self.records.iter().map(|r| r.ghi).sum::<f64>() / 1000.0
    }
}

/// Obtains weather years: cache first, then the external source, then synthetic.
///
/// The cache and the source are injected, so every caller decides what store
/// and which service to use. Two concurrent misses for the same cell may both
/// fetch; the later write wins, which is harmless because the data is the same.
#[derive(Debug)]
pub struct WeatherProvider<C, S> {
    cache: C,
    source: S,
    ttl: TimeDelta,
}

impl<C: WeatherCache, S: WeatherSource> WeatherProvider<C, S> {
    pub fn new(cache: C, source: S) -> Self {
        Self {
            cache,
            source,
            ttl: TimeDelta::days(DEFAULT_CACHE_TTL_DAYS),
        }
    }

    /// Overrides the cache time-to-live.
    pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns a year of weather for `coordinate`. Never fails.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub fn get_weather(&self, coordinate: &Coordinate) -> Arc<WeatherSeries> {
        let key = coordinate.cache_key();
        if let Some(series) = self.cache.get(&key) {
            debug!(key = %key, "weather cache hit");
            return series;
        }

        match self.fetch(coordinate) {
            Ok(series) => {
                let series = Arc::new(series);
                self.cache.set(&key, Arc::clone(&series), self.ttl);
                info!(
                    key = %key,
                    annual_ghi_kwh_m2 = series.annual_ghi_kwh_m2(),
                    "fetched weather year"
                );
                series
            }
            Err(e) => {
                warn!(key = %key, error = %e, "weather source failed, using synthetic year");
                Arc::new(synthetic::synthetic_year(coordinate))
            }
        }
    }

    fn fetch(&self, coordinate: &Coordinate) -> Result<WeatherSeries, WeatherError> {
        let records = self.source.fetch(coordinate)?;
        Ok(WeatherSeries::new(
            *coordinate,
            WeatherOrigin::Provider,
            records,
        )?)
    }
}
