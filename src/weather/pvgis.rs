//! External weather sources.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, instrument};
use ureq::Agent;

use super::errors::WeatherError;
use super::{Coordinate, DEFAULT_FETCH_TIMEOUT, WeatherRecord};
use crate::sim::series::HOURS_PER_YEAR;

/// Public endpoint of the PVGIS typical-meteorological-year service.
pub const PVGIS_TMY_URL: &str = "https://re.jrc.ec.europa.eu/api/v5_2/tmy";

/// A service that can produce one year of hourly weather for a coordinate.
pub trait WeatherSource: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    /// Fetches [`HOURS_PER_YEAR`] UTC-indexed records for `coordinate`.
    ///
    /// # Errors
    ///
    /// Any transport, decoding or shape problem. Callers fall back to
    /// synthetic weather rather than propagating it.
    fn fetch(&self, coordinate: &Coordinate) -> Result<Vec<WeatherRecord>, WeatherError>;
}

impl<T: WeatherSource + ?Sized> WeatherSource for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn fetch(&self, coordinate: &Coordinate) -> Result<Vec<WeatherRecord>, WeatherError> {
        (**self).fetch(coordinate)
    }
}

/// PVGIS TMY client.
pub struct PvgisSource {
    client: Agent,
    base_url: String,
}

impl PvgisSource {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Client whose every request is bounded by `timeout` end to end.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Agent::config_builder().timeout_global(Some(timeout)).build().into();
        Self {
            client,
            base_url: PVGIS_TMY_URL.to_string(),
        }
    }

    /// Points the client at a different endpoint (mirror or test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for PvgisSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherSource for PvgisSource {
    fn name(&self) -> &'static str {
        "pvgis"
    }

    #[instrument(skip_all, fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    fn fetch(&self, coordinate: &Coordinate) -> Result<Vec<WeatherRecord>, WeatherError> {
        info!("Fetching TMY…");
        let response = self
            .client
            .get(&self.base_url)
            .query("lat", coordinate.latitude.to_string())
            .query("lon", coordinate.longitude.to_string())
            .query("outputformat", "json")
            .call()?
            .body_mut()
            .read_json::<TmyResponse>()?;
        response.into_records()
    }
}

/// Source used when the network must not be touched.
///
/// Every fetch fails, so the provider always serves the synthetic year.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl WeatherSource for OfflineSource {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn fetch(&self, _coordinate: &Coordinate) -> Result<Vec<WeatherRecord>, WeatherError> {
        Err(WeatherError::Unavailable("offline mode".to_string()))
    }
}

#[derive(Deserialize)]
struct TmyResponse {
    outputs: TmyOutputs,
}

#[derive(Deserialize)]
struct TmyOutputs {
    tmy_hourly: Vec<TmyHour>,
}

#[derive(Deserialize)]
struct TmyHour {
    #[serde(rename = "G(h)")]
    ghi: f64,

    #[serde(rename = "Gb(n)")]
    dni: f64,

    #[serde(rename = "Gd(h)")]
    dhi: f64,

    #[serde(rename = "T2m")]
    temp_air: f64,

    #[serde(rename = "WS10m")]
    wind_speed: f64,
}

impl TmyResponse {
    fn into_records(self) -> Result<Vec<WeatherRecord>, WeatherError> {
        let rows = self.outputs.tmy_hourly;
        if rows.len() != HOURS_PER_YEAR {
            return Err(WeatherError::Malformed(format!(
                "expected {HOURS_PER_YEAR} hourly rows, got {}",
                rows.len()
            )));
        }
        Ok(rows
            .into_iter()
            .map(|row| WeatherRecord {
                ghi: row.ghi,
                dni: row.dni,
                dhi: row.dhi,
                temp_air: row.temp_air,
                wind_speed: row.wind_speed,
            })
            .collect())
    }
}

/// Decodes a PVGIS TMY JSON document into canonical records.
///
/// # Errors
///
/// Returns `Json` if the document does not match the TMY schema and
/// `Malformed` if it does not hold exactly one year of rows.
pub fn parse_tmy_json(body: &str) -> Result<Vec<WeatherRecord>, WeatherError> {
    serde_json::from_str::<TmyResponse>(body)?.into_records()
}
