use thiserror::Error;

use crate::error::SeriesError;

/// Failure to obtain or store weather data.
///
/// Never returned from [`super::WeatherProvider::get_weather`]; the provider
/// logs it and falls back to synthetic weather.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather source unavailable: {0}")]
    Unavailable(String),

    #[error("weather request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("malformed weather response: {0}")]
    Malformed(String),

    #[error("weather series has wrong length: {0}")]
    Series(#[from] SeriesError),

    #[error("weather cache i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("weather cache serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
