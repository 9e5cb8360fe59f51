use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::devices::sun::{SunPosition, plane_of_array, sun_position};
use crate::error::SeriesError;
use crate::sim::series::HourlySeries;
use crate::weather::{WeatherRecord, WeatherSeries};

/// Fixed-mount PV array geometry and rating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PvArray {
    /// DC peak power in kWp.
    pub peak_kw: f64,
    /// Panel tilt from horizontal in degrees (0 = flat).
    pub tilt_deg: f64,
    /// Panel azimuth in degrees clockwise from north (180 = south).
    pub azimuth_deg: f64,
}

/// Physical constants of the PV chain.
///
/// Defaults describe a typical crystalline-silicon rooftop system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvModelParams {
    /// Relative power change per kelvin above 25 °C.
    pub temp_coefficient: f64,
    pub inverter_efficiency: f64,
    /// Wiring, soiling and mismatch losses as a fraction.
    pub system_losses: f64,
    /// Ground reflectance.
    pub albedo: f64,
    /// Faiman constant heat transfer (W/m²K).
    pub faiman_u0: f64,
    /// Faiman convective heat transfer (W/m²K per m/s).
    pub faiman_u1: f64,
    /// Relative module derating used by the proportional fallback.
    pub module_efficiency: f64,
    /// Performance ratio used by the proportional fallback.
    pub performance_ratio: f64,
}

impl Default for PvModelParams {
    fn default() -> Self {
        Self {
            temp_coefficient: -0.004,
            inverter_efficiency: 0.96,
            system_losses: 0.14,
            albedo: 0.2,
            faiman_u0: 25.0,
            faiman_u1: 6.84,
            module_efficiency: 0.97,
            performance_ratio: 0.85,
        }
    }
}

/// Why the detailed model could not be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("non-finite weather input at hour {hour}")]
    NonFiniteInput { hour: usize },

    #[error("non-finite power output at hour {hour}")]
    NonFiniteOutput { hour: usize },

    #[error(transparent)]
    Shape(#[from] SeriesError),
}

/// Hourly AC output in kW, tagged with the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum PvOutput {
    /// Detailed irradiance-transposition model.
    Primary(HourlySeries),
    /// Proportional GHI model, used because the detailed one failed.
    Fallback {
        series: HourlySeries,
        reason: ModelError,
    },
}

impl PvOutput {
    pub fn series(&self) -> &HourlySeries {
        match self {
            Self::Primary(series) | Self::Fallback { series, .. } => series,
        }
    }

    pub fn into_series(self) -> HourlySeries {
        match self {
            Self::Primary(series) | Self::Fallback { series, .. } => series,
        }
    }

    /// Short label for reports: `"detailed"` or `"proportional"`.
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::Primary(_) => "detailed",
            Self::Fallback { .. } => "proportional",
        }
    }
}

/// Converts weather into PV power for a given array.
#[derive(Debug, Clone, Default)]
pub struct PvOutputModel {
    pub params: PvModelParams,
}

impl PvOutputModel {
    pub fn new(params: PvModelParams) -> Self {
        Self { params }
    }

    /// Produces the hourly AC series on the weather's (UTC) index.
    ///
    /// Tries the detailed model first and falls back to the proportional one
    /// if any input or output is non-finite. Never fails.
    pub fn generate(&self, weather: &WeatherSeries, array: &PvArray) -> PvOutput {
        match self.detailed(weather, array) {
            Ok(series) => PvOutput::Primary(series),
            Err(reason) => {
                warn!(error = %reason, "detailed PV model failed, using proportional model");
                PvOutput::Fallback {
                    series: self.proportional(weather, array),
                    reason,
                }
            }
        }
    }

    /// Detailed model over the full year.
    ///
    /// # Errors
    ///
    /// Returns the first hour whose weather or resulting power is not finite.
    pub fn detailed(
        &self,
        weather: &WeatherSeries,
        array: &PvArray,
    ) -> Result<HourlySeries, ModelError> {
        let coord = weather.coordinate();
        let mut values = Vec::with_capacity(weather.records().len());
        for (hour, record) in weather.records().iter().enumerate() {
            if !is_finite_record(record) {
                return Err(ModelError::NonFiniteInput { hour });
            }
            let sun = sun_position(coord.latitude, coord.longitude, hour);
            let power = self.ac_power(record, &sun, array);
            if !power.is_finite() {
                return Err(ModelError::NonFiniteOutput { hour });
            }
            values.push(power.clamp(0.0, array.peak_kw));
        }
        Ok(HourlySeries::new(values)?)
    }

    /// AC power in kW for one hour, before clamping to the array rating.
    pub fn ac_power(&self, record: &WeatherRecord, sun: &SunPosition, array: &PvArray) -> f64 {
        if !sun.is_up() || record.ghi <= 0.0 {
            return 0.0;
        }
        let p = &self.params;
        let poa = plane_of_array(
            record.ghi,
            record.dni,
            record.dhi,
            sun,
            array.tilt_deg,
            array.azimuth_deg,
            p.albedo,
        );
        let cell_temp = record.temp_air + poa / (p.faiman_u0 + p.faiman_u1 * record.wind_speed);
        let dc = array.peak_kw * poa / 1000.0 * (1.0 + p.temp_coefficient * (cell_temp - 25.0));
        dc * (1.0 - p.system_losses) * p.inverter_efficiency
    }

    /// Proportional model: output follows GHI linearly. Non-finite hours yield 0.
    pub fn proportional(&self, weather: &WeatherSeries, array: &PvArray) -> HourlySeries {
        let p = &self.params;
        let factor = p.module_efficiency * p.performance_ratio * array.peak_kw / 1000.0;
        let records = weather.records();
        HourlySeries::from_fn(|h| {
            let ghi = records.get(h).map_or(0.0, |r| r.ghi);
            let power = ghi * factor;
            if power.is_finite() {
                power.clamp(0.0, array.peak_kw)
            } else {
                0.0
            }
        })
    }
}

fn is_finite_record(r: &WeatherRecord) -> bool {
    [r.ghi, r.dni, r.dhi, r.temp_air, r.wind_speed]
        .iter()
        .all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::series::HOURS_PER_YEAR;
    use crate::weather::{Coordinate, WeatherOrigin, synthetic::synthetic_year};

    fn array(peak_kw: f64) -> PvArray {
        PvArray {
            peak_kw,
            tilt_deg: 30.0,
            azimuth_deg: 180.0,
        }
    }

    fn noon_sun() -> SunPosition {
        SunPosition {
            elevation_deg: 55.0,
            azimuth_deg: 180.0,
        }
    }

    fn record(ghi: f64, temp_air: f64) -> WeatherRecord {
        WeatherRecord {
            ghi,
            dni: ghi * 0.7,
            dhi: ghi * 0.3,
            temp_air,
            wind_speed: 2.0,
        }
    }

    #[test]
    fn zero_irradiance_gives_zero_power() {
        let model = PvOutputModel::default();
        assert_eq!(model.ac_power(&record(0.0, 20.0), &noon_sun(), &array(10.0)), 0.0);
    }

    #[test]
    fn power_increases_with_irradiance() {
        let model = PvOutputModel::default();
        let mut last = 0.0;
        for ghi in [100.0, 300.0, 500.0, 700.0, 900.0] {
            let p = model.ac_power(&record(ghi, 20.0), &noon_sun(), &array(10.0));
            assert!(p > last, "{p} should exceed {last}");
            last = p;
        }
    }

    #[test]
    fn power_decreases_with_temperature() {
        let model = PvOutputModel::default();
        let cold = model.ac_power(&record(600.0, 0.0), &noon_sun(), &array(10.0));
        let hot = model.ac_power(&record(600.0, 35.0), &noon_sun(), &array(10.0));
        assert!(cold > hot);
    }

    #[test]
    fn annual_output_is_bounded_by_rating() {
        let weather = synthetic_year(&Coordinate::new(50.11, 8.68));
        let out = PvOutputModel::default().generate(&weather, &array(30.0));
        assert!(matches!(out, PvOutput::Primary(_)));
        assert_eq!(out.model_name(), "detailed");
        let series = out.series();
        assert!(series.iter().all(|&p| (0.0..=30.0).contains(&p)));
        let yield_kwh_kwp = series.sum() / 30.0;
        assert!((800.0..1200.0).contains(&yield_kwh_kwp), "yield {yield_kwh_kwp}");
    }

    #[test]
    fn non_finite_weather_falls_back() {
        let mut records = vec![record(0.0, 10.0); HOURS_PER_YEAR];
        records[12] = record(500.0, 10.0);
        records[100].temp_air = f64::NAN;
        let weather =
            WeatherSeries::new(Coordinate::new(50.0, 8.0), WeatherOrigin::Provider, records)
                .expect("full year");

        let out = PvOutputModel::default().generate(&weather, &array(10.0));
        match &out {
            PvOutput::Fallback { series, reason } => {
                assert_eq!(*reason, ModelError::NonFiniteInput { hour: 100 });
                let expected = 500.0 * 0.97 * 0.85 * 10.0 / 1000.0;
                assert!((series[12] - expected).abs() < 1e-9);
                assert!(series.iter().all(|v| v.is_finite()));
            }
            PvOutput::Primary(_) => panic!("expected fallback"),
        }
    }

    #[test]
    fn proportional_output_is_clamped_to_peak() {
        let records = vec![record(50_000.0, 10.0); HOURS_PER_YEAR];
        let weather =
            WeatherSeries::new(Coordinate::new(0.0, 0.0), WeatherOrigin::Provider, records)
                .expect("full year");
        let series = PvOutputModel::default().proportional(&weather, &array(5.0));
        assert!(series.iter().all(|&p| p <= 5.0));
    }
}
