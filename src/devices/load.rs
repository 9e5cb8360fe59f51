use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::calendar::hour_stamps;
use crate::sim::series::{HOURS_PER_YEAR, HourlySeries};

/// Commercial building archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadProfileType {
    Office,
    Retail,
    Production,
    Warehouse,
}

impl LoadProfileType {
    pub const ALL: [Self; 4] = [Self::Office, Self::Retail, Self::Production, Self::Warehouse];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Office => "office",
            Self::Retail => "retail",
            Self::Production => "production",
            Self::Warehouse => "warehouse",
        }
    }
}

impl fmt::Display for LoadProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadProfileType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ConfigError::new(
                    "load.profile",
                    format!("unknown profile '{s}' (expected office, retail, production or warehouse)"),
                )
            })
    }
}

/// Relative shape of one archetype's demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadPattern {
    /// Relative demand for each hour of a working day (local time).
    pub weekday: [f64; 24],
    /// Saturday demand relative to a weekday.
    pub saturday_factor: f64,
    /// Sunday demand relative to a weekday.
    pub sunday_factor: f64,
    /// Winter peak above the annual mean, as a fraction.
    pub seasonal_amplitude: f64,
}

impl LoadPattern {
    /// Unscaled demand for one hour.
    fn shape(&self, hour: u32, weekday: Weekday, day_of_year: u32) -> f64 {
        let day_factor = match weekday {
            Weekday::Sat => self.saturday_factor,
            Weekday::Sun => self.sunday_factor,
            _ => 1.0,
        };
        let seasonal = 1.0
            + self.seasonal_amplitude * (2.0 * PI * (f64::from(day_of_year) - 15.0) / 365.0).cos();
        self.weekday[hour as usize] * day_factor * seasonal
    }

    /// Checks the pattern can produce a non-negative, non-degenerate profile.
    pub fn validate(&self, field: &str) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.weekday.iter().any(|v| !v.is_finite() || *v < 0.0) {
            errors.push(ConfigError::new(
                format!("{field}.weekday"),
                "values must be finite and >= 0",
            ));
        } else if self.weekday.iter().sum::<f64>() <= 0.0 {
            errors.push(ConfigError::new(
                format!("{field}.weekday"),
                "at least one value must be > 0",
            ));
        }
        for (name, value) in [
            ("saturday_factor", self.saturday_factor),
            ("sunday_factor", self.sunday_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::new(format!("{field}.{name}"), "must be >= 0"));
            }
        }
        if !(0.0..1.0).contains(&self.seasonal_amplitude) {
            errors.push(ConfigError::new(
                format!("{field}.seasonal_amplitude"),
                "must be in [0, 1)",
            ));
        }
        errors
    }
}

/// Pattern table for every archetype. Overridable from scenario files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadPatterns {
    pub office: LoadPattern,
    pub retail: LoadPattern,
    pub production: LoadPattern,
    pub warehouse: LoadPattern,
}

impl LoadPatterns {
    pub fn pattern(&self, kind: LoadProfileType) -> &LoadPattern {
        match kind {
            LoadProfileType::Office => &self.office,
            LoadProfileType::Retail => &self.retail,
            LoadProfileType::Production => &self.production,
            LoadProfileType::Warehouse => &self.warehouse,
        }
    }

    pub fn validate(&self) -> Vec<ConfigError> {
        LoadProfileType::ALL
            .into_iter()
            .flat_map(|kind| {
                self.pattern(kind)
                    .validate(&format!("load_patterns.{kind}"))
            })
            .collect()
    }
}

impl Default for LoadPatterns {
    fn default() -> Self {
        Self {
            // Office hours with a lunch dip and standby overnight.
            office: LoadPattern {
                weekday: [
                    0.30, 0.28, 0.28, 0.28, 0.30, 0.35, 0.55, 0.80, 0.95, 1.00, 1.00, 1.00, //
                    0.95, 1.00, 1.00, 0.95, 0.85, 0.70, 0.50, 0.40, 0.35, 0.32, 0.30, 0.30,
                ],
                saturday_factor: 0.40,
                sunday_factor: 0.30,
                seasonal_amplitude: 0.15,
            },
            // Shop open 9-20 with refrigeration at night.
            retail: LoadPattern {
                weekday: [
                    0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.30, 0.45, 0.70, 0.90, 1.00, 1.00, //
                    1.00, 1.00, 1.00, 1.00, 1.00, 1.00, 0.95, 0.85, 0.60, 0.35, 0.28, 0.25,
                ],
                saturday_factor: 0.95,
                sunday_factor: 0.35,
                seasonal_amplitude: 0.10,
            },
            // Two shifts, 06-22.
            production: LoadPattern {
                weekday: [
                    0.35, 0.35, 0.35, 0.35, 0.35, 0.35, 0.85, 0.95, 1.00, 1.00, 1.00, 1.00, //
                    0.95, 1.00, 1.00, 1.00, 1.00, 1.00, 0.95, 0.90, 0.85, 0.80, 0.40, 0.35,
                ],
                saturday_factor: 0.60,
                sunday_factor: 0.35,
                seasonal_amplitude: 0.05,
            },
            // Lighting and heating dominate; strong winter peak.
            warehouse: LoadPattern {
                weekday: [
                    0.40, 0.40, 0.40, 0.40, 0.40, 0.40, 0.60, 0.85, 0.95, 1.00, 1.00, 1.00, //
                    0.95, 1.00, 1.00, 1.00, 0.95, 0.85, 0.60, 0.45, 0.40, 0.40, 0.40, 0.40,
                ],
                saturday_factor: 0.50,
                sunday_factor: 0.30,
                seasonal_amplitude: 0.25,
            },
        }
    }
}

/// Builds hourly consumption series from an annual total and an archetype.
#[derive(Debug, Clone, Default)]
pub struct LoadProfileGenerator {
    patterns: LoadPatterns,
}

impl LoadProfileGenerator {
    pub fn new(patterns: LoadPatterns) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &LoadPatterns {
        &self.patterns
    }

    /// Hourly demand in kW on local time, summing exactly to `annual_kwh`.
    ///
    /// # Arguments
    ///
    /// * `annual_kwh` - Annual consumption (>= 0)
    /// * `kind` - Building archetype selecting the pattern
    pub fn generate(&self, annual_kwh: f64, kind: LoadProfileType) -> HourlySeries {
        let pattern = self.patterns.pattern(kind);
        let shape: Vec<f64> = hour_stamps()
            .map(|s| pattern.shape(s.hour, s.weekday(), s.day_of_year()))
            .collect();
        let total: f64 = shape.iter().sum();

        // Rescale last so the annual total is exact whatever the shape factors.
        if total > 0.0 && total.is_finite() {
            let k = annual_kwh / total;
            HourlySeries::from_fn(|h| shape[h] * k)
        } else {
            HourlySeries::from_fn(|_| annual_kwh / HOURS_PER_YEAR as f64)
        }
    }
}
