//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;

pub use crate::error::ConfigError;

use crate::devices::{LoadPatterns, LoadProfileType, PvModelParams};
use crate::sim::Simulator;
use crate::sim::costs::CostTable;
use crate::sim::types::{BatterySpec, FinancialParameters, SimulationRequest, SystemConfiguration};
use crate::weather::{
    Coordinate, DEFAULT_CACHE_TTL_DAYS, DEFAULT_FETCH_TIMEOUT, FileCache, MemoryCache,
    OfflineSource, PvgisSource, WeatherCache, WeatherProvider, WeatherSource,
};

/// Simulator wired from a scenario, with cache and source chosen at runtime.
pub type ScenarioSimulator = Simulator<Box<dyn WeatherCache>, Box<dyn WeatherSource>>;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the `office` preset except the
/// battery, which is absent unless configured. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::from_preset`] for a built-in quote.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Site coordinates.
    #[serde(default)]
    pub location: LocationConfig,
    /// PV array size and orientation.
    #[serde(default)]
    pub pv: PvConfig,
    /// PV model constants.
    #[serde(default)]
    pub pv_model: PvModelParams,
    /// Battery storage; zero capacity for PV only.
    #[serde(default)]
    pub battery: BatterySpec,
    /// Site consumption.
    #[serde(default)]
    pub load: LoadConfig,
    /// Energy prices.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Investment appraisal assumptions.
    #[serde(default)]
    pub finance: FinanceConfig,
    /// Weather source and cache.
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Installed-cost table.
    #[serde(default)]
    pub costs: CostTable,
    /// Load shape per archetype.
    #[serde(default)]
    pub load_patterns: LoadPatterns,
}

/// Site coordinates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationConfig {
    /// Degrees north.
    pub latitude: f64,
    /// Degrees east.
    pub longitude: f64,
    /// Metres above sea level.
    pub altitude_m: Option<f64>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        // Frankfurt am Main.
        Self {
            latitude: 50.11,
            longitude: 8.68,
            altitude_m: None,
        }
    }
}

/// PV array size and orientation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvConfig {
    /// Peak power (kWp).
    pub peak_kw: f64,
    /// Tilt from horizontal (degrees).
    pub tilt_deg: f64,
    /// Azimuth clockwise from north (degrees, 180 = south).
    pub azimuth_deg: f64,
}

impl Default for PvConfig {
    fn default() -> Self {
        Self {
            peak_kw: 30.0,
            tilt_deg: 30.0,
            azimuth_deg: 180.0,
        }
    }
}

/// Site consumption.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Building archetype.
    pub profile: LoadProfileType,
    /// Annual consumption (kWh).
    pub annual_consumption_kwh: f64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            profile: LoadProfileType::Office,
            annual_consumption_kwh: 50_000.0,
        }
    }
}

/// Energy prices.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Grid electricity price (EUR/kWh).
    pub electricity_price_eur_kwh: f64,
    /// Feed-in remuneration (EUR/kWh).
    pub feed_in_tariff_eur_kwh: f64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            electricity_price_eur_kwh: 0.30,
            feed_in_tariff_eur_kwh: 0.08,
        }
    }
}

/// Investment appraisal assumptions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinanceConfig {
    /// Annual discount rate (fraction).
    pub discount_rate: f64,
    /// Project lifetime (years).
    pub project_lifetime_years: u32,
    /// Annual yield degradation (fraction).
    pub degradation_rate: f64,
    /// Fixed investment (EUR); priced from `[costs]` when absent.
    pub investment_eur: Option<f64>,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        let defaults = FinancialParameters::with_tariffs(0.0, 0.0);
        Self {
            discount_rate: defaults.discount_rate,
            project_lifetime_years: defaults.project_lifetime_years,
            degradation_rate: defaults.degradation_rate,
            investment_eur: None,
        }
    }
}

/// Weather source and cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    /// Never contact the provider; always use synthetic weather.
    pub offline: bool,
    /// Directory for the persistent cache; in-memory only when absent.
    pub cache_dir: Option<PathBuf>,
    /// Cache entry lifetime (days).
    pub cache_ttl_days: i64,
    /// Provider request timeout (seconds).
    pub timeout_secs: u64,
    /// Alternative provider endpoint.
    pub base_url: Option<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            offline: false,
            cache_dir: None,
            cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
            timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            base_url: None,
        }
    }
}

/// Longest accepted cache lifetime (days).
pub const MAX_CACHE_TTL_DAYS: i64 = 3650;

impl WeatherConfig {
    pub fn ttl(&self) -> TimeDelta {
        TimeDelta::try_days(self.cache_ttl_days).unwrap_or(TimeDelta::MAX)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ScenarioConfig {
    /// 30 kWp office in Frankfurt with a 20 kWh / 10 kW battery.
    pub fn office() -> Self {
        Self {
            battery: BatterySpec {
                capacity_kwh: 20.0,
                power_kw: Some(10.0),
                ..BatterySpec::default()
            },
            ..Self::default()
        }
    }

    /// 60 kWp supermarket roof in Munich, flat-ish array, 2-hour battery.
    pub fn retail() -> Self {
        Self {
            location: LocationConfig {
                latitude: 48.14,
                longitude: 11.58,
                altitude_m: Some(520.0),
            },
            pv: PvConfig {
                peak_kw: 60.0,
                tilt_deg: 15.0,
                ..PvConfig::default()
            },
            battery: BatterySpec {
                capacity_kwh: 30.0,
                ..BatterySpec::default()
            },
            load: LoadConfig {
                profile: LoadProfileType::Retail,
                annual_consumption_kwh: 120_000.0,
            },
            tariff: TariffConfig {
                electricity_price_eur_kwh: 0.28,
                feed_in_tariff_eur_kwh: 0.07,
            },
            ..Self::default()
        }
    }

    /// 250 kWp two-shift production hall in Stuttgart with a 200 kWh battery.
    pub fn production() -> Self {
        Self {
            location: LocationConfig {
                latitude: 48.78,
                longitude: 9.18,
                altitude_m: None,
            },
            pv: PvConfig {
                peak_kw: 250.0,
                tilt_deg: 10.0,
                ..PvConfig::default()
            },
            battery: BatterySpec {
                capacity_kwh: 200.0,
                power_kw: Some(100.0),
                ..BatterySpec::default()
            },
            load: LoadConfig {
                profile: LoadProfileType::Production,
                annual_consumption_kwh: 600_000.0,
            },
            tariff: TariffConfig {
                electricity_price_eur_kwh: 0.22,
                feed_in_tariff_eur_kwh: 0.06,
            },
            finance: FinanceConfig {
                discount_rate: 0.05,
                project_lifetime_years: 25,
                ..FinanceConfig::default()
            },
            ..Self::default()
        }
    }

    /// 150 kWp logistics warehouse in Hamburg without storage.
    pub fn warehouse_no_battery() -> Self {
        Self {
            location: LocationConfig {
                latitude: 53.55,
                longitude: 9.99,
                altitude_m: None,
            },
            pv: PvConfig {
                peak_kw: 150.0,
                tilt_deg: 10.0,
                ..PvConfig::default()
            },
            battery: BatterySpec::default(),
            load: LoadConfig {
                profile: LoadProfileType::Warehouse,
                annual_consumption_kwh: 90_000.0,
            },
            tariff: TariffConfig {
                electricity_price_eur_kwh: 0.27,
                feed_in_tariff_eur_kwh: 0.07,
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["office", "retail", "production", "warehouse_no_battery"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "office" => Ok(Self::office()),
            "retail" => Ok(Self::retail()),
            "production" => Ok(Self::production()),
            "warehouse_no_battery" => Ok(Self::warehouse_no_battery()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// The simulation input described by this scenario.
    pub fn to_request(&self) -> SimulationRequest {
        SimulationRequest {
            system: SystemConfiguration {
                location: Coordinate {
                    latitude: self.location.latitude,
                    longitude: self.location.longitude,
                    altitude_m: self.location.altitude_m,
                },
                pv_peak_kw: self.pv.peak_kw,
                tilt_deg: self.pv.tilt_deg,
                azimuth_deg: self.pv.azimuth_deg,
                battery: self.battery.clone(),
                load_profile_type: self.load.profile,
                annual_consumption_kwh: self.load.annual_consumption_kwh,
            },
            finance: FinancialParameters {
                electricity_price_eur_kwh: self.tariff.electricity_price_eur_kwh,
                feed_in_tariff_eur_kwh: self.tariff.feed_in_tariff_eur_kwh,
                discount_rate: self.finance.discount_rate,
                project_lifetime_years: self.finance.project_lifetime_years,
                degradation_rate: self.finance.degradation_rate,
                investment_eur: self.finance.investment_eur,
            },
        }
    }

    /// Builds a simulator with this scenario's weather, cost and model settings.
    pub fn build_simulator(&self) -> ScenarioSimulator {
        let w = &self.weather;
        let cache: Box<dyn WeatherCache> = match &w.cache_dir {
            Some(dir) => Box::new(FileCache::new(dir)),
            None => Box::new(MemoryCache::new()),
        };
        let source: Box<dyn WeatherSource> = if w.offline {
            Box::new(OfflineSource)
        } else {
            let pvgis = PvgisSource::with_timeout(w.timeout());
            match &w.base_url {
                Some(url) => Box::new(pvgis.with_base_url(url.as_str())),
                None => Box::new(pvgis),
            }
        };

        Simulator::new(WeatherProvider::new(cache, source).with_ttl(w.ttl()))
            .with_costs(self.costs.clone())
            .with_load_patterns(self.load_patterns.clone())
            .with_pv_params(self.pv_model)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.to_request().validate();
        errors.extend(self.costs.validate());
        errors.extend(self.load_patterns.validate());

        let m = &self.pv_model;
        for (field, value, ok) in [
            ("pv_model.inverter_efficiency", m.inverter_efficiency, m.inverter_efficiency > 0.0 && m.inverter_efficiency <= 1.0),
            ("pv_model.system_losses", m.system_losses, (0.0..1.0).contains(&m.system_losses)),
            ("pv_model.albedo", m.albedo, (0.0..=1.0).contains(&m.albedo)),
            ("pv_model.faiman_u0", m.faiman_u0, m.faiman_u0 > 0.0),
            ("pv_model.faiman_u1", m.faiman_u1, m.faiman_u1 >= 0.0),
            ("pv_model.module_efficiency", m.module_efficiency, m.module_efficiency > 0.0 && m.module_efficiency <= 1.0),
            ("pv_model.performance_ratio", m.performance_ratio, m.performance_ratio > 0.0 && m.performance_ratio <= 1.0),
            ("pv_model.temp_coefficient", m.temp_coefficient, m.temp_coefficient > -0.05 && m.temp_coefficient <= 0.0),
        ] {
            if !value.is_finite() || !ok {
                errors.push(ConfigError::new(field, "out of range"));
            }
        }

        let w = &self.weather;
        if !(1..=MAX_CACHE_TTL_DAYS).contains(&w.cache_ttl_days) {
            errors.push(ConfigError::new(
                "weather.cache_ttl_days",
                format!("must be in [1, {MAX_CACHE_TTL_DAYS}]"),
            ));
        }
        if w.timeout_secs == 0 {
            errors.push(ConfigError::new("weather.timeout_secs", "must be > 0"));
        }

        errors
    }
}
