//! Core simulation types: system and financial inputs, per-hour records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::devices::{LoadProfileType, PvArray};
use crate::error::ConfigError;
use crate::weather::Coordinate;

/// Battery sizing and operating window.
///
/// # Examples
///
/// ```
/// use pv_quote_sim::sim::types::BatterySpec;
///
/// let spec = BatterySpec { capacity_kwh: 20.0, ..BatterySpec::default() };
/// assert_eq!(spec.effective_power_kw(), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatterySpec {
    /// Nameplate capacity in kWh; 0 means no battery.
    pub capacity_kwh: f64,
    /// Charge/discharge limit in kW; half the capacity when unset.
    pub power_kw: Option<f64>,
    /// Energy out over energy in for a full cycle (0..=1).
    pub round_trip_efficiency: f64,
    /// Lowest allowed state of charge as a fraction of capacity.
    pub min_soc: f64,
    /// Highest allowed state of charge as a fraction of capacity.
    pub max_soc: f64,
    /// State of charge at hour 0 as a fraction of capacity.
    pub initial_soc: f64,
}

impl Default for BatterySpec {
    fn default() -> Self {
        Self {
            capacity_kwh: 0.0,
            power_kw: None,
            round_trip_efficiency: 0.9,
            min_soc: 0.1,
            max_soc: 0.9,
            initial_soc: 0.5,
        }
    }
}

impl BatterySpec {
    /// Power rating, defaulting to a 2-hour battery.
    pub fn effective_power_kw(&self) -> f64 {
        self.power_kw.unwrap_or(0.5 * self.capacity_kwh)
    }

    pub fn has_storage(&self) -> bool {
        self.capacity_kwh > 0.0 && self.effective_power_kw() > 0.0
    }
}

/// The installation being quoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfiguration {
    pub location: Coordinate,
    /// PV peak power in kWp.
    pub pv_peak_kw: f64,
    /// Panel tilt in degrees (0 = flat, 90 = vertical).
    pub tilt_deg: f64,
    /// Panel azimuth in degrees clockwise from north (180 = south).
    pub azimuth_deg: f64,
    #[serde(default)]
    pub battery: BatterySpec,
    pub load_profile_type: LoadProfileType,
    /// Annual site consumption in kWh.
    pub annual_consumption_kwh: f64,
}

impl SystemConfiguration {
    pub fn pv_array(&self) -> PvArray {
        PvArray {
            peak_kw: self.pv_peak_kw,
            tilt_deg: self.tilt_deg,
            azimuth_deg: self.azimuth_deg,
        }
    }
}

/// Tariffs and investment assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialParameters {
    /// Retail price paid for grid electricity (EUR/kWh).
    pub electricity_price_eur_kwh: f64,
    /// Remuneration for exported energy (EUR/kWh).
    pub feed_in_tariff_eur_kwh: f64,
    /// Annual discount rate as a fraction.
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,
    #[serde(default = "default_lifetime")]
    pub project_lifetime_years: u32,
    /// Annual yield degradation as a fraction.
    #[serde(default = "default_degradation_rate")]
    pub degradation_rate: f64,
    /// Fixed investment; derived from the cost table when unset.
    #[serde(default)]
    pub investment_eur: Option<f64>,
}

fn default_discount_rate() -> f64 {
    0.03
}

fn default_lifetime() -> u32 {
    20
}

fn default_degradation_rate() -> f64 {
    0.005
}

impl FinancialParameters {
    /// Parameters with the given tariffs and default economics.
    pub fn with_tariffs(electricity_price_eur_kwh: f64, feed_in_tariff_eur_kwh: f64) -> Self {
        Self {
            electricity_price_eur_kwh,
            feed_in_tariff_eur_kwh,
            discount_rate: default_discount_rate(),
            project_lifetime_years: default_lifetime(),
            degradation_rate: default_degradation_rate(),
            investment_eur: None,
        }
    }
}

/// Everything one simulation call needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub system: SystemConfiguration,
    pub finance: FinancialParameters,
}

impl SimulationRequest {
    /// Checks every input constraint and returns all violations.
    ///
    /// An empty vector means the request can be simulated. Field names use
    /// the scenario-file paths so errors point at the offending TOML key.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut v = Validator::default();
        let s = &self.system;
        let b = &s.battery;
        let f = &self.finance;

        v.check("location.latitude", in_range(s.location.latitude, -90.0, 90.0), "must be in [-90, 90]");
        v.check("location.longitude", in_range(s.location.longitude, -180.0, 180.0), "must be in [-180, 180]");
        if let Some(alt) = s.location.altitude_m {
            v.check("location.altitude_m", alt.is_finite(), "must be finite");
        }

        v.check("pv.peak_kw", s.pv_peak_kw.is_finite() && s.pv_peak_kw > 0.0, "must be > 0");
        v.check("pv.tilt_deg", in_range(s.tilt_deg, 0.0, 90.0), "must be in [0, 90]");
        v.check("pv.azimuth_deg", in_range(s.azimuth_deg, 0.0, 360.0), "must be in [0, 360]");

        v.check("battery.capacity_kwh", non_negative(b.capacity_kwh), "must be >= 0");
        if let Some(p) = b.power_kw {
            v.check("battery.power_kw", non_negative(p), "must be >= 0");
        }
        v.check(
            "battery.round_trip_efficiency",
            b.round_trip_efficiency.is_finite()
                && b.round_trip_efficiency > 0.0
                && b.round_trip_efficiency <= 1.0,
            "must be in (0, 1]",
        );
        let window_ok = in_range(b.min_soc, 0.0, 1.0) && in_range(b.max_soc, 0.0, 1.0) && b.min_soc < b.max_soc;
        v.check("battery.min_soc", window_ok, "must satisfy 0 <= min_soc < max_soc <= 1");
        v.check(
            "battery.initial_soc",
            in_range(b.initial_soc, b.min_soc, b.max_soc),
            "must lie within [min_soc, max_soc]",
        );

        v.check("load.annual_consumption_kwh", non_negative(s.annual_consumption_kwh), "must be >= 0");

        v.check("tariff.electricity_price_eur_kwh", non_negative(f.electricity_price_eur_kwh), "must be >= 0");
        v.check("tariff.feed_in_tariff_eur_kwh", non_negative(f.feed_in_tariff_eur_kwh), "must be >= 0");

        v.check("finance.discount_rate", in_half_open(f.discount_rate), "must be in [0, 1)");
        v.check("finance.degradation_rate", in_half_open(f.degradation_rate), "must be in [0, 1)");
        v.check(
            "finance.project_lifetime_years",
            (1..=100).contains(&f.project_lifetime_years),
            "must be in [1, 100]",
        );
        if let Some(i) = f.investment_eur {
            v.check("finance.investment_eur", non_negative(i), "must be >= 0");
        }

        v.errors
    }
}

#[derive(Default)]
struct Validator {
    errors: Vec<ConfigError>,
}

impl Validator {
    fn check(&mut self, field: &str, ok: bool, message: &str) {
        if !ok {
            self.errors.push(ConfigError::new(field, message));
        }
    }
}

fn in_range(value: f64, lo: f64, hi: f64) -> bool {
    value.is_finite() && (lo..=hi).contains(&value)
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn in_half_open(value: f64) -> bool {
    value.is_finite() && (0.0..1.0).contains(&value)
}

/// Complete energy record of one simulated hour (kW over one hour = kWh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourRecord {
    /// Hour index in the representative year.
    pub hour: usize,
    /// Calendar month, 1 to 12.
    pub month: u32,
    pub pv_kw: f64,
    pub load_kw: f64,
    pub self_consumption_kw: f64,
    pub battery_charge_kw: f64,
    pub battery_discharge_kw: f64,
    pub grid_import_kw: f64,
    pub grid_export_kw: f64,
    /// Battery energy after this hour (kWh).
    pub soc_kwh: f64,
}

impl fmt::Display for HourRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={:>4} (m{:>2}) | pv={:>7.2} load={:>7.2} self={:>7.2} | \
             chg={:>6.2} dis={:>6.2} soc={:>7.2} | imp={:>7.2} exp={:>7.2}",
            self.hour,
            self.month,
            self.pv_kw,
            self.load_kw,
            self.self_consumption_kw,
            self.battery_charge_kw,
            self.battery_discharge_kw,
            self.soc_kwh,
            self.grid_import_kw,
            self.grid_export_kw,
        )
    }
}
