//! Investment cost estimate from tiered unit prices.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One price band: applies to systems up to `up_to` units (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CostTier {
    /// Upper size bound of the band (kWp or kWh); `None` for the open top band.
    pub up_to: Option<f64>,
    /// Price per unit in EUR.
    pub eur_per_unit: f64,
}

/// Installed-cost table keyed by system size.
///
/// The whole system is priced at the unit rate of the band its size falls
/// into, so larger systems are cheaper per kWp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostTable {
    /// PV bands in EUR/kWp, ascending by `up_to`.
    pub pv_tiers: Vec<CostTier>,
    /// Battery bands in EUR/kWh, ascending by `up_to`.
    pub battery_tiers: Vec<CostTier>,
    /// Planning, grid connection and commissioning (EUR).
    pub fixed_eur: f64,
    /// Extra fixed cost when a battery is installed (EUR).
    pub battery_fixed_eur: f64,
}

impl Default for CostTable {
    fn default() -> Self {
        let tier = |up_to: Option<f64>, eur_per_unit: f64| CostTier { up_to, eur_per_unit };
        Self {
            pv_tiers: vec![
                tier(Some(10.0), 1600.0),
                tier(Some(30.0), 1350.0),
                tier(Some(100.0), 1150.0),
                tier(None, 1000.0),
            ],
            battery_tiers: vec![
                tier(Some(10.0), 900.0),
                tier(Some(30.0), 750.0),
                tier(Some(100.0), 650.0),
                tier(None, 550.0),
            ],
            fixed_eur: 2500.0,
            battery_fixed_eur: 1000.0,
        }
    }
}

fn unit_price(tiers: &[CostTier], size: f64) -> f64 {
    tiers
        .iter()
        .find(|t| t.up_to.is_none_or(|limit| size <= limit))
        .or_else(|| tiers.last())
        .map_or(0.0, |t| t.eur_per_unit)
}

impl CostTable {
    /// Total up-front cost of a PV system with an optional battery.
    pub fn investment(&self, pv_peak_kw: f64, battery_capacity_kwh: f64) -> f64 {
        let pv = pv_peak_kw * unit_price(&self.pv_tiers, pv_peak_kw);
        let battery = if battery_capacity_kwh > 0.0 {
            battery_capacity_kwh * unit_price(&self.battery_tiers, battery_capacity_kwh)
                + self.battery_fixed_eur
        } else {
            0.0
        };
        self.fixed_eur + pv + battery
    }

    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        for (name, tiers) in [("costs.pv_tiers", &self.pv_tiers), ("costs.battery_tiers", &self.battery_tiers)] {
            if tiers.is_empty() {
                errors.push(ConfigError::new(name, "must contain at least one tier"));
            }
            if tiers.iter().any(|t| !t.eur_per_unit.is_finite() || t.eur_per_unit < 0.0) {
                errors.push(ConfigError::new(name, "unit prices must be >= 0"));
            }
            let bounds: Vec<f64> = tiers.iter().filter_map(|t| t.up_to).collect();
            if bounds.windows(2).any(|w| w[0] >= w[1]) {
                errors.push(ConfigError::new(name, "tiers must be in ascending order"));
            }
        }
        for (name, v) in [("costs.fixed_eur", self.fixed_eur), ("costs.battery_fixed_eur", self.battery_fixed_eur)] {
            if !v.is_finite() || v < 0.0 {
                errors.push(ConfigError::new(name, "must be >= 0"));
            }
        }
        errors
    }
}
