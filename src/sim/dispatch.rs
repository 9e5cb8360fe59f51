//! Hour-by-hour self-consumption dispatch of PV, battery and grid.

use tracing::debug;

use super::series::{HOURS_PER_YEAR, HourlySeries};
use super::types::{BatterySpec, HourRecord};
use crate::devices::Battery;
use crate::sim::calendar::hour_stamps;

/// Per-hour energy flows of one dispatched year (all kWh per hour).
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    /// Battery energy after each hour (kWh).
    pub soc: HourlySeries,
    /// Surplus taken by the battery (before charging losses).
    pub charge: HourlySeries,
    /// Energy delivered by the battery (after discharging losses).
    pub discharge: HourlySeries,
    pub grid_import: HourlySeries,
    pub grid_export: HourlySeries,
    /// Load served on site, directly from PV or from the battery.
    pub self_consumption: HourlySeries,
    /// Hours with strictly positive charging.
    pub charging_hours: u32,
    /// Hours with strictly positive discharging.
    pub discharging_hours: u32,
}

impl DispatchResult {
    /// Zips the flows with `pv` and `load` into per-hour records.
    pub fn hour_records(&self, pv: &HourlySeries, load: &HourlySeries) -> Vec<HourRecord> {
        hour_stamps()
            .enumerate()
            .map(|(h, stamp)| HourRecord {
                hour: h,
                month: stamp.month(),
                pv_kw: pv[h],
                load_kw: load[h],
                self_consumption_kw: self.self_consumption[h],
                battery_charge_kw: self.charge[h],
                battery_discharge_kw: self.discharge[h],
                grid_import_kw: self.grid_import[h],
                grid_export_kw: self.grid_export[h],
                soc_kwh: self.soc[h],
            })
            .collect()
    }
}

/// Runs the self-consumption-maximising policy over one year.
///
/// Each hour PV first serves the load directly. A surplus charges the battery
/// as far as power, headroom and losses allow and the rest is exported. A
/// deficit is covered from the battery as far as power and stored energy allow
/// and the rest is imported. The battery never charges from the grid and never
/// discharges into it, so import and export are never both positive.
///
/// # Arguments
///
/// * `pv` - PV generation on local time (kW)
/// * `load` - Site demand on local time (kW)
/// * `battery` - Validated battery spec; zero capacity or power disables it
pub fn dispatch(pv: &HourlySeries, load: &HourlySeries, battery: &BatterySpec) -> DispatchResult {
    let mut bat = Battery::new(battery);
    let mut out = DispatchResult {
        soc: HourlySeries::zeros(),
        charge: HourlySeries::zeros(),
        discharge: HourlySeries::zeros(),
        grid_import: HourlySeries::zeros(),
        grid_export: HourlySeries::zeros(),
        self_consumption: HourlySeries::zeros(),
        charging_hours: 0,
        discharging_hours: 0,
    };

    for h in 0..HOURS_PER_YEAR {
        let (gen_kw, demand_kw) = (pv[h], load[h]);
        let direct = gen_kw.min(demand_kw);
        let surplus = (gen_kw - demand_kw).max(0.0);
        let deficit = (demand_kw - gen_kw).max(0.0);

        let charged = bat.charge(surplus);
        let discharged = bat.discharge(deficit);

        if charged > 0.0 {
            out.charging_hours += 1;
        }
        if discharged > 0.0 {
            out.discharging_hours += 1;
        }

        out.charge[h] = charged;
        out.discharge[h] = discharged;
        out.grid_export[h] = surplus - charged;
        out.grid_import[h] = deficit - discharged;
        out.self_consumption[h] = direct + discharged;
        out.soc[h] = bat.soc_kwh();
    }

    debug!(
        charging_hours = out.charging_hours,
        discharging_hours = out.discharging_hours,
        "dispatch complete"
    );
    out
}
