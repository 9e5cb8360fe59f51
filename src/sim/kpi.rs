//! Post-hoc aggregation of a dispatched year into totals, ratios and monthly rollups.

use serde::Serialize;

use super::calendar::month_indices;
use super::dispatch::DispatchResult;
use super::series::HourlySeries;

/// Annual energy totals of one simulated year.
///
/// Computed post-hoc from the hourly series so the reported totals always
/// agree with the exported hour-level data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyBalanceResult {
    pub pv_generation_kwh: f64,
    pub consumption_kwh: f64,
    pub self_consumption_kwh: f64,
    pub grid_import_kwh: f64,
    pub grid_export_kwh: f64,
    pub battery_charge_kwh: f64,
    pub battery_discharge_kwh: f64,
    pub battery_charging_hours: u32,
    pub battery_discharging_hours: u32,
}

impl EnergyBalanceResult {
    /// Sums the dispatched flows over the year.
    pub fn from_dispatch(pv: &HourlySeries, load: &HourlySeries, flows: &DispatchResult) -> Self {
        Self {
            pv_generation_kwh: pv.sum(),
            consumption_kwh: load.sum(),
            self_consumption_kwh: flows.self_consumption.sum(),
            grid_import_kwh: flows.grid_import.sum(),
            grid_export_kwh: flows.grid_export.sum(),
            battery_charge_kwh: flows.charge.sum(),
            battery_discharge_kwh: flows.discharge.sum(),
            battery_charging_hours: flows.charging_hours,
            battery_discharging_hours: flows.discharging_hours,
        }
    }

    /// Share of consumption not drawn from the grid, in percent.
    pub fn autonomy_percent(&self) -> f64 {
        autonomy(self.consumption_kwh, self.grid_import_kwh)
    }

    /// Share of PV generation used on site, in percent.
    pub fn self_consumption_ratio_percent(&self) -> f64 {
        if self.pv_generation_kwh > 0.0 {
            (100.0 * (self.pv_generation_kwh - self.grid_export_kwh) / self.pv_generation_kwh)
                .clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Annual PV generation relative to consumption, in percent. May exceed 100.
    pub fn pv_coverage_percent(&self) -> f64 {
        if self.consumption_kwh > 0.0 {
            100.0 * self.pv_generation_kwh / self.consumption_kwh
        } else {
            0.0
        }
    }

    /// Equivalent full cycles: throughput / (2 × capacity).
    pub fn battery_cycles(&self, capacity_kwh: f64) -> f64 {
        if capacity_kwh > 0.0 {
            (self.battery_charge_kwh + self.battery_discharge_kwh) / (2.0 * capacity_kwh)
        } else {
            0.0
        }
    }
}

fn autonomy(consumption: f64, import: f64) -> f64 {
    if consumption > 0.0 {
        (100.0 * (consumption - import) / consumption).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Energy flows of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// Calendar month, 1 to 12.
    pub month: u32,
    pub pv_generation_kwh: f64,
    pub consumption_kwh: f64,
    pub self_consumption_kwh: f64,
    pub grid_import_kwh: f64,
    pub grid_export_kwh: f64,
    pub autonomy_percent: f64,
}

impl MonthlySummary {
    /// Copy rounded for presentation (energy 1 dp, percent 1 dp).
    pub fn rounded(&self) -> Self {
        Self {
            month: self.month,
            pv_generation_kwh: round_to(self.pv_generation_kwh, 1),
            consumption_kwh: round_to(self.consumption_kwh, 1),
            self_consumption_kwh: round_to(self.self_consumption_kwh, 1),
            grid_import_kwh: round_to(self.grid_import_kwh, 1),
            grid_export_kwh: round_to(self.grid_export_kwh, 1),
            autonomy_percent: round_to(self.autonomy_percent, 1),
        }
    }
}

/// Calendar-month sums of the hourly flows.
///
/// # Returns
///
/// Twelve entries, January first. Autonomy is 0 for a month without load.
pub fn monthly_summary(
    pv: &HourlySeries,
    load: &HourlySeries,
    grid_import: &HourlySeries,
    grid_export: &HourlySeries,
    self_consumption: &HourlySeries,
) -> Vec<MonthlySummary> {
    let mut sums = [[0.0_f64; 5]; 12];
    for (h, m) in month_indices().into_iter().enumerate() {
        sums[m][0] += pv[h];
        sums[m][1] += load[h];
        sums[m][2] += self_consumption[h];
        sums[m][3] += grid_import[h];
        sums[m][4] += grid_export[h];
    }

    sums.iter()
        .zip(1..)
        .map(|(s, month)| MonthlySummary {
            month,
            pv_generation_kwh: s[0],
            consumption_kwh: s[1],
            self_consumption_kwh: s[2],
            grid_import_kwh: s[3],
            grid_export_kwh: s[4],
            autonomy_percent: autonomy(s[1], s[3]),
        })
        .collect()
}

/// Totals and monthly rollup of one dispatched year.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub balance: EnergyBalanceResult,
    pub monthly: Vec<MonthlySummary>,
}

/// Aggregates a dispatched year.
pub fn summarize(pv: &HourlySeries, load: &HourlySeries, flows: &DispatchResult) -> Summary {
    Summary {
        balance: EnergyBalanceResult::from_dispatch(pv, load, flows),
        monthly: monthly_summary(
            pv,
            load,
            &flows.grid_import,
            &flows.grid_export,
            &flows.self_consumption,
        ),
    }
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::dispatch::dispatch;
    use crate::sim::types::BatterySpec;
    use approx::assert_relative_eq;

    fn balance(pv: f64, load: f64, import: f64, export: f64) -> EnergyBalanceResult {
        EnergyBalanceResult {
            pv_generation_kwh: pv,
            consumption_kwh: load,
            self_consumption_kwh: load - import,
            grid_import_kwh: import,
            grid_export_kwh: export,
            battery_charge_kwh: 0.0,
            battery_discharge_kwh: 0.0,
            battery_charging_hours: 0,
            battery_discharging_hours: 0,
        }
    }

    #[test]
    fn ratios_from_totals() {
        let b = balance(30_000.0, 50_000.0, 26_000.0, 6_000.0);
        assert_relative_eq!(b.autonomy_percent(), 48.0);
        assert_relative_eq!(b.self_consumption_ratio_percent(), 80.0);
        assert_relative_eq!(b.pv_coverage_percent(), 60.0);
    }

    #[test]
    fn ratios_are_zero_without_denominator() {
        let b = balance(0.0, 0.0, 0.0, 0.0);
        assert_eq!(b.autonomy_percent(), 0.0);
        assert_eq!(b.self_consumption_ratio_percent(), 0.0);
        assert_eq!(b.pv_coverage_percent(), 0.0);
        assert_eq!(b.battery_cycles(0.0), 0.0);
    }

    #[test]
    fn cycles_count_throughput() {
        let mut b = balance(1.0, 1.0, 0.0, 0.0);
        b.battery_charge_kwh = 1000.0;
        b.battery_discharge_kwh = 800.0;
        assert_relative_eq!(b.battery_cycles(20.0), 45.0);
    }

    #[test]
    fn monthly_rollup_adds_up_to_year() {
        let pv = HourlySeries::from_fn(|h| if (h % 24) < 12 { 10.0 } else { 0.0 });
        let load = HourlySeries::from_fn(|_| 4.0);
        let spec = BatterySpec {
            capacity_kwh: 20.0,
            ..BatterySpec::default()
        };
        let flows = dispatch(&pv, &load, &spec);
        let summary = summarize(&pv, &load, &flows);

        assert_eq!(summary.monthly.len(), 12);
        assert_eq!(summary.monthly[0].month, 1);
        assert_eq!(summary.monthly[11].month, 12);
        let pv_total: f64 = summary.monthly.iter().map(|m| m.pv_generation_kwh).sum();
        let import_total: f64 = summary.monthly.iter().map(|m| m.grid_import_kwh).sum();
        assert_relative_eq!(pv_total, summary.balance.pv_generation_kwh, max_relative = 1e-12);
        assert_relative_eq!(import_total, summary.balance.grid_import_kwh, max_relative = 1e-12);
        // January has 31 days of 24 h at 4 kW.
        assert_relative_eq!(summary.monthly[0].consumption_kwh, 31.0 * 96.0, max_relative = 1e-12);
    }

    #[test]
    fn monthly_autonomy_is_bounded() {
        let pv = HourlySeries::from_fn(|h| (h % 24) as f64);
        let load = HourlySeries::from_fn(|_| 5.0);
        let flows = dispatch(&pv, &load, &BatterySpec::default());
        for m in summarize(&pv, &load, &flows).monthly {
            assert!((0.0..=100.0).contains(&m.autonomy_percent));
        }
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(12.345, 1), 12.3);
        assert_eq!(round_to(12.35, 0), 12.0);
        assert_eq!(round_to(0.125, 2), 0.13);
        assert_eq!(round_to(-0.125, 2), -0.13);
        assert_eq!(round_to(99.0, 1), 99.0);
    }
}
