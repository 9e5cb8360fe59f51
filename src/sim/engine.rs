//! Simulation engine: weather → PV → load → dispatch → KPIs → finance.

use std::fmt;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::devices::{
    LoadPatterns, LoadProfileGenerator, ModelError, PvModelParams, PvOutput, PvOutputModel,
};
use crate::error::SimError;
use crate::weather::{WeatherCache, WeatherOrigin, WeatherProvider, WeatherSource};

use super::costs::CostTable;
use super::dispatch::{DispatchResult, dispatch};
use super::finance::{FinancialResult, analyze};
use super::kpi::{EnergyBalanceResult, MonthlySummary, round_to, summarize};
use super::series::HourlySeries;
use super::types::{HourRecord, SimulationRequest};

/// Annual KPIs of one quoted system, rounded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub pv_generation_kwh: f64,
    pub self_consumption_kwh: f64,
    pub grid_import_kwh: f64,
    pub grid_export_kwh: f64,
    pub autonomy_degree_percent: f64,
    pub self_consumption_ratio_percent: f64,
    pub pv_coverage_percent: f64,
    pub battery_cycles: f64,
    pub battery_charging_hours: u32,
    pub battery_discharging_hours: u32,
    pub annual_savings_eur: f64,
    pub total_savings_eur: f64,
    pub payback_period_years: f64,
    pub discounted_payback_years: f64,
    pub npv_eur: f64,
    pub irr_percent: f64,
    pub total_investment_eur: f64,
    pub monthly_summary: Vec<MonthlySummary>,
}

impl SimulationResult {
    /// Rounds the raw totals: energy, percentages and cycles to 1 dp.
    fn from_parts(
        balance: &EnergyBalanceResult,
        finance: &FinancialResult,
        monthly: &[MonthlySummary],
        capacity_kwh: f64,
    ) -> Self {
        let finance = finance.rounded();
        Self {
            pv_generation_kwh: round_to(balance.pv_generation_kwh, 1),
            self_consumption_kwh: round_to(balance.self_consumption_kwh, 1),
            grid_import_kwh: round_to(balance.grid_import_kwh, 1),
            grid_export_kwh: round_to(balance.grid_export_kwh, 1),
            autonomy_degree_percent: round_to(balance.autonomy_percent(), 1),
            self_consumption_ratio_percent: round_to(balance.self_consumption_ratio_percent(), 1),
            pv_coverage_percent: round_to(balance.pv_coverage_percent(), 1),
            battery_cycles: round_to(balance.battery_cycles(capacity_kwh), 1),
            battery_charging_hours: balance.battery_charging_hours,
            battery_discharging_hours: balance.battery_discharging_hours,
            annual_savings_eur: finance.annual_savings_eur,
            total_savings_eur: finance.total_savings_eur,
            payback_period_years: finance.simple_payback_years,
            discounted_payback_years: finance.discounted_payback_years,
            npv_eur: finance.npv_eur,
            irr_percent: finance.irr_percent,
            total_investment_eur: finance.total_investment_eur,
            monthly_summary: monthly.iter().map(MonthlySummary::rounded).collect(),
        }
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Energy ---")?;
        writeln!(f, "PV generation:         {:.1} kWh", self.pv_generation_kwh)?;
        writeln!(f, "Self-consumption:      {:.1} kWh", self.self_consumption_kwh)?;
        writeln!(f, "Grid import:           {:.1} kWh", self.grid_import_kwh)?;
        writeln!(f, "Grid export:           {:.1} kWh", self.grid_export_kwh)?;
        writeln!(f, "Autonomy:              {:.1}%", self.autonomy_degree_percent)?;
        writeln!(f, "Self-consumption rate: {:.1}%", self.self_consumption_ratio_percent)?;
        writeln!(f, "PV coverage:           {:.1}%", self.pv_coverage_percent)?;
        writeln!(
            f,
            "Battery:               {:.1} cycles ({} h charging, {} h discharging)",
            self.battery_cycles, self.battery_charging_hours, self.battery_discharging_hours
        )?;
        writeln!(f, "--- Financials ---")?;
        writeln!(f, "Investment:            {:.2} EUR", self.total_investment_eur)?;
        writeln!(f, "Annual savings:        {:.2} EUR", self.annual_savings_eur)?;
        writeln!(f, "Lifetime savings:      {:.2} EUR", self.total_savings_eur)?;
        writeln!(f, "Simple payback:        {:.1} years", self.payback_period_years)?;
        writeln!(f, "Discounted payback:    {:.1} years", self.discounted_payback_years)?;
        writeln!(f, "NPV:                   {:.2} EUR", self.npv_eur)?;
        writeln!(f, "IRR:                   {:.2}%", self.irr_percent)?;
        writeln!(f, "--- Monthly ---")?;
        write!(
            f,
            "{:>5} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "month", "pv", "load", "self", "import", "export", "aut%"
        )?;
        for m in &self.monthly_summary {
            write!(
                f,
                "\n{:>5} {:>10.1} {:>10.1} {:>10.1} {:>10.1} {:>10.1} {:>8.1}",
                m.month,
                m.pv_generation_kwh,
                m.consumption_kwh,
                m.self_consumption_kwh,
                m.grid_import_kwh,
                m.grid_export_kwh,
                m.autonomy_percent
            )?;
        }
        Ok(())
    }
}

/// A completed run: the rounded result plus the hourly data behind it.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub result: SimulationResult,
    /// Unrounded annual totals.
    pub balance: EnergyBalanceResult,
    /// PV generation on local time (kW).
    pub pv: HourlySeries,
    /// Site demand on local time (kW).
    pub load: HourlySeries,
    pub flows: DispatchResult,
    pub weather_origin: WeatherOrigin,
    /// Label of the PV model that produced `pv`.
    pub pv_model: &'static str,
    /// Set when the proportional PV model had to be used.
    pub pv_fallback: Option<ModelError>,
}

impl SimulationRun {
    pub fn hour_records(&self) -> Vec<HourRecord> {
        self.flows.hour_records(&self.pv, &self.load)
    }
}

/// Runs complete annual simulations against an injected weather provider.
///
/// Holds no per-run state, so one instance can serve concurrent requests;
/// the weather cache is the only shared mutable state.
#[derive(Debug)]
pub struct Simulator<C, S> {
    weather: WeatherProvider<C, S>,
    pv_model: PvOutputModel,
    loads: LoadProfileGenerator,
    costs: CostTable,
}

impl<C: WeatherCache, S: WeatherSource> Simulator<C, S> {
    pub fn new(weather: WeatherProvider<C, S>) -> Self {
        Self {
            weather,
            pv_model: PvOutputModel::default(),
            loads: LoadProfileGenerator::default(),
            costs: CostTable::default(),
        }
    }

    pub fn with_costs(mut self, costs: CostTable) -> Self {
        self.costs = costs;
        self
    }

    pub fn with_load_patterns(mut self, patterns: LoadPatterns) -> Self {
        self.loads = LoadProfileGenerator::new(patterns);
        self
    }

    pub fn with_pv_params(mut self, params: PvModelParams) -> Self {
        self.pv_model = PvOutputModel::new(params);
        self
    }

    pub fn weather(&self) -> &WeatherProvider<C, S> {
        &self.weather
    }

    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    /// Simulates one year and returns only the rounded KPIs.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidInput`] listing every violated constraint.
    pub fn simulate(&self, request: &SimulationRequest) -> Result<SimulationResult, SimError> {
        Ok(self.run(request)?.result)
    }

    /// Simulates one year and keeps the hourly series.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidInput`] listing every violated constraint.
    /// Weather and PV-model failures are handled by fallbacks and never
    /// surface here.
    #[instrument(
        skip_all,
        fields(
            lat = request.system.location.latitude,
            lon = request.system.location.longitude,
            pv_kw = request.system.pv_peak_kw,
            battery_kwh = request.system.battery.capacity_kwh,
        )
    )]
    pub fn run(&self, request: &SimulationRequest) -> Result<SimulationRun, SimError> {
        let mut errors = request.validate();
        errors.extend(self.costs.validate());
        errors.extend(self.loads.patterns().validate());
        if !errors.is_empty() {
            return Err(SimError::InvalidInput(errors));
        }

        let system = &request.system;
        let weather = self.weather.get_weather(&system.location);

        let output = self.pv_model.generate(&weather, &system.pv_array());
        let pv_fallback = match &output {
            PvOutput::Fallback { reason, .. } => Some(reason.clone()),
            PvOutput::Primary(_) => None,
        };
        let pv_model = output.model_name();
        // Weather is UTC-indexed; the load profile is on local time.
        let pv = output.into_series().shifted(system.location.utc_offset_hours());

        let load = self
            .loads
            .generate(system.annual_consumption_kwh, system.load_profile_type);

        let flows = dispatch(&pv, &load, &system.battery);
        let summary = summarize(&pv, &load, &flows);

        let investment = request
            .finance
            .investment_eur
            .unwrap_or_else(|| self.costs.investment(system.pv_peak_kw, system.battery.capacity_kwh));
        let finance = analyze(&summary.balance, &request.finance, investment);

        let result = SimulationResult::from_parts(
            &summary.balance,
            &finance,
            &summary.monthly,
            system.battery.capacity_kwh,
        );
        if weather.origin() == WeatherOrigin::Synthetic {
            warn!("result based on synthetic weather");
        }
        info!(
            autonomy = result.autonomy_degree_percent,
            self_consumption = result.self_consumption_ratio_percent,
            npv = result.npv_eur,
            "simulation complete"
        );

        Ok(SimulationRun {
            result,
            balance: summary.balance,
            pv,
            load,
            flows,
            weather_origin: weather.origin(),
            pv_model,
            pv_fallback,
        })
    }
}
