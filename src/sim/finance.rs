//! Investment appraisal of a simulated year: savings, payback, NPV and IRR.

use serde::Serialize;

use super::kpi::{EnergyBalanceResult, round_to};
use super::types::FinancialParameters;

/// Payback reported when the investment is never recovered.
pub const PAYBACK_SENTINEL_YEARS: f64 = 99.0;

const IRR_MAX_ITERATIONS: usize = 50;
const IRR_TOLERANCE: f64 = 1e-6;
const IRR_MIN_DERIVATIVE: f64 = 1e-10;
const IRR_MIN_RATE: f64 = 0.001;
const IRR_MAX_RATE: f64 = 0.5;

/// Investment KPIs of one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialResult {
    /// First-year savings against buying all energy from the grid.
    pub annual_savings_eur: f64,
    /// Undiscounted, degraded savings over the lifetime.
    pub total_savings_eur: f64,
    pub total_investment_eur: f64,
    pub simple_payback_years: f64,
    pub discounted_payback_years: f64,
    pub npv_eur: f64,
    pub irr_percent: f64,
}

impl FinancialResult {
    /// Copy rounded for presentation (EUR 2 dp, years 1 dp, IRR 2 dp).
    pub fn rounded(&self) -> Self {
        Self {
            annual_savings_eur: round_to(self.annual_savings_eur, 2),
            total_savings_eur: round_to(self.total_savings_eur, 2),
            total_investment_eur: round_to(self.total_investment_eur, 2),
            simple_payback_years: round_to(self.simple_payback_years, 1),
            discounted_payback_years: round_to(self.discounted_payback_years, 1),
            npv_eur: round_to(self.npv_eur, 2),
            irr_percent: round_to(self.irr_percent, 2),
        }
    }
}

/// First-year savings: avoided grid purchases plus export revenue.
///
/// Equals `load × price − (import × price − export × feed_in)`.
pub fn annual_savings(balance: &EnergyBalanceResult, params: &FinancialParameters) -> f64 {
    let price = params.electricity_price_eur_kwh;
    let baseline_cost = balance.consumption_kwh * price;
    let net_cost_with_pv =
        balance.grid_import_kwh * price - balance.grid_export_kwh * params.feed_in_tariff_eur_kwh;
    baseline_cost - net_cost_with_pv
}

/// Savings in year `year` (1-based) after degradation.
fn degraded(savings: f64, degradation_rate: f64, year: u32) -> f64 {
    savings * (1.0 - degradation_rate).powi(year as i32)
}

/// `investment / savings`, saturating at [`PAYBACK_SENTINEL_YEARS`].
pub fn simple_payback(investment: f64, savings: f64) -> f64 {
    if savings <= 0.0 {
        return PAYBACK_SENTINEL_YEARS;
    }
    (investment / savings).clamp(0.0, PAYBACK_SENTINEL_YEARS)
}

/// Net present value of the degraded savings stream at `rate`.
pub fn npv(investment: f64, savings: f64, rate: f64, degradation_rate: f64, lifetime_years: u32) -> f64 {
    (1..=lifetime_years).fold(-investment, |acc, y| {
        acc + degraded(savings, degradation_rate, y) / (1.0 + rate).powi(y as i32)
    })
}

/// d(NPV)/d(rate).
fn npv_derivative(savings: f64, rate: f64, degradation_rate: f64, lifetime_years: u32) -> f64 {
    (1..=lifetime_years)
        .map(|y| {
            -f64::from(y) * degraded(savings, degradation_rate, y) / (1.0 + rate).powi(y as i32 + 1)
        })
        .sum()
}

/// Internal rate of return in percent.
///
/// Newton-Raphson starting from `savings / investment`, with the rate clamped
/// to [0.1 %, 50 %] after every step. Stops after 50 iterations, when the step
/// falls below 1e-6, or when the derivative vanishes; the last clamped estimate
/// is returned in every case. Returns 0 when either input is non-positive.
pub fn irr(investment: f64, savings: f64, degradation_rate: f64, lifetime_years: u32) -> f64 {
    if investment <= 0.0 || savings <= 0.0 {
        return 0.0;
    }

    let mut rate = (savings / investment).clamp(IRR_MIN_RATE, IRR_MAX_RATE);
    for _ in 0..IRR_MAX_ITERATIONS {
        let value = npv(investment, savings, rate, degradation_rate, lifetime_years);
        let slope = npv_derivative(savings, rate, degradation_rate, lifetime_years);
        if slope.abs() < IRR_MIN_DERIVATIVE {
            break;
        }
        let next = (rate - value / slope).clamp(IRR_MIN_RATE, IRR_MAX_RATE);
        let step = (next - rate).abs();
        rate = next;
        if step < IRR_TOLERANCE {
            break;
        }
    }
    rate * 100.0
}

/// Years until cumulative discounted savings reach the investment.
///
/// Linearly interpolated inside the year the threshold is crossed.
/// [`PAYBACK_SENTINEL_YEARS`] if it is never crossed within the lifetime or
/// when investment or savings are non-positive.
pub fn discounted_payback(
    investment: f64,
    savings: f64,
    rate: f64,
    degradation_rate: f64,
    lifetime_years: u32,
) -> f64 {
    if investment <= 0.0 || savings <= 0.0 {
        return PAYBACK_SENTINEL_YEARS;
    }

    let mut cumulative = 0.0;
    for y in 1..=lifetime_years {
        let cash = degraded(savings, degradation_rate, y) / (1.0 + rate).powi(y as i32);
        if cumulative + cash >= investment {
            let years = f64::from(y - 1) + (investment - cumulative) / cash;
            return years.min(PAYBACK_SENTINEL_YEARS);
        }
        cumulative += cash;
    }
    PAYBACK_SENTINEL_YEARS
}

/// Derives every investment KPI from an energy balance.
///
/// # Arguments
///
/// * `balance` - Annual energy totals
/// * `params` - Tariffs, discount and degradation rates, lifetime
/// * `investment_eur` - Up-front cost of the installation
pub fn analyze(
    balance: &EnergyBalanceResult,
    params: &FinancialParameters,
    investment_eur: f64,
) -> FinancialResult {
    let savings = annual_savings(balance, params);
    let d = params.degradation_rate;
    let n = params.project_lifetime_years;

    FinancialResult {
        annual_savings_eur: savings,
        total_savings_eur: (1..=n).map(|y| degraded(savings, d, y)).sum(),
        total_investment_eur: investment_eur,
        simple_payback_years: simple_payback(investment_eur, savings),
        discounted_payback_years: discounted_payback(investment_eur, savings, params.discount_rate, d, n),
        npv_eur: npv(investment_eur, savings, params.discount_rate, d, n),
        irr_percent: irr(investment_eur, savings, d, n),
    }
}
