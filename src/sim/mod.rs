//! Annual simulation: hourly series, dispatch, aggregation and financial appraisal.

/// Representative-year calendar.
pub mod calendar;
/// Investment cost table.
pub mod costs;
pub mod dispatch;
pub mod engine;
pub mod finance;
pub mod kpi;
pub mod series;
pub mod types;

pub use engine::{SimulationResult, SimulationRun, Simulator};
pub use series::{HOURS_PER_YEAR, HourlySeries};
pub use types::{BatterySpec, FinancialParameters, SimulationRequest, SystemConfiguration};
