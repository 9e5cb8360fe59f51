//! File output for simulation runs.

pub mod export;

pub use export::{export_hourly_csv, export_monthly_csv, write_hourly_csv, write_monthly_csv};
