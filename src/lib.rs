//! Annual energy-flow and investment simulation for commercial PV systems
//! with optional battery storage.
//!
//! A [`sim::Simulator`] turns a [`sim::SimulationRequest`] into KPIs for one
//! representative year: weather from [`weather`], PV and load series from
//! [`devices`], hourly self-consumption dispatch and financial appraisal
//! from [`sim`].

pub mod config;
pub mod devices;
pub mod error;
pub mod io;
/// Dispatch, aggregation and appraisal of one simulated year.
pub mod sim;
pub mod weather;
