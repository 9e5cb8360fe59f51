//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use pv_quote_sim::devices::LoadProfileType;
use pv_quote_sim::sim::{BatterySpec, FinancialParameters, SimulationRequest, Simulator, SystemConfiguration};
use pv_quote_sim::weather::synthetic::synthetic_year;
use pv_quote_sim::weather::{
    Coordinate, MemoryCache, OfflineSource, WeatherError, WeatherProvider, WeatherRecord,
    WeatherSource,
};

/// Frankfurt am Main.
pub fn frankfurt() -> Coordinate {
    Coordinate::new(50.11, 8.68)
}

/// Simulator that never leaves the process: in-memory cache, synthetic weather.
pub fn offline_simulator() -> Simulator<MemoryCache, OfflineSource> {
    Simulator::new(WeatherProvider::new(MemoryCache::new(), OfflineSource))
}

/// Reference office quote: 30 kWp, 20 kWh / 10 kW, 50 MWh, 0.30 / 0.08 EUR/kWh.
pub fn office_request() -> SimulationRequest {
    SimulationRequest {
        system: SystemConfiguration {
            location: frankfurt(),
            pv_peak_kw: 30.0,
            tilt_deg: 30.0,
            azimuth_deg: 180.0,
            battery: BatterySpec {
                capacity_kwh: 20.0,
                power_kw: Some(10.0),
                ..BatterySpec::default()
            },
            load_profile_type: LoadProfileType::Office,
            annual_consumption_kwh: 50_000.0,
        },
        finance: FinancialParameters::with_tariffs(0.30, 0.08),
    }
}

/// Office quote with a different battery capacity (power unchanged).
pub fn office_with_capacity(capacity_kwh: f64) -> SimulationRequest {
    let mut req = office_request();
    req.system.battery.capacity_kwh = capacity_kwh;
    req
}

/// Weather source backed by the synthetic generator that counts its calls.
#[derive(Debug, Default)]
pub struct CountingSource {
    calls: AtomicUsize,
}

impl CountingSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WeatherSource for CountingSource {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn fetch(&self, coordinate: &Coordinate) -> Result<Vec<WeatherRecord>, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(synthetic_year(coordinate).records().to_vec())
    }
}

/// Weather source that always fails and counts its calls.
#[derive(Debug, Default)]
pub struct FailingSource {
    calls: AtomicUsize,
}

impl FailingSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WeatherSource for FailingSource {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn fetch(&self, _coordinate: &Coordinate) -> Result<Vec<WeatherRecord>, WeatherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(WeatherError::Unavailable("connection refused".to_string()))
    }
}
