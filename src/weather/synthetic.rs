//! Deterministic synthetic weather year, used when no provider data is available.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{Coordinate, WeatherOrigin, WeatherRecord, WeatherSeries};
use crate::devices::sun::sun_position;
use crate::sim::calendar::DAYS_PER_YEAR;

/// Haurwitz clear-sky constants (W/m², dimensionless).
const CLEAR_SKY_SCALE: f64 = 1098.0;
const CLEAR_SKY_EXTINCTION: f64 = 0.057;

/// Below this sine of elevation all light is treated as diffuse.
const LOW_SUN_SIN: f64 = 0.05;

const WIND_SPEED: f64 = 3.0;

fn seed_for(coordinate: &Coordinate) -> u64 {
    let (lat, lon) = coordinate.grid_cell();
    ((lat as u32 as u64) << 32) | (lon as u32 as u64)
}

/// Season indicator: +1 at the local summer solstice, -1 in midwinter.
fn season(day_of_year: u32, latitude: f64, peak_day: f64) -> f64 {
    let s = (2.0 * PI * (f64::from(day_of_year) - peak_day) / 365.0).cos();
    if latitude < 0.0 { -s } else { s }
}

/// Builds a full year of plausible hourly weather for `coordinate`.
///
/// Each day draws one clearness factor from an RNG seeded from the rounded
/// coordinate, so the same cell always yields the same year. Irradiance is a
/// clear-sky curve over the true sun path scaled by that factor; temperature
/// is a seasonal sinusoid plus a diurnal swing peaking mid-afternoon.
pub fn synthetic_year(coordinate: &Coordinate) -> WeatherSeries {
    let mut rng = StdRng::seed_from_u64(seed_for(coordinate));
    // Everything below depends on the cell only, never the raw coordinate.
    let (cell_lat, cell_lon) = coordinate.grid_cell();
    let lat = cell_lat as f64 / 100.0;
    let lon = cell_lon as f64 / 100.0;
    let cell = Coordinate {
        latitude: lat,
        longitude: lon,
        altitude_m: coordinate.altitude_m,
    };
    let mean_temp = 27.0 - 0.35 * lat.abs();

    let mut records = Vec::with_capacity(DAYS_PER_YEAR * 24);
    for day in 0..DAYS_PER_YEAR {
        let doy = day as u32 + 1;
        let clearness =
            (0.55 + 0.12 * season(doy, lat, 172.0) + (rng.random::<f64>() - 0.5) * 0.7)
                .clamp(0.15, 1.0);
        let seasonal_temp = mean_temp + 9.0 * season(doy, lat, 200.0);

        for hour in 0..24 {
            let sun = sun_position(lat, lon, day * 24 + hour);
            let sin_alt = sun.sin_elevation();

            let (ghi, dni, dhi) = if sin_alt > 0.0 {
                let clear = CLEAR_SKY_SCALE * sin_alt * (-CLEAR_SKY_EXTINCTION / sin_alt).exp();
                let ghi = clear * clearness;
                if sin_alt > LOW_SUN_SIN {
                    let dhi = ghi * (1.1 - clearness).clamp(0.1, 1.0);
                    (ghi, (ghi - dhi) / sin_alt, dhi)
                } else {
                    (ghi, 0.0, ghi)
                }
            } else {
                (0.0, 0.0, 0.0)
            };

            let solar_hour = hour as f64 + 0.5 + lon / 15.0;
            let temp_air = seasonal_temp + 4.0 * (2.0 * PI * (solar_hour - 9.0) / 24.0).sin();

            records.push(WeatherRecord {
                ghi,
                dni,
                dhi,
                temp_air,
                wind_speed: WIND_SPEED,
            });
        }
    }

    WeatherSeries::from_parts(cell, WeatherOrigin::Synthetic, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::series::HOURS_PER_YEAR;

    fn monthly_ghi(series: &WeatherSeries, first_day: usize) -> f64 {
        series.records()[first_day * 24..(first_day + 30) * 24]
            .iter()
            .map(|r| r.ghi)
            .sum()
    }

    #[test]
    fn same_cell_gives_same_year() {
        let a = synthetic_year(&Coordinate::new(50.1104, 8.6821));
        let b = synthetic_year(&Coordinate::new(50.1096, 8.6779));
        assert_eq!(a.records(), b.records());
        assert_eq!(a.origin(), WeatherOrigin::Synthetic);
        assert_eq!(a.coordinate(), b.coordinate());
        assert_eq!(a.coordinate().cache_key(), "weather_5011_868");
    }

    #[test]
    fn different_cells_differ() {
        let a = synthetic_year(&Coordinate::new(50.11, 8.68));
        let b = synthetic_year(&Coordinate::new(52.52, 13.40));
        assert_ne!(a.records(), b.records());
    }

    #[test]
    fn full_year_without_gaps() {
        let s = synthetic_year(&Coordinate::new(48.14, 11.58));
        assert_eq!(s.records().len(), HOURS_PER_YEAR);
        assert!(s.records().iter().all(|r| {
            r.ghi.is_finite() && r.dni.is_finite() && r.dhi.is_finite() && r.temp_air.is_finite()
        }));
    }

    #[test]
    fn dark_at_night() {
        let s = synthetic_year(&Coordinate::new(50.11, 8.68));
        // 23:00 UTC on 1 February.
        let r = s.records()[31 * 24 + 23];
        assert_eq!(r.ghi, 0.0);
        assert_eq!(r.dni, 0.0);
    }

    #[test]
    fn irradiance_components_are_consistent() {
        let s = synthetic_year(&Coordinate::new(50.11, 8.68));
        for r in s.records() {
            assert!(r.ghi >= 0.0 && r.dhi >= 0.0 && r.dni >= 0.0);
            assert!(r.dhi <= r.ghi + 1e-9);
        }
    }

    #[test]
    fn central_european_annual_irradiation_is_plausible() {
        let s = synthetic_year(&Coordinate::new(50.11, 8.68));
        let annual = s.annual_ghi_kwh_m2();
        assert!((900.0..1250.0).contains(&annual), "annual GHI {annual}");
    }

    #[test]
    fn seasons_flip_south_of_equator() {
        let north = synthetic_year(&Coordinate::new(48.0, 11.0));
        let south = synthetic_year(&Coordinate::new(-33.9, 151.2));
        // January vs July.
        assert!(monthly_ghi(&north, 181) > monthly_ghi(&north, 0));
        assert!(monthly_ghi(&south, 0) > monthly_ghi(&south, 181));
    }

    #[test]
    fn summer_warmer_than_winter() {
        let s = synthetic_year(&Coordinate::new(50.11, 8.68));
        let mean = |first_day: usize| {
            s.records()[first_day * 24..(first_day + 30) * 24]
                .iter()
                .map(|r| r.temp_air)
                .sum::<f64>()
                / (30.0 * 24.0)
        };
        assert!(mean(190) > mean(10) + 10.0);
    }
}
