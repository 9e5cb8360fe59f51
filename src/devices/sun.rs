//! Solar geometry: sun position and plane-of-array irradiance.

use std::f64::consts::PI;

/// Sun position for one hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunPosition {
    /// Elevation above the horizon in degrees (negative at night).
    pub elevation_deg: f64,
    /// Azimuth in degrees, clockwise from north (180 = south).
    pub azimuth_deg: f64,
}

impl SunPosition {
    pub fn is_up(&self) -> bool {
        self.elevation_deg > 0.0
    }

    /// Sine of the elevation angle (cosine of the zenith angle).
    pub fn sin_elevation(&self) -> f64 {
        self.elevation_deg.to_radians().sin()
    }
}

fn day_angle(day_of_year: u32) -> f64 {
    2.0 * PI * (f64::from(day_of_year) - 1.0) / 365.0
}

/// Solar declination in radians (Spencer 1971).
pub fn declination_rad(day_of_year: u32) -> f64 {
    let g = day_angle(day_of_year);
    0.006918 - 0.399912 * g.cos() + 0.070257 * g.sin() - 0.006758 * (2.0 * g).cos()
        + 0.000907 * (2.0 * g).sin()
        - 0.002697 * (3.0 * g).cos()
        + 0.00148 * (3.0 * g).sin()
}

/// Equation of time in minutes (Spencer 1971).
pub fn equation_of_time_min(day_of_year: u32) -> f64 {
    let g = day_angle(day_of_year);
    229.18
        * (0.000075 + 0.001868 * g.cos()
            - 0.032077 * g.sin()
            - 0.014615 * (2.0 * g).cos()
            - 0.040849 * (2.0 * g).sin())
}

/// Sun position at the middle of UTC hour `hour_index` of the representative year.
///
/// # Arguments
///
/// * `latitude_deg` - Observer latitude (north positive)
/// * `longitude_deg` - Observer longitude (east positive)
/// * `hour_index` - Hour of the year, 0-based, UTC
pub fn sun_position(latitude_deg: f64, longitude_deg: f64, hour_index: usize) -> SunPosition {
    let day_of_year = (hour_index / 24) as u32 + 1;
    let utc_hour = (hour_index % 24) as f64 + 0.5;

    let decl = declination_rad(day_of_year);
    let solar_time =
        utc_hour + longitude_deg / 15.0 + equation_of_time_min(day_of_year) / 60.0;
    let hour_angle = (15.0 * (solar_time - 12.0)).to_radians();
    let lat = latitude_deg.to_radians();

    let sin_alt = (lat.sin() * decl.sin() + lat.cos() * decl.cos() * hour_angle.cos())
        .clamp(-1.0, 1.0);
    let alt = sin_alt.asin();

    // Guard the poles, where the azimuth is undefined.
    let denom = (lat.cos() * alt.cos()).max(1e-9);
    let cos_az = ((decl.sin() - lat.sin() * sin_alt) / denom).clamp(-1.0, 1.0);
    // Normalise the hour angle so afternoon is positive regardless of wrap.
    let afternoon = hour_angle.sin() > 0.0;
    let az = if afternoon {
        2.0 * PI - cos_az.acos()
    } else {
        cos_az.acos()
    };

    SunPosition {
        elevation_deg: alt.to_degrees(),
        azimuth_deg: az.to_degrees(),
    }
}

/// Cosine of the angle between the sun direction and the panel normal.
pub fn cos_incidence(sun: &SunPosition, tilt_deg: f64, azimuth_deg: f64) -> f64 {
    let zenith = (90.0 - sun.elevation_deg).to_radians();
    let tilt = tilt_deg.to_radians();
    let relative_az = (sun.azimuth_deg - azimuth_deg).to_radians();
    (zenith.cos() * tilt.cos() + zenith.sin() * tilt.sin() * relative_az.cos()).clamp(-1.0, 1.0)
}

/// Irradiance on a tilted fixed plane in W/m².
///
/// Beam on the plane plus isotropic sky diffuse plus ground-reflected light.
pub fn plane_of_array(
    ghi: f64,
    dni: f64,
    dhi: f64,
    sun: &SunPosition,
    tilt_deg: f64,
    azimuth_deg: f64,
    albedo: f64,
) -> f64 {
    let cos_aoi = cos_incidence(sun, tilt_deg, azimuth_deg);
    let beam = if cos_aoi > 0.0 && sun.is_up() {
        dni * cos_aoi
    } else {
        0.0
    };
    let tilt = tilt_deg.to_radians();
    let sky = dhi * (1.0 + tilt.cos()) / 2.0;
    let ground = ghi * albedo * (1.0 - tilt.cos()) / 2.0;
    (beam + sky + ground).max(0.0)
}
