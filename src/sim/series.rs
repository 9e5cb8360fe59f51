//! Fixed-length hourly series for one representative year.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// Number of hours in the (non-leap) representative year.
pub const HOURS_PER_YEAR: usize = 8760;

/// An ordered sequence of exactly [`HOURS_PER_YEAR`] hourly values.
///
/// Every series in one simulation run shares the same index, so hour `h` of a
/// PV series lines up with hour `h` of the load series. With a one-hour step a
/// power value in kW is also the energy of that hour in kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct HourlySeries(Vec<f64>);

impl HourlySeries {
    /// Wraps `values`, rejecting anything that is not exactly one year long.
    ///
    /// # Errors
    ///
    /// Returns a `SeriesError` if `values.len() != HOURS_PER_YEAR`.
    pub fn new(values: Vec<f64>) -> Result<Self, SeriesError> {
        if values.len() == HOURS_PER_YEAR {
            Ok(Self(values))
        } else {
            Err(SeriesError {
                expected: HOURS_PER_YEAR,
                actual: values.len(),
            })
        }
    }

    /// A series of zeros.
    pub fn zeros() -> Self {
        Self(vec![0.0; HOURS_PER_YEAR])
    }

    /// Builds a series by evaluating `f` for every hour index.
    pub fn from_fn(f: impl FnMut(usize) -> f64) -> Self {
        Self((0..HOURS_PER_YEAR).map(f).collect())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Shifts the series by `hours`, wrapping around the end of the year.
    ///
    /// A positive shift moves values later: `shifted(1)[h] == self[h - 1]`.
    /// Used to move a UTC-indexed series onto local time.
    pub fn shifted(&self, hours: i32) -> Self {
        let mut values = self.0.clone();
        let n = HOURS_PER_YEAR as i64;
        let k = (i64::from(hours).rem_euclid(n)) as usize;
        values.rotate_right(k);
        Self(values)
    }
}

impl Index<usize> for HourlySeries {
    type Output = f64;

    fn index(&self, hour: usize) -> &f64 {
        &self.0[hour]
    }
}

impl IndexMut<usize> for HourlySeries {
    fn index_mut(&mut self, hour: usize) -> &mut f64 {
        &mut self.0[hour]
    }
}

impl<'a> IntoIterator for &'a HourlySeries {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl TryFrom<Vec<f64>> for HourlySeries {
    type Error = SeriesError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<HourlySeries> for Vec<f64> {
    fn from(series: HourlySeries) -> Self {
        series.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let err = HourlySeries::new(vec![1.0; 24]).unwrap_err();
        assert_eq!(err.expected, HOURS_PER_YEAR);
        assert_eq!(err.actual, 24);
    }

    #[test]
    fn from_fn_has_full_length() {
        let s = HourlySeries::from_fn(|h| h as f64);
        assert_eq!(s.len(), HOURS_PER_YEAR);
        assert_eq!(s[8759], 8759.0);
    }

    #[test]
    fn shift_wraps_around_year_end() {
        let s = HourlySeries::from_fn(|h| h as f64);
        let later = s.shifted(1);
        assert_eq!(later[0], 8759.0);
        assert_eq!(later[1], 0.0);

        let earlier = s.shifted(-2);
        assert_eq!(earlier[0], 2.0);
        assert_eq!(earlier[8759], 1.0);
    }

    #[test]
    fn shift_preserves_sum() {
        let s = HourlySeries::from_fn(|h| (h % 24) as f64);
        assert_eq!(s.shifted(5).sum(), s.sum());
    }

    #[test]
    fn deserialize_checks_length() {
        let short: Result<HourlySeries, _> = serde_json::from_str("[1.0, 2.0]");
        assert!(short.is_err());
    }
}
