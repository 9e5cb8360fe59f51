//! Representative-year calendar used to label hour indices.

use chrono::{Datelike, NaiveDate, Weekday};

use super::series::HOURS_PER_YEAR;

/// Calendar year the hour index is mapped onto. Non-leap, starts on a Sunday.
pub const REFERENCE_YEAR: i32 = 2023;

/// Number of days in the representative year.
pub const DAYS_PER_YEAR: usize = HOURS_PER_YEAR / 24;

/// Date and hour of one slot in the representative year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourStamp {
    pub date: NaiveDate,
    pub hour: u32,
}

impl HourStamp {
    /// Calendar month, 1 to 12.
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// Day of year, 1 to 365.
    pub fn day_of_year(&self) -> u32 {
        self.date.ordinal()
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

/// Yields the [`HOURS_PER_YEAR`] stamps of the representative year in index order.
pub fn hour_stamps() -> impl Iterator<Item = HourStamp> {
    NaiveDate::from_ymd_opt(REFERENCE_YEAR, 1, 1)
        .into_iter()
        .flat_map(|start| start.iter_days().take(DAYS_PER_YEAR))
        .flat_map(|date| (0..24).map(move |hour| HourStamp { date, hour }))
}

/// Zero-based month index (0 = January) for every hour of the year.
pub fn month_indices() -> Vec<usize> {
    hour_stamps().map(|s| s.month() as usize - 1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_whole_year() {
        let stamps: Vec<HourStamp> = hour_stamps().collect();
        assert_eq!(stamps.len(), HOURS_PER_YEAR);
        assert_eq!(stamps[0].month(), 1);
        assert_eq!(stamps[0].day_of_year(), 1);
        assert_eq!(stamps[HOURS_PER_YEAR - 1].month(), 12);
        assert_eq!(stamps[HOURS_PER_YEAR - 1].hour, 23);
    }

    #[test]
    fn reference_year_starts_on_sunday() {
        let first = hour_stamps().next().map(|s| s.weekday());
        assert_eq!(first, Some(Weekday::Sun));
    }

    #[test]
    fn month_lengths_match_calendar() {
        let mut hours = [0_usize; 12];
        for m in month_indices() {
            hours[m] += 1;
        }
        assert_eq!(hours[0], 31 * 24);
        assert_eq!(hours[1], 28 * 24);
        assert_eq!(hours[11], 31 * 24);
    }
}
