//! Calendar helpers over `chrono::NaiveDate`.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Every date in `start..=end`, in increasing order. Empty when `start > end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// `date` moved back by `days`, or `None` before the calendar minimum.
pub fn days_before(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(days)))
}

pub fn days_after(date: NaiveDate, days: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(days)))
}

/// Sunday closing the week that contains `date` (weeks run Monday..=Sunday).
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let offset = 6 - date.weekday().num_days_from_monday();
    days_after(date, offset).unwrap_or(date)
}

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Arrow `Date32` value: days since the Unix epoch.
pub fn to_date32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Whether `date` is the last day of its week.
pub fn is_week_end(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn range_is_inclusive() {
        let days: Vec<NaiveDate> = date_range(d("2021-08-30"), d("2021-09-02")).collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], d("2021-08-30"));
        assert_eq!(days[3], d("2021-09-02"));
    }

    #[test]
    fn range_empty_when_reversed() {
        assert_eq!(date_range(d("2021-09-02"), d("2021-09-01")).count(), 0);
    }

    #[test]
    fn shift_across_month() {
        assert_eq!(days_before(d("2021-09-05"), 14), Some(d("2021-08-22")));
        assert_eq!(days_after(d("2021-08-22"), 14), Some(d("2021-09-05")));
    }

    #[test]
    fn date32_counts_from_epoch() {
        assert_eq!(to_date32(d("1970-01-01")), 0);
        assert_eq!(to_date32(d("2021-08-01")), 18_840);
    }

    #[test]
    fn week_ending_is_sunday() {
        // 2021-10-12 was a Tuesday.
        assert_eq!(week_ending(d("2021-10-12")), d("2021-10-17"));
        assert_eq!(week_ending(d("2021-10-17")), d("2021-10-17"));
        assert!(is_week_end(d("2021-10-17")));
    }
}
