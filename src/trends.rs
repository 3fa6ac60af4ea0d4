use chrono::{Datelike, NaiveDate};

use crate::models::{LeaveRow, TrendSeries};
use crate::week::{self, RANGE_SEPARATOR};

pub const MONTH_LABELS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const WEEK_LABELS: [&str; 4] = ["Week 1", "Week 2", "Week 3", "Week 4"];

/// Inclusive number of days between `from` and `to`.
pub fn leave_day_count(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days() + 1
}

/// First date of a row's `dates` string. A lone date counts as its own start.
pub fn start_date(row: &LeaveRow) -> Option<NaiveDate> {
    let first = row.dates.split(RANGE_SEPARATOR).next()?;
    week::parse_date(first).ok()
}

/// 1-based week of the month, weeks starting on Sunday.
pub fn week_of_month(date: NaiveDate) -> u32 {
    let first_weekday = date
        .with_day(1)
        .map(|first| first.weekday().num_days_from_sunday())
        .unwrap_or(0);
    (date.day() + first_weekday - 1) / 7 + 1
}

pub fn monthly_counts(rows: &[LeaveRow]) -> TrendSeries {
    let mut counts = [0usize; 12];
    for date in rows.iter().filter_map(start_date) {
        counts[date.month0() as usize] += 1;
    }

    TrendSeries {
        label: "Monthly Leave Requests",
        buckets: MONTH_LABELS.iter().copied().zip(counts).collect(),
    }
}

/// Only the first four weeks of a month have a bucket.
pub fn week_of_month_counts(rows: &[LeaveRow]) -> TrendSeries {
    let mut counts = [0usize; 4];
    for date in rows.iter().filter_map(start_date) {
        let week = week_of_month(date) as usize - 1;
        if week < counts.len() {
            counts[week] += 1;
        }
    }

    TrendSeries {
        label: "Weekly Leave Requests",
        buckets: WEEK_LABELS.iter().copied().zip(counts).collect(),
    }
}
