use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{
    DayTotals, LeaveInterval, LeaveRow, OccupancyCell, Projection, SkippedInterval, SubjectWeek,
    GRID_DAYS,
};

pub const RANGE_SEPARATOR: &str = " to ";
pub const DISPLAY_DATE_FORMAT: &str = "%d %b";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    #[error("expected `<start> to <end>`, got {0:?}")]
    MissingEnd(String),

    #[error("too many `to` separators in {0:?}")]
    TooManyParts(String),

    #[error("invalid date {value:?}: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("start {start} is after end {end}")]
    Reversed { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WeekError {
    #[error("week offset {0} is outside the supported calendar range")]
    OutOfRange(i64),
}

/// The displayed Monday-to-Saturday span, addressed by a week offset from
/// an injected `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    today: NaiveDate,
    offset: i64,
    week_start: NaiveDate,
}

impl WeekWindow {
    pub fn current(today: NaiveDate) -> Result<Self, WeekError> {
        Self::at_offset(today, 0)
    }

    /// Fails when the shifted week, including its Saturday, leaves the
    /// calendar range chrono can represent.
    pub fn at_offset(today: NaiveDate, offset: i64) -> Result<Self, WeekError> {
        let week_start = Duration::try_weeks(offset)
            .and_then(|weeks| today.checked_add_signed(weeks))
            .and_then(monday_on_or_before)
            .filter(|monday| monday.checked_add_signed(Duration::days(GRID_DAYS as i64 - 1)).is_some())
            .ok_or(WeekError::OutOfRange(offset))?;

        Ok(Self {
            today,
            offset,
            week_start,
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    /// Calendar date of grid column `day_index` (0 = Monday). Every column
    /// date is in range, `at_offset` checks Saturday.
    pub fn column_date(&self, day_index: usize) -> NaiveDate {
        self.week_start + Duration::days(day_index as i64)
    }
}

/// Moves the window by `delta` weeks. Always recomputed from `today`, so
/// successive moves compose.
pub fn advance_week(window: &WeekWindow, delta: i64) -> Result<WeekWindow, WeekError> {
    let offset = window
        .offset
        .checked_add(delta)
        .ok_or(WeekError::OutOfRange(window.offset))?;
    WeekWindow::at_offset(window.today, offset)
}

pub fn monday_on_or_before(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::days(i64::from(date.weekday().num_days_from_monday())))
}

pub fn parse_interval(subject_id: &str, dates: &str) -> Result<LeaveInterval, IntervalError> {
    let mut parts = dates.split(RANGE_SEPARATOR);
    let start = parts.next().unwrap_or_default();
    let end = parts
        .next()
        .ok_or_else(|| IntervalError::MissingEnd(dates.to_string()))?;
    if parts.next().is_some() {
        return Err(IntervalError::TooManyParts(dates.to_string()));
    }

    let start = parse_date(start)?;
    let end = parse_date(end)?;
    LeaveInterval::new(subject_id, start, end).ok_or(IntervalError::Reversed { start, end })
}

pub fn parse_date(value: &str) -> Result<NaiveDate, IntervalError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| IntervalError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

/// Grid cells covered by `interval` in `window`. Sunday has no column and
/// never matches.
pub fn occupied_days(interval: &LeaveInterval, window: &WeekWindow) -> Vec<OccupancyCell> {
    if interval.end() < window.week_start() || interval.start() > window.column_date(GRID_DAYS - 1) {
        return Vec::new();
    }

    (0..GRID_DAYS)
        .map(|day_index| (day_index, window.column_date(day_index)))
        .filter(|(_, date)| interval.contains(*date))
        .map(|(day_index, date)| OccupancyCell {
            subject_id: interval.subject_id().to_string(),
            day_index,
            display_date: date.format(DISPLAY_DATE_FORMAT).to_string(),
        })
        .collect()
}

/// Projects every leave row onto the window. Rows whose dates do not parse
/// keep an empty grid row and are reported in `skipped`.
///
/// Entries of the same subject share one row, and `totals` counts each
/// subject at most once per day.
pub fn project(entries: &[LeaveRow], window: &WeekWindow) -> Projection {
    let mut rows: Vec<SubjectWeek> = Vec::new();
    let mut row_index: HashMap<String, usize> = HashMap::new();
    let mut totals: DayTotals = [0; GRID_DAYS];
    let mut skipped = Vec::new();

    for entry in entries {
        let index = *row_index.entry(entry.username.clone()).or_insert_with(|| {
            rows.push(SubjectWeek {
                subject_id: entry.username.clone(),
                cells: Vec::new(),
            });
            rows.len() - 1
        });

        let interval = match parse_interval(&entry.username, &entry.dates) {
            Ok(interval) => interval,
            Err(err) => {
                skipped.push(SkippedInterval {
                    subject_id: entry.username.clone(),
                    dates: entry.dates.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let row = &mut rows[index];
        for cell in occupied_days(&interval, window) {
            if row.cell(cell.day_index).is_none() {
                totals[cell.day_index] += 1;
                row.cells.push(cell);
            }
        }
    }

    for row in rows.iter_mut() {
        row.cells.sort_by_key(|cell| cell.day_index);
    }

    Projection {
        week_start: window.week_start(),
        rows,
        totals,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn row(username: &str, dates: &str) -> LeaveRow {
        LeaveRow {
            username: username.to_string(),
            leave_type: "Sick Leave".to_string(),
            status: "Approved".to_string(),
            dates: dates.to_string(),
            notes: String::new(),
        }
    }

    fn window_starting(monday: &str) -> WeekWindow {
        WeekWindow::current(date(monday)).unwrap()
    }

    #[test]
    fn current_window_starts_on_monday() {
        // 2024-10-03 is a Thursday, 2024-10-06 a Sunday.
        assert_eq!(WeekWindow::current(date("2024-10-03")).unwrap().week_start(), date("2024-09-30"));
        assert_eq!(WeekWindow::current(date("2024-10-06")).unwrap().week_start(), date("2024-09-30"));
        assert_eq!(WeekWindow::current(date("2024-09-30")).unwrap().week_start(), date("2024-09-30"));
    }

    #[test]
    fn advance_moves_by_whole_weeks() {
        let window = WeekWindow::current(date("2024-10-03")).unwrap();
        let next = advance_week(&window, 1).unwrap();
        let previous = advance_week(&window, -1).unwrap();

        assert_eq!(next.offset(), 1);
        assert_eq!(next.week_start(), date("2024-10-07"));
        assert_eq!(previous.offset(), -1);
        assert_eq!(previous.week_start(), date("2024-09-23"));
        assert_eq!(next.today(), window.today());
    }

    #[test]
    fn advances_compose() {
        let window = WeekWindow::current(date("2024-02-29")).unwrap();
        for (first, second) in [(3, -5), (-52, 104), (0, 7), (11, 0)] {
            let stepped = advance_week(&advance_week(&window, first).unwrap(), second).unwrap();
            let direct = advance_week(&window, first + second).unwrap();
            assert_eq!(stepped, direct);
        }
    }

    #[test]
    fn advance_reports_out_of_range_offsets() {
        let window = WeekWindow::current(date("2024-10-03")).unwrap();
        assert_eq!(
            advance_week(&window, i64::MAX),
            Err(WeekError::OutOfRange(i64::MAX))
        );
        let far = WeekWindow::at_offset(date("2024-10-03"), 1).unwrap();
        assert!(matches!(advance_week(&far, i64::MAX), Err(WeekError::OutOfRange(_))));

        // The earliest representable Monday is reached at -13783612 weeks.
        let earliest = advance_week(&window, -13_783_612).unwrap();
        assert_eq!(earliest.week_start().weekday(), chrono::Weekday::Mon);
        assert_eq!(
            advance_week(&window, -13_783_613),
            Err(WeekError::OutOfRange(-13_783_613))
        );
        assert_eq!(
            advance_week(&earliest, -1),
            Err(WeekError::OutOfRange(-13_783_613))
        );
    }

    #[test]
    fn window_before_first_monday_is_out_of_range() {
        // NaiveDate::MIN is a Thursday, so its Monday is not representable.
        assert_eq!(WeekWindow::current(NaiveDate::MIN), Err(WeekError::OutOfRange(0)));
        assert_eq!(monday_on_or_before(NaiveDate::MIN), None);
    }

    #[test]
    fn parses_range_and_rejects_malformed_strings() {
        let interval = parse_interval("A", "2024-10-01 to 2024-10-03").unwrap();
        assert_eq!(interval.subject_id(), "A");
        assert_eq!(interval.start(), date("2024-10-01"));
        assert_eq!(interval.end(), date("2024-10-03"));

        assert_eq!(
            parse_interval("A", "2024-10-15"),
            Err(IntervalError::MissingEnd("2024-10-15".to_string()))
        );
        assert!(matches!(
            parse_interval("A", "not-a-date"),
            Err(IntervalError::MissingEnd(_))
        ));
        assert!(matches!(
            parse_interval("A", "2024-10-01 to soon"),
            Err(IntervalError::InvalidDate { .. })
        ));
        assert!(matches!(
            parse_interval("A", "2024-10-01 to 2024-10-02 to 2024-10-03"),
            Err(IntervalError::TooManyParts(_))
        ));
        assert!(matches!(
            parse_interval("A", "2024-10-03 to 2024-10-01"),
            Err(IntervalError::Reversed { .. })
        ));
    }

    #[test]
    fn projects_midweek_range() {
        let projection = project(&[row("A", "2024-10-01 to 2024-10-03")], &window_starting("2024-09-30"));

        assert_eq!(projection.totals, [0, 1, 1, 1, 0, 0]);
        assert_eq!(projection.rows.len(), 1);
        let days: Vec<usize> = projection.rows[0].cells.iter().map(|c| c.day_index).collect();
        assert_eq!(days, vec![1, 2, 3]);
        assert_eq!(projection.rows[0].cells[0].display_date, "01 Oct");
        assert!(projection.skipped.is_empty());
    }

    #[test]
    fn full_week_fills_every_column() {
        let projection = project(&[row("A", "2024-09-30 to 2024-10-05")], &window_starting("2024-09-30"));
        assert_eq!(projection.totals, [1, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn single_day_on_week_start_occupies_monday() {
        let projection = project(&[row("A", "2024-09-30 to 2024-09-30")], &window_starting("2024-09-30"));
        assert!(projection.totals[0] >= 1);
        assert_eq!(projection.rows[0].cell(0).map(|c| c.display_date.as_str()), Some("30 Sep"));
    }

    #[test]
    fn sunday_is_never_counted() {
        let projection = project(&[row("A", "2024-10-06 to 2024-10-06")], &window_starting("2024-09-30"));
        assert_eq!(projection.totals, [0; GRID_DAYS]);
        assert!(projection.rows[0].cells.is_empty());
    }

    #[test]
    fn intervals_outside_window_contribute_nothing() {
        let entries = vec![
            row("before", "2024-09-01 to 2024-09-29"),
            row("after", "2024-10-06 to 2024-10-20"),
        ];
        let projection = project(&entries, &window_starting("2024-09-30"));
        assert_eq!(projection.totals, [0; GRID_DAYS]);
        assert!(projection.rows.iter().all(|r| r.cells.is_empty()));
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let entries = vec![
            row("bad", "not-a-date"),
            row("single", "2024-10-02"),
            row("good", "2024-10-02 to 2024-10-02"),
        ];
        let projection = project(&entries, &window_starting("2024-09-30"));

        assert_eq!(projection.totals, [0, 0, 1, 0, 0, 0]);
        assert_eq!(projection.skipped.len(), 2);
        assert_eq!(projection.skipped[0].subject_id, "bad");
        assert_eq!(projection.skipped[1].dates, "2024-10-02");
        let subjects: Vec<&str> = projection.rows.iter().map(|r| r.subject_id.as_str()).collect();
        assert_eq!(subjects, vec!["bad", "single", "good"]);
    }

    #[test]
    fn repeated_subject_merges_into_one_row() {
        let entries = vec![
            row("A", "2024-10-03 to 2024-10-04"),
            row("B", "2024-09-30 to 2024-09-30"),
            row("A", "2024-09-30 to 2024-10-03"),
        ];
        let projection = project(&entries, &window_starting("2024-09-30"));

        assert_eq!(projection.rows.len(), 2);
        assert_eq!(projection.rows[0].subject_id, "A");
        let days: Vec<usize> = projection.rows[0].cells.iter().map(|c| c.day_index).collect();
        assert_eq!(days, vec![0, 1, 2, 3, 4]);
        assert_eq!(projection.totals, [2, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn overlapping_entries_count_a_subject_once_per_day() {
        let entries = vec![
            row("A", "2024-10-01 to 2024-10-02"),
            row("A", "2024-10-02 to 2024-10-03"),
        ];
        let projection = project(&entries, &window_starting("2024-09-30"));

        assert_eq!(projection.rows.len(), 1);
        assert_eq!(projection.totals, [0, 1, 1, 1, 0, 0]);
        for day_index in 0..GRID_DAYS {
            let occupied = projection.rows.iter().filter(|r| r.cell(day_index).is_some()).count();
            assert_eq!(projection.totals[day_index] as usize, occupied);
        }
    }

    #[test]
    fn projection_is_idempotent() {
        let entries = vec![row("A", "2024-10-01 to 2024-10-03"), row("B", "oops")];
        let window = window_starting("2024-09-30");
        assert_eq!(project(&entries, &window), project(&entries, &window));
    }
}
