use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of columns in the weekly grid (Monday through Saturday).
pub const GRID_DAYS: usize = 6;

pub type DayTotals = [u32; GRID_DAYS];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveType {
    #[serde(rename = "Annual Leave")]
    Annual,
    #[serde(rename = "Casual Leave")]
    Casual,
    #[serde(rename = "Sick Leave")]
    Sick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// A leave request as returned by the leave-records API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRecord {
    pub leave_id: i64,
    pub leave_type: LeaveType,
    #[serde(default)]
    pub description: String,
    pub employee_id: i64,
    pub from_date: String,
    pub to_date: String,
    pub status: LeaveStatus,
    #[serde(default)]
    pub approved_by: Option<String>,
    pub admin_id: i64,
}

/// Envelope the API wraps record lists in.
#[derive(Debug, Clone, Deserialize)]
pub struct LeavesResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub leaves: Vec<LeaveRecord>,
}

/// One row of the admin leave table. `dates` keeps the raw
/// `"YYYY-MM-DD to YYYY-MM-DD"` display string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRow {
    pub username: String,
    #[serde(rename = "type")]
    pub leave_type: String,
    pub status: String,
    pub dates: String,
    #[serde(default)]
    pub notes: String,
}

impl From<LeaveRecord> for LeaveRow {
    fn from(record: LeaveRecord) -> Self {
        let leave_type = match record.leave_type {
            LeaveType::Annual => "Annual Leave",
            LeaveType::Casual => "Casual Leave",
            LeaveType::Sick => "Sick Leave",
        };
        let status = match record.status {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
        };

        LeaveRow {
            username: record.employee_id.to_string(),
            leave_type: leave_type.to_string(),
            status: status.to_string(),
            dates: format!("{} to {}", record.from_date, record.to_date),
            notes: record.description,
        }
    }
}

/// A closed date range of leave for one subject. `start <= end` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveInterval {
    subject_id: String,
    start: NaiveDate,
    end: NaiveDate,
}

impl LeaveInterval {
    /// Returns `None` when `start` is after `end`.
    pub fn new(subject_id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self {
            subject_id: subject_id.into(),
            start,
            end,
        })
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupancyCell {
    pub subject_id: String,
    pub day_index: usize,
    pub display_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectWeek {
    pub subject_id: String,
    pub cells: Vec<OccupancyCell>,
}

impl SubjectWeek {
    pub fn cell(&self, day_index: usize) -> Option<&OccupancyCell> {
        self.cells.iter().find(|cell| cell.day_index == day_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedInterval {
    pub subject_id: String,
    pub dates: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub week_start: NaiveDate,
    pub rows: Vec<SubjectWeek>,
    pub totals: DayTotals,
    pub skipped: Vec<SkippedInterval>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendSeries {
    pub label: &'static str,
    pub buckets: Vec<(&'static str, usize)>,
}
