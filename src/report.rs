use std::fmt::Write;

use crate::models::{LeaveRow, Projection, StatusSummary, TrendSeries, GRID_DAYS};
use crate::trends;
use crate::week::{WeekWindow, DISPLAY_DATE_FORMAT};

const EMPTY_CELL: &str = ".";

pub fn summarize_by_status(rows: &[LeaveRow]) -> Vec<StatusSummary> {
    let mut map: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();

    for row in rows {
        *map.entry(row.status.as_str()).or_insert(0) += 1;
    }

    let mut summaries: Vec<StatusSummary> = map
        .into_iter()
        .map(|(status, count)| StatusSummary {
            status: status.to_string(),
            count,
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.status.cmp(&b.status)));
    summaries
}

pub fn week_title(window: &WeekWindow) -> String {
    format!("Week of {}", window.week_start().format("%d %b %Y"))
}

fn column_headers(window: &WeekWindow) -> Vec<String> {
    (0..GRID_DAYS)
        .map(|day_index| {
            let date = window.column_date(day_index);
            format!("{} ({})", date.format("%a"), date.format(DISPLAY_DATE_FORMAT))
        })
        .collect()
}

/// Fixed-width text grid: header, totals line, one line per subject.
pub fn render_grid(window: &WeekWindow, projection: &Projection) -> String {
    let headers = column_headers(window);
    let name_width = projection
        .rows
        .iter()
        .map(|row| row.subject_id.chars().count())
        .chain(std::iter::once("Employee".len()))
        .max()
        .unwrap_or(0);
    let cell_width = headers.iter().map(String::len).max().unwrap_or(0);

    let mut output = String::new();
    let _ = writeln!(output, "{}", week_title(window));

    let _ = write!(output, "{:<name_width$}", "Employee");
    for header in &headers {
        let _ = write!(output, "  {:^cell_width$}", header);
    }
    let _ = writeln!(output);

    let _ = write!(output, "{:<name_width$}", "");
    for total in projection.totals.iter() {
        let _ = write!(output, "  {:^cell_width$}", format!("{total} on leave"));
    }
    let _ = writeln!(output);

    for row in &projection.rows {
        let _ = write!(output, "{:<name_width$}", row.subject_id);
        for day_index in 0..GRID_DAYS {
            let cell = row
                .cell(day_index)
                .map(|cell| cell.display_date.as_str())
                .unwrap_or(EMPTY_CELL);
            let _ = write!(output, "  {:^cell_width$}", cell);
        }
        let _ = writeln!(output);
    }

    output
}

fn write_series(output: &mut String, series: &TrendSeries) {
    let _ = writeln!(output, "### {}", series.label);
    for (label, count) in &series.buckets {
        let _ = writeln!(output, "- {label}: {count}");
    }
}

pub fn build_report(
    source_label: &str,
    window: &WeekWindow,
    rows: &[LeaveRow],
    projection: &Projection,
) -> String {
    let summaries = summarize_by_status(rows);

    let mut output = String::new();
    let _ = writeln!(output, "# Leave Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} records, week offset {})",
        source_label,
        rows.len(),
        window.offset()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No leave requests recorded.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(output, "- {}: {} requests", summary.status, summary.count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## {}", week_title(window));

    let headers = column_headers(window);
    let _ = writeln!(output, "| Employee | {} |", headers.join(" | "));
    let _ = writeln!(output, "|---{}|", "|---".repeat(GRID_DAYS));
    let totals: Vec<String> = projection
        .totals
        .iter()
        .map(|total| format!("{total} on leave"))
        .collect();
    let _ = writeln!(output, "| **Total** | {} |", totals.join(" | "));
    for row in &projection.rows {
        let cells: Vec<&str> = (0..GRID_DAYS)
            .map(|day_index| {
                row.cell(day_index)
                    .map(|cell| cell.display_date.as_str())
                    .unwrap_or(EMPTY_CELL)
            })
            .collect();
        let _ = writeln!(output, "| {} | {} |", row.subject_id, cells.join(" | "));
    }

    if !projection.skipped.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Skipped Entries");
        for skipped in &projection.skipped {
            let _ = writeln!(
                output,
                "- {} `{}`: {}",
                skipped.subject_id, skipped.dates, skipped.reason
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Trends");
    write_series(&mut output, &trends::monthly_counts(rows));
    let _ = writeln!(output);
    write_series(&mut output, &trends::week_of_month_counts(rows));

    output
}
