use serde::Serialize;
use std::io::Write;

use super::pairs::{OdPair, PairId};
use super::routing::RouteResult;

pub const REPORT_HEADERS: [&str; 4] = ["Pair", "Origin", "Destination", "Drive Time (minutes)"];

/// One line of the drive-time report, derived from a successful route.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub pair_id: PairId,
    pub origin_label: String,
    pub destination_label: String,
    pub drive_time_minutes: f64,
}

impl ReportRow {
    pub fn new(pair: &OdPair, result: &RouteResult) -> Self {
        Self {
            pair_id: pair.id.clone(),
            origin_label: pair.origin_label.clone(),
            destination_label: pair.destination_label.clone(),
            drive_time_minutes: result.drive_time_minutes(),
        }
    }

    /// Drive time with exactly two decimals, e.g. `12.57`.
    pub fn formatted_drive_time(&self) -> String {
        format!("{:.2}", self.drive_time_minutes)
    }

    fn cells(&self) -> [String; 4] {
        [
            self.pair_id.label.clone(),
            self.origin_label.clone(),
            self.destination_label.clone(),
            self.formatted_drive_time(),
        ]
    }
}

pub fn write_csv<W: Write>(rows: &[ReportRow], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(REPORT_HEADERS)?;
    for row in rows {
        wtr.write_record(row.cells())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Plain-text table with left-aligned columns, for terminal display.
pub fn render_table(rows: &[ReportRow]) -> String {
    let cells: Vec<[String; 4]> = rows.iter().map(ReportRow::cells).collect();
    let mut widths = REPORT_HEADERS.map(|h| h.chars().count());
    for line in &cells {
        for (w, cell) in widths.iter_mut().zip(line) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let format_line = |line: &[String]| {
        line.iter()
            .zip(widths)
            .map(|(cell, w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = REPORT_HEADERS.iter().map(|h| h.to_string()).collect();
    let mut out = format_line(&header);
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for line in &cells {
        out.push('\n');
        out.push_str(&format_line(line));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, minutes: f64) -> ReportRow {
        ReportRow {
            pair_id: PairId {
                index: 0,
                label: label.to_string(),
            },
            origin_label: "(25.003, 55.167)".to_string(),
            destination_label: "(25.257, 55.297)".to_string(),
            drive_time_minutes: minutes,
        }
    }

    #[test]
    fn test_two_decimal_formatting() {
        assert_eq!(row("Pair 1", 754.0 / 60.0).formatted_drive_time(), "12.57");
        assert_eq!(row("Pair 1", 0.0).formatted_drive_time(), "0.00");
        assert_eq!(row("Pair 1", 90.0).formatted_drive_time(), "90.00");
    }

    #[test]
    fn test_csv_has_headers_and_rows_in_order() {
        let mut buf = Vec::new();
        write_csv(&[row("Pair 1", 12.5), row("Pair 3", 3.0)], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Pair,Origin,Destination,Drive Time (minutes)");
        assert_eq!(lines[1], "Pair 1,\"(25.003, 55.167)\",\"(25.257, 55.297)\",12.50");
        assert!(lines[2].starts_with("Pair 3,"));
    }

    #[test]
    fn test_table_aligns_columns() {
        let table = render_table(&[row("Pair 1", 12.5)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Pair   | Origin"));
        assert!(lines[2].ends_with("12.50"));
    }
}
