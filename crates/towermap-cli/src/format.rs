//! Output formatting for measurements.

use std::fmt::Write as _;

use anyhow::Result;
use time::format_description::well_known::Rfc3339;
use towermap_store::{StoredMeasurement, StoredTemporaryLocation};
use towermap_types::{Cell, Fix};

/// Serialize any value as pretty JSON with a trailing newline.
pub fn as_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)? + "\n")
}

fn format_fix(fix: &Fix) -> Result<String> {
    Ok(format!(
        "{:.6}, {:.6}  ±{} m  {}",
        fix.latitude,
        fix.longitude,
        fix.accuracy,
        fix.measured_at.format(&Rfc3339)?
    ))
}

/// One line per cell: `lte 260-02 area 58140 cell 26512641 unit 301 -95 dBm`.
pub fn format_cell(cell: &Cell) -> String {
    let mut line = format!(
        "{} {}-{:02} area {} cell {}",
        cell.radio, cell.mcc, cell.mnc, cell.area, cell.cell
    );
    if let Some(unit) = cell.unit {
        let _ = write!(line, " unit {}", unit);
    }
    if let Some(dbm) = cell.signal_dbm {
        let _ = write!(line, " {} dBm", dbm);
    }
    line
}

pub fn format_measurement_text(stored: &StoredMeasurement) -> Result<String> {
    let m = &stored.measurement;
    let mut out = format!("#{}  {}\n", stored.id, format_fix(&m.fix)?);
    for cell in &m.cells {
        let _ = writeln!(out, "    {}", format_cell(cell));
    }
    Ok(out)
}

pub fn format_measurements_text(rows: &[StoredMeasurement]) -> Result<String> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format_measurement_text(row)?);
    }
    let _ = writeln!(
        out,
        "{} measurement{}",
        rows.len(),
        if rows.len() == 1 { "" } else { "s" }
    );
    Ok(out)
}

pub fn format_staged_text(rows: &[StoredTemporaryLocation]) -> Result<String> {
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(out, "[{}]  {}", row.row_id, format_fix(&row.location.fix)?);
    }
    let _ = writeln!(out, "{} staged", rows.len());
    Ok(out)
}

/// Per-radio tally, e.g. `lte: 12, gsm: 3`, most frequent first.
pub fn radio_summary(rows: &[StoredMeasurement]) -> String {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for cell in rows.iter().filter_map(|m| m.measurement.main_cell()) {
        let label = cell.radio.to_string();
        match counts.iter_mut().find(|(r, _)| *r == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
        .iter()
        .map(|(radio, n)| format!("{radio}: {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use towermap_types::{Measurement, Radio};

    fn stored(id: i64, cells: Vec<Cell>) -> StoredMeasurement {
        StoredMeasurement {
            id,
            measurement: Measurement::new(
                Fix::new(52.1, 21.05, datetime!(2024-05-01 12:00 UTC)).accuracy(5.0),
                cells,
            ),
        }
    }

    #[test]
    fn test_format_cell() {
        let cell = Cell::new(Radio::Lte, 260, 2, 58140, 26_512_641)
            .with_unit(301)
            .with_signal(-95);
        assert_eq!(
            format_cell(&cell),
            "lte 260-02 area 58140 cell 26512641 unit 301 -95 dBm"
        );
        assert_eq!(
            format_cell(&Cell::new(Radio::Gsm, 260, 1, 10, 20)),
            "gsm 260-01 area 10 cell 20"
        );
    }

    #[test]
    fn test_format_measurement_text() {
        let text = format_measurement_text(&stored(7, vec![Cell::new(Radio::Nr, 260, 3, 1, 2)]))
            .unwrap();
        assert_eq!(
            text,
            "#7  52.100000, 21.050000  ±5 m  2024-05-01T12:00:00Z\n    nr 260-03 area 1 cell 2\n"
        );
    }

    #[test]
    fn test_format_measurements_footer() {
        assert!(format_measurements_text(&[]).unwrap().ends_with("0 measurements\n"));
        let one = format_measurements_text(&[stored(1, vec![Cell::new(Radio::Gsm, 1, 1, 1, 1)])])
            .unwrap();
        assert!(one.ends_with("1 measurement\n"));
    }

    #[test]
    fn test_radio_summary() {
        let rows = vec![
            stored(1, vec![Cell::new(Radio::Gsm, 1, 1, 1, 1)]),
            stored(2, vec![Cell::new(Radio::Lte, 1, 1, 1, 2)]),
            stored(3, vec![Cell::new(Radio::Lte, 1, 1, 1, 3)]),
        ];
        assert_eq!(radio_summary(&rows), "lte: 2, gsm: 1");
        assert_eq!(radio_summary(&[]), "");
    }
}
