use std::io::{self, Write};

use crate::math::JulianDate;

/// One gimbal pointing record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointingSample {
    pub time: JulianDate,
    pub az: f64,    // deg
    pub el: f64,    // deg
    pub range: f64, // m
}

/// Write a gimbal pointing history as CSV.
///
/// Columns: time (ISO-8601 UTC), elapsed_s, az_deg, el_deg, range_m.
/// `elapsed_s` counts from the first row.
pub fn write_pointing<W: Write>(writer: &mut W, rows: &[PointingSample]) -> io::Result<()> {
    writeln!(writer, "time,elapsed_s,az_deg,el_deg,range_m")?;

    let Some(first) = rows.first() else {
        return Ok(());
    };
    for row in rows {
        writeln!(
            writer,
            "{},{:.3},{:.6},{:.6},{:.3}",
            row.time,
            row.time.seconds_since(&first.time),
            row.az,
            row.el,
            row.range,
        )?;
    }

    Ok(())
}

/// Write a pointing history to a CSV file at the given path.
pub fn write_pointing_file(path: &str, rows: &[PointingSample]) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_pointing(&mut file, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_output_has_header_and_rows() {
        let t0 = JulianDate::from_utc(2024, 1, 1, 0, 0, 0).unwrap();
        let rows = vec![
            PointingSample { time: t0, az: 10.0, el: 20.0, range: 1.0e6 },
            PointingSample { time: t0.add_seconds(30.0), az: 12.5, el: 22.0, range: 9.9e5 },
        ];

        let mut buf = Vec::new();
        write_pointing(&mut buf, &rows).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("time,"));
        assert_eq!(lines.len(), 3); // header + 2 data rows
        assert!(lines[1].starts_with("2024-01-01T00:00:00.000Z,0.000,"));
        assert!(lines[2].contains(",30.000,12.500000,"));
    }

    #[test]
    fn empty_history_is_header_only() {
        let mut buf = Vec::new();
        write_pointing(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }
}
