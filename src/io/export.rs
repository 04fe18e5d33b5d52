//! Export a result table to CSV.
//!
//! One row per year, one column per country code. Missing cells (individual
//! view only) are written as empty fields.

use std::io::Write;
use std::path::Path;

use crate::domain::SeriesTable;
use crate::error::AppError;

pub fn write_table_csv(path: &Path, table: &SeriesTable) -> Result<(), AppError> {
    let file = std::fs::File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_table(file, table)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), rows = table.years.len(), "Wrote CSV export.");
    Ok(())
}

/// Codes come from user registries, so fields are quoted as needed.
fn write_table<W: Write>(out: W, table: &SeriesTable) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["year"];
    header.extend(table.series.iter().map(|s| s.code.as_str()));
    writer.write_record(&header)?;

    for (row, year) in table.years.iter().enumerate() {
        let mut record = vec![year.to_string()];
        record.extend(table.series.iter().map(|s| match s.values.get(row).copied().flatten() {
            Some(v) => format!("{v:.6}"),
            None => String::new(),
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GapPolicy, LabeledSeries};

    #[test]
    fn writes_year_rows_with_empty_gaps() {
        let table = SeriesTable {
            title: "GDP".into(),
            y_label: "current US$".into(),
            suffix: String::new(),
            years: vec![2000, 2001],
            gap_policy: GapPolicy::Preserve,
            series: vec![
                LabeledSeries {
                    code: "ARG".into(),
                    name: "Argentina".into(),
                    values: vec![Some(1.5), None],
                },
                LabeledSeries {
                    code: "BRA".into(),
                    name: "Brazil".into(),
                    values: vec![Some(-2.0), Some(3.25)],
                },
            ],
        };

        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "year,ARG,BRA\n2000,1.500000,-2.000000\n2001,,3.250000\n"
        );
    }

    #[test]
    fn registry_codes_with_delimiters_are_quoted() {
        let table = SeriesTable {
            title: "Composite".into(),
            y_label: String::new(),
            suffix: String::new(),
            years: vec![2000],
            gap_policy: GapPolicy::ZeroFill,
            series: vec![
                LabeledSeries {
                    code: "A,B".into(),
                    name: "Comma".into(),
                    values: vec![Some(0.5)],
                },
                LabeledSeries {
                    code: "Q\"X".into(),
                    name: "Quote".into(),
                    values: vec![Some(-0.5)],
                },
            ],
        };

        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "year,\"A,B\",\"Q\"\"X\"\n2000,0.500000,-0.500000\n");

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["year", "A,B", "Q\"X"]);
    }
}
