use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use venuesync_parser::RawRow;

use crate::error::Result;

/// Reads every row of a headed CSV export, in file order.
pub fn read_rows_from_path(path: impl AsRef<Path>) -> Result<Vec<RawRow>> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path.as_ref())?;
    collect_rows(reader)
}

pub fn read_rows<R: Read>(input: R) -> Result<Vec<RawRow>> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    collect_rows(reader)
}

fn collect_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawRow>> {
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let columns: HashMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.trim().to_string(), value.to_string()))
            .collect();
        rows.push(RawRow::new(columns));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headed_rows_with_multiline_cells() {
        let data = "Title,Open_Time_Monday,about\n\
                    Cafe X,9AM\u{2013}5PM,\"{'Amenities':\n ['Wifi']}\"\n\
                    Short Row,Closed\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Title"), "Cafe X");
        assert_eq!(rows[0].get("Open_Time_Monday"), "9AM\u{2013}5PM");
        assert!(rows[0].get("about").contains('\n'));
        assert_eq!(rows[1].get("about"), "");
    }

    #[test]
    fn missing_export_reports_csv_error() {
        let err = read_rows_from_path("does/not/exist/data.csv").unwrap_err();
        assert!(matches!(err, crate::error::ImportError::Csv(_)));
    }
}
