use std::io::Write;

use crate::errors::ClientError;

/// A decoded result file: ordered named columns over ordered string rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Field at `row` under the named column, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ClientError> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(&self.columns)
            .map_err(|e| ClientError::Io(std::io::Error::other(e)))?;
        for row in &self.rows {
            out.write_record(row)
                .map_err(|e| ClientError::Io(std::io::Error::other(e)))?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Decodes a delimited-text result body into a table.
///
/// Rows with any empty field are dropped, then the first surviving row
/// becomes the header with surrounding quotes stripped. Remaining rows are
/// data rows aligned positionally to the header.
pub fn decode_table(raw: &str) -> Result<ResultTable, ClientError> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    for line in raw.lines() {
        let fields: Vec<String> = line.split(',').map(str::to_string).collect();
        if fields.iter().any(|f| f.is_empty()) {
            continue;
        }
        rows.push(fields);
    }

    let mut rows = rows.into_iter();
    let columns: Vec<String> = rows
        .next()
        .ok_or_else(|| ClientError::Decode("result table has no header row".to_string()))?
        .into_iter()
        .map(|c| c.trim_matches('"').to_string())
        .collect();

    Ok(ResultTable {
        columns,
        rows: rows.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_quoted_header_and_rows() {
        let table = decode_table("\"A\",\"B\"\n1,2\n3,4").unwrap();
        assert_eq!(table.columns(), ["A", "B"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "A"), Some("1"));
        assert_eq!(table.get(0, "B"), Some("2"));
        assert_eq!(table.get(1, "A"), Some("3"));
        assert_eq!(table.get(1, "B"), Some("4"));
    }

    #[test]
    fn test_rows_with_empty_fields_are_dropped() {
        let table = decode_table("\"A\",\"B\"\n1,\n2,3\n\n4,5").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "A"), Some("2"));
        assert_eq!(table.get(1, "B"), Some("5"));
    }

    #[test]
    fn test_all_rows_filtered_is_a_decode_error() {
        let result = decode_table("1,\n,2\n,");
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[test]
    fn test_header_only_yields_empty_table() {
        let table = decode_table("\"date\",\"value\"").unwrap();
        assert_eq!(table.columns(), ["date", "value"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_write_csv_round_trips_header_and_rows() {
        let table = decode_table("\"A\",\"B\"\n1,2").unwrap();
        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "A,B\n1,2\n");
    }

    #[test]
    fn test_unknown_column_lookup_is_none() {
        let table = decode_table("\"A\",\"B\"\n1,2").unwrap();
        assert_eq!(table.get(0, "C"), None);
        assert_eq!(table.get(5, "A"), None);
    }
}
