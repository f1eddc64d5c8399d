//! Spreadsheet decoding: CSV/TSV via `csv`, XLSX/XLS/ODS via `calamine`.
//! Output is a uniform cell grid rendered to pipe-separated text for the
//! capability prompt.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::DecodeError;

/// Rows of cells, already stringified. Empty trailing cells are preserved so
/// column positions stay meaningful for comparison spreadsheets.
#[derive(Debug, Clone, Default)]
pub struct CellGrid {
    pub rows: Vec<Vec<String>>,
}

impl CellGrid {
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.iter().all(|c| c.trim().is_empty()))
    }

    /// Render the grid as pipe-separated text, bounded for prompt use.
    /// Rows beyond `max_rows` are dropped with an ellipsis marker.
    pub fn to_grid_text(&self, max_rows: usize) -> String {
        let mut out = String::new();
        for (i, row) in self.rows.iter().enumerate() {
            if i >= max_rows {
                out.push_str(&format!("… ({} more rows)\n", self.rows.len() - max_rows));
                break;
            }
            out.push_str(&row.join(" | "));
            out.push('\n');
        }
        out
    }
}

/// Decode a spreadsheet upload into a cell grid.
///
/// XLSX/XLS/ODS are recognized by magic bytes; everything else is treated as
/// delimited text (comma or tab, sniffed from the first line).
pub fn decode_spreadsheet(bytes: &[u8]) -> Result<CellGrid, DecodeError> {
    if looks_like_workbook(bytes) {
        decode_workbook(bytes)
    } else {
        decode_delimited(bytes)
    }
}

/// XLSX is a ZIP container (PK\x03\x04); legacy XLS is a CFB file.
fn looks_like_workbook(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0])
}

fn decode_workbook(bytes: &[u8]) -> Result<CellGrid, DecodeError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| DecodeError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DecodeError::Spreadsheet("workbook has no sheets".to_string()))?
        .map_err(|e| DecodeError::Spreadsheet(e.to_string()))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(render_cell).collect())
        .collect();

    Ok(CellGrid { rows })
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn decode_delimited(bytes: &[u8]) -> Result<CellGrid, DecodeError> {
    let delimiter = sniff_delimiter(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DecodeError::Spreadsheet(e.to_string()))?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(CellGrid { rows })
}

/// Tab wins when the first line contains tabs; comma otherwise.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line_end = bytes.iter().position(|&b| b == b'\n').unwrap_or(bytes.len());
    if bytes[..first_line_end].contains(&b'\t') {
        b'\t'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_decodes_to_grid() {
        let csv = b"Merchant,Volume,Rate\nAcme Auto Glass,40000,2.9\n";
        let grid = decode_spreadsheet(csv).unwrap();
        assert_eq!(grid.rows.len(), 2);
        assert_eq!(grid.rows[0], vec!["Merchant", "Volume", "Rate"]);
        assert_eq!(grid.rows[1][1], "40000");
    }

    #[test]
    fn tsv_sniffed_from_first_line() {
        let tsv = b"Current Rate\t2.95%\nProposed Rate\t2.10%\n";
        let grid = decode_spreadsheet(tsv).unwrap();
        assert_eq!(grid.rows[0], vec!["Current Rate", "2.95%"]);
    }

    #[test]
    fn quoted_fields_with_commas() {
        let csv = b"\"Smith, Jones & Co\",15000\n";
        let grid = decode_spreadsheet(csv).unwrap();
        assert_eq!(grid.rows[0][0], "Smith, Jones & Co");
    }

    #[test]
    fn ragged_rows_allowed() {
        let csv = b"a,b,c\nd\ne,f\n";
        let grid = decode_spreadsheet(csv).unwrap();
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.rows[1].len(), 1);
    }

    #[test]
    fn grid_text_bounded() {
        let rows: Vec<Vec<String>> = (0..10)
            .map(|i| vec![format!("row{i}"), "x".to_string()])
            .collect();
        let grid = CellGrid { rows };
        let text = grid.to_grid_text(3);
        assert!(text.contains("row0 | x"));
        assert!(text.contains("row2 | x"));
        assert!(!text.contains("row3 | x"));
        assert!(text.contains("7 more rows"));
    }

    #[test]
    fn empty_grid_detected() {
        let grid = decode_spreadsheet(b"").unwrap();
        assert!(grid.is_empty());

        let blank = decode_spreadsheet(b",,\n , ,\n").unwrap();
        assert!(blank.is_empty());
    }

    #[test]
    fn invalid_workbook_is_error_not_panic() {
        // ZIP magic but not an actual workbook.
        let bogus = b"PK\x03\x04garbagegarbage";
        assert!(decode_spreadsheet(bogus).is_err());
    }
}
