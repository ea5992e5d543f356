//! CSV tokenizer with encoding auto-detection.
//!
//! Turns raw CSV text into a [`Grid`] of raw string cells. No header
//! inference and no type coercion happen here: banner rows, header rows and
//! data rows all come out as plain rows. Rows whose cells are all blank are
//! dropped.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::CsvError;
use crate::models::Grid;

/// Result of tokenizing bytes with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Tokenized cells
    pub grid: Grid,
    /// Detected or used encoding
    pub encoding: String,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> Result<String, CsvError> {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        other => {
            let codec = encoding_rs::Encoding::for_label(other.as_bytes())
                .ok_or_else(|| CsvError::EncodingError(format!("unsupported encoding '{}'", other)))?;
            codec.decode(bytes).0.into_owned()
        }
    };

    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Tokenize comma-separated text into a grid.
///
/// Quoted fields follow standard CSV rules; rows may have differing lengths.
///
/// # Example
/// ```
/// use usage_sheets::parser::tokenize;
///
/// let grid = tokenize("Banner\nMonths,A\n\nJan,\"1,234\"").unwrap();
/// assert_eq!(grid.len(), 3);
/// assert_eq!(grid.cell(2, 1), Some("1,234"));
/// ```
pub fn tokenize(text: &str) -> Result<Grid, CsvError> {
    parse_csv(text.as_bytes())
}

/// Tokenize CSV from a reader.
pub fn parse_csv<R: Read>(reader: R) -> Result<Grid, CsvError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Grid::new(rows))
}

/// Tokenize a CSV file with encoding auto-detection.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> Result<ParseResult, CsvError> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Tokenize CSV bytes with encoding auto-detection.
pub fn parse_bytes_auto(bytes: &[u8]) -> Result<ParseResult, CsvError> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let grid = tokenize(&content)?;

    Ok(ParseResult { grid, encoding })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_rows_are_raw_strings() {
        let grid = tokenize("Months,A,B\nJan, 10 ,-").unwrap();

        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell(1, 1), Some(" 10 "));
        assert_eq!(grid.cell(1, 2), Some("-"));
    }

    #[test]
    fn test_quoted_thousands_separator() {
        let grid = tokenize("Group,Q1\nLaw,\"50,000\"").unwrap();
        assert_eq!(grid.cell(1, 1), Some("50,000"));
    }

    #[test]
    fn test_blank_rows_dropped() {
        let grid = tokenize("a,b\n\n1,2\n , \n3,4\n").unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.cell(2, 0), Some("3"));
    }

    #[test]
    fn test_ragged_rows_allowed() {
        let grid = tokenize("Report for 2025\nMonths,A,B,C\nJan,1").unwrap();
        assert_eq!(grid.row(0).unwrap().len(), 1);
        assert_eq!(grid.row(1).unwrap().len(), 4);
        assert_eq!(grid.cell(2, 3), None);
    }

    #[test]
    fn test_empty_text_gives_empty_grid() {
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_bom_is_stripped() {
        let bytes = b"\xEF\xBB\xBFMonths,A\nJan,1";
        let result = parse_bytes_auto(bytes).unwrap();
        assert_eq!(result.grid.cell(0, 0), Some("Months"));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1").unwrap();
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_parse_file_auto() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Banner\nMonths,A\nJan,5\n").unwrap();

        let result = parse_csv_file_auto(file.path()).unwrap();
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.grid.len(), 3);
    }
}
