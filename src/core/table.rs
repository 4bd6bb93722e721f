//! Name table loader.
//!
//! One row per old identifier, one column per variant. The delimiter is
//! sniffed from the header line. The first column header must be literally
//! `Base`; columns whose header starts with `#` are comments and skipped.
//! An empty cell means "keep"/"disable" per the sentinel rule downstream.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

const DELIMITER_CANDIDATES: [char; 3] = [',', ';', '\t'];

#[derive(Debug, Clone)]
struct Row {
    base: String,
    cells: HashMap<String, String>,
}

/// Parsed name table: variant columns in header order plus one row per
/// old identifier.
#[derive(Debug, Clone)]
pub struct NameTable {
    variants: Vec<String>,
    rows: Vec<Row>,
}

impl NameTable {
    pub fn load(path: &Path) -> Result<NameTable> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<NameTable> {
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| Error::Table("table is empty".into()))?;
        let delimiter = sniff_delimiter(header);

        let headers: Vec<&str> = header.split(delimiter).map(str::trim).collect();
        if headers.first() != Some(&"Base") {
            return Err(Error::Table(
                "first column must be named Base".into(),
            ));
        }

        let variants: Vec<String> = headers[1..]
            .iter()
            .filter(|h| !h.is_empty() && !h.starts_with('#'))
            .map(|h| h.to_string())
            .collect();
        if variants.is_empty() {
            return Err(Error::Table("table has no variant columns".into()));
        }

        let mut rows = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let cells: Vec<&str> = line.split(delimiter).map(str::trim).collect();
            let base = cells[0].to_string();
            if base.is_empty() {
                continue;
            }
            let mut row = Row {
                base,
                cells: HashMap::new(),
            };
            for (idx, header) in headers[1..].iter().enumerate() {
                if header.is_empty() || header.starts_with('#') {
                    continue;
                }
                // Missing trailing cells read as the empty sentinel.
                let value = cells.get(idx + 1).copied().unwrap_or("");
                row.cells.insert(header.to_string(), value.to_string());
            }
            rows.push(row);
        }

        Ok(NameTable { variants, rows })
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// The old → new mapping for one variant column.
    pub fn mapping(&self, variant: &str) -> Result<HashMap<String, String>> {
        if !self.variants.iter().any(|v| v == variant) {
            return Err(Error::Table(format!("unknown variant column: {variant}")));
        }
        Ok(self
            .rows
            .iter()
            .map(|row| {
                let value = row.cells.get(variant).cloned().unwrap_or_default();
                (row.base.clone(), value)
            })
            .collect())
    }
}

/// Pick the candidate delimiter that occurs most often in the header line.
fn sniff_delimiter(header: &str) -> char {
    DELIMITER_CANDIDATES
        .into_iter()
        .max_by_key(|&d| header.matches(d).count())
        .unwrap_or(',')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_table() {
        let table = NameTable::parse("Base,Fri,Sat\nKick,Kick A,Kick B\nSnare,Sn A,Sn B\n").unwrap();
        assert_eq!(table.variants(), ["Fri", "Sat"]);
        let mapping = table.mapping("Sat").unwrap();
        assert_eq!(mapping["Kick"], "Kick B");
        assert_eq!(mapping["Snare"], "Sn B");
    }

    #[test]
    fn sniffs_semicolon_and_tab_delimiters() {
        let semi = NameTable::parse("Base;Show\nKick;Drum\n").unwrap();
        assert_eq!(semi.mapping("Show").unwrap()["Kick"], "Drum");

        let tab = NameTable::parse("Base\tShow\nKick\tDrum\n").unwrap();
        assert_eq!(tab.mapping("Show").unwrap()["Kick"], "Drum");
    }

    #[test]
    fn comment_columns_are_skipped() {
        let table = NameTable::parse("Base,#notes,Show\nKick,ignore me,Drum\n").unwrap();
        assert_eq!(table.variants(), ["Show"]);
        assert!(table.mapping("#notes").is_err());
    }

    #[test]
    fn missing_base_header_is_an_error() {
        let err = NameTable::parse("Name,Show\nKick,Drum\n").unwrap_err();
        assert!(matches!(err, Error::Table(_)));
    }

    #[test]
    fn empty_cells_map_to_empty_sentinel() {
        let table = NameTable::parse("Base,Show\nKick,\nSnare,Top\n").unwrap();
        let mapping = table.mapping("Show").unwrap();
        assert_eq!(mapping["Kick"], "");
        assert_eq!(mapping["Snare"], "Top");
    }

    #[test]
    fn rows_with_empty_base_are_skipped() {
        let table = NameTable::parse("Base,Show\n,Phantom\nKick,Drum\n").unwrap();
        let mapping = table.mapping("Show").unwrap();
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn short_rows_read_as_empty_cells() {
        let table = NameTable::parse("Base,Fri,Sat\nKick,Drum\n").unwrap();
        assert_eq!(table.mapping("Sat").unwrap()["Kick"], "");
    }

    #[test]
    fn table_without_variants_is_an_error() {
        assert!(NameTable::parse("Base\nKick\n").is_err());
        assert!(NameTable::parse("Base,#only-comments\nKick,x\n").is_err());
    }
}
