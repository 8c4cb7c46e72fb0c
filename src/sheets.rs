pub mod cell;
pub mod parse;

use std::collections::HashMap;

use self::cell::Cell;
use crate::{data::RawSheet, error::ConvertError};

static EMPTY: Cell = Cell::Empty;

/// A sheet whose first line was taken as the header row
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub id: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// One spreadsheet line, cells keyed by normalized header name
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based line number in the sheet
    pub line: usize,
    cells: HashMap<String, Cell>,
}

/// Trims a header and strips embedded line breaks
pub fn normalize_header(header: &str) -> String {
    header.trim().replace(['\n', '\r'], "")
}

impl Row {
    pub fn get(&self, column: &str) -> &Cell {
        self.cells
            .get(&normalize_header(column))
            .unwrap_or(&EMPTY)
    }

    /// The cell rendered as text, empty when the column is missing
    pub fn text(&self, column: &str) -> String {
        self.get(column).to_string()
    }
}

impl Sheet {
    /// Finds the first header matching one of `labels`.
    ///
    /// Exact (case-insensitive) matches win over headers that merely
    /// contain a label.
    pub fn find_column(&self, labels: &[String]) -> Option<&str> {
        let labels: Vec<String> = labels
            .iter()
            .map(|l| normalize_header(l).to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        let headers = || self.headers.iter().map(|h| (h, h.to_lowercase()));

        headers()
            .find(|(_, lower)| labels.iter().any(|l| lower == l))
            .or_else(|| {
                headers().find(|(_, lower)| labels.iter().any(|l| lower.contains(l.as_str())))
            })
            .map(|(h, _)| &h[..])
    }
}

impl TryFrom<RawSheet> for Sheet {
    type Error = ConvertError;

    fn try_from(value: RawSheet) -> Result<Self, Self::Error> {
        let mut lines = value.data.into_iter();
        let headers: Vec<String> = match lines.next() {
            Some(header_row) => header_row
                .into_iter()
                .map(|raw| normalize_header(&Cell::from(raw).to_string()))
                .collect(),
            None => return Err(ConvertError::EmptySheet(value.id)),
        };

        // duplicate headers: the leftmost column wins
        let mut columns: Vec<(usize, &String)> = Vec::new();
        for (pos, header) in headers.iter().enumerate() {
            if !header.is_empty() && columns.iter().all(|(_, h)| *h != header) {
                columns.push((pos, header));
            }
        }

        // header sits on sheet line `start_row + 1`
        let first_line = value.start_row + 2;
        let rows = lines
            .enumerate()
            .filter_map(|(n, raw_row)| {
                let cells: HashMap<String, Cell> = columns
                    .iter()
                    .filter_map(|(pos, header)| {
                        let cell = Cell::from(raw_row.get(*pos)?.clone());
                        (!cell.is_empty()).then(|| ((*header).clone(), cell))
                    })
                    .collect();
                if cells.is_empty() {
                    return None;
                }
                Some(Row {
                    line: first_line + n,
                    cells,
                })
            })
            .collect();

        Ok(Self {
            id: value.id,
            headers,
            rows,
        })
    }
}
