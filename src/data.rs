//! Raw workbook input, either a serialized JSON workbook or a spreadsheet file

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use serde::Deserialize;

use crate::error::ConvertError;

#[derive(Debug, PartialEq, Deserialize)]
pub struct RawWorkbook {
    pub sheets: Vec<RawSheet>,
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct RawSheet {
    pub id: String,
    /// 0-based sheet row of `data[0]`, non-zero when leading rows are blank
    #[serde(default)]
    pub start_row: usize,
    pub data: Vec<Vec<RawCellData>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawCellData {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Empty,
}

impl RawWorkbook {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| &s.id[..]).collect()
    }

    /// Takes the sheet called `name`, or the first one when no name is given
    pub fn take_sheet(mut self, name: Option<&str>) -> Result<RawSheet, ConvertError> {
        let pos = match name {
            Some(name) => self.sheets.iter().position(|s| s.id == name),
            None if self.sheets.is_empty() => None,
            None => Some(0),
        };

        match pos {
            Some(pos) => Ok(self.sheets.swap_remove(pos)),
            None => Err(ConvertError::SheetNotFound(
                name.unwrap_or("<first>").to_owned(),
            )),
        }
    }
}

/// Loads a workbook from disk.
///
/// `.json` files are expected to hold a serialized [`RawWorkbook`],
/// anything else is handed to `calamine` (xlsx, xlsm, xlsb, xls, ods).
pub fn load_workbook(path: impl AsRef<Path>) -> Result<RawWorkbook, ConvertError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let text = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&text)?);
    }

    let mut workbook = open_workbook_auto(path)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let data = range
            .rows()
            .map(|row| row.iter().map(RawCellData::from).collect())
            .collect();
        let start_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
        tracing::debug!(sheet = %name, rows = range.height(), start_row, "loaded sheet");
        sheets.push(RawSheet {
            id: name,
            start_row,
            data,
        });
    }

    Ok(RawWorkbook { sheets })
}

impl From<&Data> for RawCellData {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => RawCellData::Empty,
            Data::String(s) => RawCellData::String(s.clone()),
            Data::Int(i) => RawCellData::Int(*i),
            Data::Float(f) => RawCellData::Float(*f),
            Data::Bool(b) => RawCellData::Bool(*b),
            // `#N/A`, `#DIV/0!` and friends carry no value
            Data::Error(_) => RawCellData::Empty,
            // dates and durations keep their text form
            other => RawCellData::String(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_cells() {
        let row: Vec<RawCellData> =
            serde_json::from_str(r#"["a", 5, 5.5, true, null]"#).unwrap();
        assert_eq!(
            row,
            vec![
                RawCellData::String("a".to_owned()),
                RawCellData::Int(5),
                RawCellData::Float(5.5),
                RawCellData::Bool(true),
                RawCellData::Empty,
            ]
        );
    }

    #[test]
    fn spreadsheet_cells() {
        use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};

        let cases = [
            (Data::Empty, RawCellData::Empty),
            (Data::Float(5.0), RawCellData::Float(5.0)),
            (Data::Int(7), RawCellData::Int(7)),
            (Data::Bool(true), RawCellData::Bool(true)),
            (Data::String("Текст".to_owned()), RawCellData::String("Текст".to_owned())),
            (Data::Error(CellErrorType::NA), RawCellData::Empty),
            (Data::Error(CellErrorType::Div0), RawCellData::Empty),
            (
                Data::DateTimeIso("2024-03-01T10:00:00".to_owned()),
                RawCellData::String("2024-03-01T10:00:00".to_owned()),
            ),
        ];
        for (data, expected) in cases {
            assert_eq!(RawCellData::from(&data), expected, "{data:?}");
        }

        let date = Data::DateTime(ExcelDateTime::new(
            45352.5,
            ExcelDateTimeType::DateTime,
            false,
        ));
        assert!(matches!(RawCellData::from(&date), RawCellData::String(s) if !s.is_empty()));
    }

    #[test]
    fn error_id_cell_skips_the_row() {
        use crate::{questions::convert, sheets::Sheet, Config};
        use calamine::CellErrorType;

        let header = [
            Data::String("№ Вопроса".to_owned()),
            Data::String("Текст".to_owned()),
        ];
        let broken = [
            Data::Error(CellErrorType::NA),
            Data::String("Вопрос".to_owned()),
        ];
        let raw = RawSheet {
            id: "Лист1".to_owned(),
            start_row: 0,
            data: vec![
                header.iter().map(RawCellData::from).collect(),
                broken.iter().map(RawCellData::from).collect(),
            ],
        };

        let conversion = convert(&Sheet::try_from(raw).unwrap(), &Config::default()).unwrap();
        assert!(conversion.tree.questions.is_empty());
        assert_eq!(conversion.warnings.len(), 1);
        assert!(conversion.warnings[0].contains("Row 2"));
    }

    #[test]
    fn sheet_selection() {
        let book = || RawWorkbook {
            sheets: vec![
                RawSheet {
                    id: "first".to_owned(),
                    start_row: 0,
                    data: vec![],
                },
                RawSheet {
                    id: "second".to_owned(),
                    start_row: 0,
                    data: vec![],
                },
            ],
        };

        assert_eq!(book().sheet_names(), vec!["first", "second"]);
        assert_eq!(book().take_sheet(None).unwrap().id, "first");
        assert_eq!(book().take_sheet(Some("second")).unwrap().id, "second");
        assert!(matches!(
            book().take_sheet(Some("third")),
            Err(ConvertError::SheetNotFound(_))
        ));
    }

    #[test]
    fn json_workbook_from_disk() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        let text = r#"{"sheets": [{"id": "Лист1", "data": [["№ Вопроса"], [1]]}]}"#;
        std::io::Write::write_all(&mut file, text.as_bytes()).unwrap();

        let book = load_workbook(file.path()).unwrap();
        assert_eq!(book.sheet_names(), vec!["Лист1"]);
        assert_eq!(book.sheets[0].data[1], vec![RawCellData::Int(1)]);
        assert_eq!(book.sheets[0].start_row, 0);
    }
}
