use std::fmt::{self, Display};

use derive_more::{From, IsVariant};

use crate::data::RawCellData;

/// A single cell value after loading
#[derive(Debug, Clone, PartialEq, From, IsVariant)]
pub enum Cell {
    #[from(ignore)]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

// Floats past this magnitude are printed through `f64`'s own formatting
const EXACT_INT_LIMIT: f64 = 9.0e15;

impl Cell {
    /// Renders the cell as a question id.
    ///
    /// Integral numbers lose their decimal point, other numbers keep only
    /// significant digits and text is trimmed. An empty string means the
    /// row carries no id.
    pub fn format_id(&self) -> String {
        self.to_string().trim().to_owned()
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(x) if x.fract() == 0.0 && x.abs() < EXACT_INT_LIMIT => {
                write!(f, "{}", *x as i64)
            }
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<RawCellData> for Cell {
    fn from(value: RawCellData) -> Self {
        match value {
            RawCellData::String(s) => Cell::Text(s),
            RawCellData::Int(i) => Cell::Int(i),
            RawCellData::Float(f) if f.is_nan() => Cell::Empty,
            RawCellData::Float(f) => Cell::Float(f),
            RawCellData::Bool(b) => Cell::Bool(b),
            RawCellData::Empty => Cell::Empty,
        }
    }
}
