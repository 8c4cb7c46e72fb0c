//! Survey question sheets → question tree JSON for the delivery system

pub mod config;
pub mod data;
pub mod error;
pub mod questions;
pub mod sheets;

pub use config::Config;
pub use error::ConvertError;
pub use questions::{convert, parse_tree, transfer, validate, Conversion, QuestionTree};
pub use sheets::Sheet;

/// Loads `path` and takes the named (or first) sheet out of it
pub fn load_sheet(
    path: impl AsRef<std::path::Path>,
    name: Option<&str>,
) -> Result<Sheet, ConvertError> {
    let raw = data::load_workbook(path)?.take_sheet(name)?;
    Sheet::try_from(raw)
}
