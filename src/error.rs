use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Question number column not found, headers were {0:?}")]
    MissingQuestionColumn(Vec<String>),
    #[error("Sheet `{0}` not found")]
    SheetNotFound(String),
    #[error("Sheet `{0}` has no header row")]
    EmptySheet(String),
    #[error("Malformed question tree: {0}")]
    MalformedTree(&'static str),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Workbook(#[from] calamine::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
