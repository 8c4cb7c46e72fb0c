//! Column naming, overridable from a JSON file

use std::path::Path;

use serde::Deserialize;

use crate::error::ConvertError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Header labels accepted for the question number column, matched
    /// case-insensitively either exactly or as a substring
    pub question_id_labels: Vec<String>,
    pub columns: Columns,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Columns {
    #[serde(rename = "type")]
    pub kind: String,
    pub rotation: String,
    pub tag: String,
    pub intents: String,
    pub entities: String,
    pub tuning: String,
    pub text: String,
    pub answer_variants: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_id_labels: ["№. Вопроса", "№ Вопроса", "Номер вопроса"]
                .into_iter()
                .map(String::from)
                .collect(),
            columns: Columns::default(),
        }
    }
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            kind: "Тип вопроса".to_owned(),
            rotation: "Ротация".to_owned(),
            tag: "Тег".to_owned(),
            intents: "Интенты".to_owned(),
            entities: "Сущности".to_owned(),
            tuning: "Тюнинг".to_owned(),
            text: "Текст".to_owned(),
            answer_variants: "Варианты ответов".to_owned(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        if config.question_id_labels.iter().all(|l| l.trim().is_empty()) {
            return Err(ConvertError::Config(
                "`question_id_labels` needs at least one non-blank label".to_owned(),
            ));
        }
        Ok(config)
    }
}
