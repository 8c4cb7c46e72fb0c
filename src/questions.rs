//! Question records and the sheet → question tree conversion

pub mod assemble;
pub mod classify;
pub mod prompt;
pub mod transfer;

use derive_more::Display;
use serde::{ser::SerializeSeq, Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use self::{assemble::assemble, classify::classify_row};
use crate::{config::Config, error::ConvertError, sheets::Sheet};

pub use self::transfer::{parse_tree, transfer, validate, Transfer, Validation};

/// `key: value` pairs of an answer annotation cell, in sheet order
pub type Annotations = Map<String, Value>;

/// Question type code, mapped from the Russian label in the sheet.
/// Labels outside the known set are kept as they are.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum QuestionType {
    #[display(fmt = "rating")]
    Rating,
    #[display(fmt = "subquestions")]
    Subquestions,
    #[display(fmt = "yes_no")]
    YesNo,
    #[display(fmt = "variants")]
    Variants,
    #[display(fmt = "variants_with_other")]
    VariantsWithOther,
    #[display(fmt = "age")]
    Age,
    #[display(fmt = "gender")]
    Gender,
    #[display(fmt = "city")]
    City,
    #[display(fmt = "{}", _0)]
    Other(String),
}

impl QuestionType {
    /// Maps a sheet label such as `"Да/Нет"`; the label is trimmed and
    /// lower-cased first and that form is kept for unknown labels
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        match &label[..] {
            "рейтинг" => Self::Rating,
            "подвопросы" => Self::Subquestions,
            "да/нет" => Self::YesNo,
            "варианты" => Self::Variants,
            "варианты с иное" => Self::VariantsWithOther,
            "возраст" => Self::Age,
            "пол" => Self::Gender,
            "город" => Self::City,
            _ => Self::Other(label),
        }
    }

    /// Reads back a code as written by [`Display`]
    pub fn from_code(code: &str) -> Self {
        match code {
            "rating" => Self::Rating,
            "subquestions" => Self::Subquestions,
            "yes_no" => Self::YesNo,
            "variants" => Self::Variants,
            "variants_with_other" => Self::VariantsWithOther,
            "age" => Self::Age,
            "gender" => Self::Gender,
            "city" => Self::City,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn has_variants(&self) -> bool {
        matches!(self, Self::Variants | Self::VariantsWithOther)
    }
}

impl Serialize for QuestionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One phrasing of a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptVariant {
    pub text: String,
    pub text_chat: String,
}

impl PromptVariant {
    /// The same text for voice and chat
    pub fn same(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            text_chat: text.clone(),
            text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Answers {
    pub intents: Option<Annotations>,
    pub entities: Option<Annotations>,
}

/// Behaviour flags filled in later by the delivery system
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryFlags {
    pub navigation: Option<Value>,
    pub is_depending_questions: Option<bool>,
    pub visible: bool,
    pub need_stop: Option<bool>,
    pub stop_ask: Option<String>,
    pub stop_count: Option<u32>,
    pub no_answer: Option<String>,
    pub need_replaced: bool,
    #[serde(rename = "severel_variants")]
    pub several_variants: Option<bool>,
    pub need_sbg: bool,
}

impl Default for DeliveryFlags {
    fn default() -> Self {
        Self {
            navigation: None,
            is_depending_questions: None,
            visible: true,
            need_stop: None,
            stop_ask: None,
            stop_count: None,
            no_answer: None,
            need_replaced: false,
            several_variants: None,
            need_sbg: false,
        }
    }
}

/// Fields only some question types carry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypeExtras {
    Rating {
        rating_grammar: Option<String>,
        max_rate: Option<u32>,
        is_zero: Option<bool>,
    },
    Variants {
        sound_variants: bool,
        #[serde(rename = "variatns_prompt")]
        variants_prompt: Vec<PromptVariant>,
    },
    YesNo {
        is_additional_other: bool,
    },
}

/// Everything a top-level question and a subquestion have in common
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionBody {
    #[serde(rename = "type_questions")]
    pub kind: QuestionType,
    pub is_rotation: bool,
    pub nlu_tag: Option<String>,
    pub answers: Answers,
    pub prompt: Vec<PromptVariant>,
    #[serde(flatten)]
    pub flags: DeliveryFlags,
    #[serde(flatten)]
    pub extras: Option<TypeExtras>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub question_id: String,
    #[serde(flatten)]
    pub body: QuestionBody,
    pub next_question_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subquestions: Vec<Subquestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Subquestion {
    #[serde(flatten)]
    pub body: QuestionBody,
    pub subquestion_id: String,
}

impl Question {
    pub fn new(question_id: String, body: QuestionBody) -> Self {
        let next_question_id = question_id
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_add(1))
            .map(|n| n.to_string());

        Self {
            question_id,
            body,
            next_question_id,
            subquestions: Vec::new(),
        }
    }
}

/// A classified sheet row, not yet placed in the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub body: QuestionBody,
}

/// The exported document, serialized as `[{"0": [questions...]}]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionTree {
    pub questions: Vec<Question>,
}

#[derive(Serialize)]
struct TreeRoot<'a> {
    #[serde(rename = "0")]
    questions: &'a [Question],
}

impl Serialize for QuestionTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&TreeRoot {
            questions: &self.questions,
        })?;
        seq.end()
    }
}

impl QuestionTree {
    /// Pretty JSON with two-space indentation, non-ASCII left as is
    pub fn to_json(&self) -> Result<String, ConvertError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub tree: QuestionTree,
    pub warnings: Vec<String>,
}

pub(crate) fn push_warning(warnings: &mut Vec<String>, warning: String) {
    tracing::warn!("{warning}");
    warnings.push(warning);
}

/// Converts every row of `sheet` into the question tree.
///
/// Only a missing question number column aborts; rows without an id and
/// subquestions without a parent end up as warnings.
pub fn convert(sheet: &Sheet, config: &Config) -> Result<Conversion, ConvertError> {
    let id_column = sheet
        .find_column(&config.question_id_labels)
        .ok_or_else(|| ConvertError::MissingQuestionColumn(sheet.headers.clone()))?;
    tracing::debug!(column = id_column, sheet = %sheet.id, "question number column");

    let mut warnings = Vec::new();
    let mut records = Vec::with_capacity(sheet.rows.len());
    for row in &sheet.rows {
        match classify_row(row, &config.columns, id_column) {
            Some(record) => records.push(record),
            None => push_warning(
                &mut warnings,
                format!("Row {} has no question number and was skipped", row.line),
            ),
        }
    }

    let (questions, mut assembly_warnings) = assemble(records);
    warnings.append(&mut assembly_warnings);
    tracing::info!(
        questions = questions.len(),
        warnings = warnings.len(),
        "converted sheet `{}`",
        sheet.id
    );

    Ok(Conversion {
        tree: QuestionTree { questions },
        warnings,
    })
}
