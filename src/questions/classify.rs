//! Row → question record

use serde_json::Value;

use super::{
    prompt::{make_prompt, make_variants},
    Annotations, Answers, DeliveryFlags, QuestionBody, QuestionType, Record, TypeExtras,
};
use crate::{
    config::Columns,
    sheets::{cell::Cell, Row},
};

/// Parses a multi-line annotation cell.
///
/// Each non-blank line is either `key: value` (split on the first colon)
/// or a bare value keyed by its 1-based position among non-blank lines.
/// Non-text and blank cells give `None`.
pub fn parse_answers(cell: &Cell) -> Option<Annotations> {
    let Cell::Text(text) = cell else {
        return None;
    };

    let mut result = Annotations::new();
    for (n, line) in text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
    {
        let (key, value) = match line.split_once(':') {
            Some((key, value)) => (key.trim().to_owned(), value.trim()),
            None => ((n + 1).to_string(), line),
        };
        result.insert(key, Value::String(value.to_owned()));
    }

    (!result.is_empty()).then_some(result)
}

fn is_rotation(cell: &Cell) -> bool {
    match cell {
        Cell::Bool(b) => *b,
        other => other.to_string().trim().to_lowercase() == "true",
    }
}

fn extras_for(kind: &QuestionType, row: &Row, columns: &Columns) -> Option<TypeExtras> {
    match kind {
        QuestionType::Rating => Some(TypeExtras::Rating {
            rating_grammar: None,
            max_rate: None,
            is_zero: None,
        }),
        QuestionType::Variants | QuestionType::VariantsWithOther => Some(TypeExtras::Variants {
            sound_variants: true,
            variants_prompt: make_variants(&row.text(&columns.answer_variants)),
        }),
        QuestionType::YesNo => Some(TypeExtras::YesNo {
            is_additional_other: false,
        }),
        _ => None,
    }
}

/// Classifies one row; `None` when the row has no question number
pub fn classify_row(row: &Row, columns: &Columns, id_column: &str) -> Option<Record> {
    let id = row.get(id_column).format_id();
    if id.is_empty() {
        return None;
    }

    let kind = QuestionType::from_label(&row.text(&columns.kind));
    let tag = row.text(&columns.tag).trim().to_owned();
    let extras = extras_for(&kind, row, columns);

    let body = QuestionBody {
        is_rotation: is_rotation(row.get(&columns.rotation)),
        nlu_tag: (!tag.is_empty()).then_some(tag),
        answers: Answers {
            intents: parse_answers(row.get(&columns.intents)),
            entities: parse_answers(row.get(&columns.entities)),
        },
        prompt: make_prompt(&row.text(&columns.tuning), &row.text(&columns.text)),
        flags: DeliveryFlags::default(),
        kind,
        extras,
    };
    tracing::debug!(id = %id, kind = %body.kind, line = row.line, "classified row");

    Some(Record { id, body })
}
