//! Re-applying sheet prompts onto an exported tree, and comparing the ids
//! of both.
//!
//! The tree is handled as raw JSON so that fields this crate does not
//! know about, and their order, survive the round trip.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};

use super::{
    prompt::{make_prompt, single_variant},
    push_warning, QuestionType,
};
use crate::{
    config::{Columns, Config},
    error::ConvertError,
    sheets::{cell::Cell, parse::id_key, Row, Sheet},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub tree: Value,
    /// Questions and subquestions whose prompts were replaced
    pub updated: usize,
    pub warnings: Vec<String>,
}

/// Ids found on one side only
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub only_in_sheet: Vec<String>,
    pub only_in_json: Vec<String>,
}

impl Validation {
    pub fn is_consistent(&self) -> bool {
        self.only_in_sheet.is_empty() && self.only_in_json.is_empty()
    }
}

const SHAPE: &str = "expected `[{\"0\": [question objects]}]` at the root";

fn top_level(tree: &Value) -> Option<&Vec<Value>> {
    tree.as_array()?.first()?.get("0")?.as_array()
}

fn top_level_mut(tree: &mut Value) -> Option<&mut Vec<Value>> {
    tree.as_array_mut()?
        .first_mut()?
        .get_mut("0")?
        .as_array_mut()
}

fn subquestions_ok(question: &Value) -> bool {
    match question.get("subquestions") {
        None | Some(Value::Null) => true,
        Some(Value::Array(subs)) => subs.iter().all(Value::is_object),
        Some(_) => false,
    }
}

/// Parses an exported tree and checks its shape
pub fn parse_tree(text: &str) -> Result<Value, ConvertError> {
    let tree: Value = serde_json::from_str(text)?;
    let questions = top_level(&tree).ok_or(ConvertError::MalformedTree(SHAPE))?;
    if !questions.iter().all(|q| q.is_object() && subquestions_ok(q)) {
        return Err(ConvertError::MalformedTree(
            "questions and subquestions must be objects",
        ));
    }
    Ok(tree)
}

/// Reads an id field, accepting numbers the way sheet cells are formatted
fn id_of(question: &Map<String, Value>, key: &str) -> Option<String> {
    let cell = match question.get(key)? {
        Value::String(s) => Cell::Text(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Cell::Int(i),
            None => Cell::Float(n.as_f64()?),
        },
        _ => return None,
    };
    Some(cell.format_id()).filter(|id| !id.is_empty())
}

/// Calls `f` with the id field name and object of every question and
/// subquestion, parents before their children
fn for_each_question(tree: &mut Value, mut f: impl FnMut(&'static str, &mut Map<String, Value>)) {
    for question in top_level_mut(tree).into_iter().flatten() {
        let Some(question) = question.as_object_mut() else {
            continue;
        };
        f("question_id", question);

        if let Some(subs) = question.get_mut("subquestions").and_then(Value::as_array_mut) {
            for sub in subs.iter_mut().filter_map(Value::as_object_mut) {
                f("subquestion_id", sub);
            }
        }
    }
}

fn tree_ids(tree: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    for question in top_level(tree).into_iter().flatten() {
        let Some(question) = question.as_object() else {
            continue;
        };
        ids.extend(id_of(question, "question_id"));

        let subs = question.get("subquestions").and_then(Value::as_array);
        for sub in subs.into_iter().flatten().filter_map(Value::as_object) {
            ids.extend(id_of(sub, "subquestion_id"));
        }
    }
    ids
}

/// Sheet rows by question id; a repeated id keeps its last row
fn rows_by_id<'a>(
    sheet: &'a Sheet,
    config: &Config,
) -> Result<HashMap<String, &'a Row>, ConvertError> {
    let id_column = sheet
        .find_column(&config.question_id_labels)
        .ok_or_else(|| ConvertError::MissingQuestionColumn(sheet.headers.clone()))?;

    Ok(sheet
        .rows
        .iter()
        .filter_map(|row| {
            let id = row.get(id_column).format_id();
            (!id.is_empty()).then_some((id, row))
        })
        .collect())
}

fn apply_row(
    question: &mut Map<String, Value>,
    row: &Row,
    columns: &Columns,
) -> Result<(), ConvertError> {
    let prompt = make_prompt(&row.text(&columns.tuning), &row.text(&columns.text));
    question.insert("prompt".to_owned(), serde_json::to_value(prompt)?);

    let has_variants = question
        .get("type_questions")
        .and_then(Value::as_str)
        .map(|code| QuestionType::from_code(code).has_variants())
        .unwrap_or(false);
    if has_variants {
        let variants = single_variant(&row.text(&columns.answer_variants));
        question.insert("variatns_prompt".to_owned(), serde_json::to_value(variants)?);
    }
    Ok(())
}

/// Overwrites prompts in a copy of `tree` from the matching sheet rows.
///
/// Questions whose id is not in the sheet are left as they are, and only
/// `prompt` (plus `variatns_prompt` for variant questions) is touched on
/// the others.
pub fn transfer(tree: &Value, sheet: &Sheet, config: &Config) -> Result<Transfer, ConvertError> {
    if top_level(tree).is_none() {
        return Err(ConvertError::MalformedTree(SHAPE));
    }
    let rows = rows_by_id(sheet, config)?;

    let mut tree = tree.clone();
    let mut updated = 0;
    let mut seen = BTreeSet::new();
    let mut failure = None;

    for_each_question(&mut tree, |key, question| {
        if failure.is_some() {
            return;
        }
        let Some(id) = id_of(question, key) else {
            return;
        };
        match rows.get(&id) {
            Some(row) => match apply_row(question, row, &config.columns) {
                Ok(()) => updated += 1,
                Err(e) => failure = Some(e),
            },
            None => tracing::debug!(id = %id, "no sheet row, prompt kept"),
        }
        seen.insert(id);
    });
    if let Some(e) = failure {
        return Err(e);
    }

    let mut missing: Vec<&String> = rows.keys().filter(|id| !seen.contains(*id)).collect();
    missing.sort_by(|a, b| id_key(a).cmp(&id_key(b)));
    let mut warnings = Vec::new();
    for id in missing {
        push_warning(
            &mut warnings,
            format!("Question {id} from the sheet is not in the JSON"),
        );
    }
    tracing::info!(updated, "prompts re-applied from sheet `{}`", sheet.id);

    Ok(Transfer {
        tree,
        updated,
        warnings,
    })
}

/// Compares the question ids of a sheet with those of an exported tree
pub fn validate(tree: &Value, sheet: &Sheet, config: &Config) -> Result<Validation, ConvertError> {
    if top_level(tree).is_none() {
        return Err(ConvertError::MalformedTree(SHAPE));
    }
    let sheet_ids: BTreeSet<String> = rows_by_id(sheet, config)?.into_keys().collect();
    let json_ids: BTreeSet<String> = tree_ids(tree).into_iter().collect();

    let sorted = |ids: Vec<String>| {
        let mut ids = ids;
        ids.sort_by(|a, b| id_key(a).cmp(&id_key(b)));
        ids
    };

    Ok(Validation {
        only_in_sheet: sorted(sheet_ids.difference(&json_ids).cloned().collect()),
        only_in_json: sorted(json_ids.difference(&sheet_ids).cloned().collect()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawCellData, RawSheet};
    use serde_json::json;

    fn s(v: &str) -> RawCellData {
        RawCellData::String(v.to_owned())
    }

    fn sheet(rows: Vec<Vec<RawCellData>>) -> Sheet {
        let mut data = vec![vec![
            s("№ Вопроса"),
            s("Тюнинг"),
            s("Текст"),
            s("Варианты ответов"),
        ]];
        data.extend(rows);
        Sheet::try_from(RawSheet {
            id: "Лист1".to_owned(),
            start_row: 0,
            data,
        })
        .unwrap()
    }

    fn tree() -> Value {
        json!([{"0": [
            {
                "question_id": "1",
                "type_questions": "variants",
                "nlu_tag": "x",
                "prompt": [{"text": "old", "text_chat": "old"}],
                "variatns_prompt": [],
                "next_question_id": "2",
                "subquestions": [
                    {"type_questions": "rating", "prompt": [], "subquestion_id": "1.1"}
                ]
            },
            {
                "question_id": 2,
                "type_questions": "yes_no",
                "nlu_tag": "y",
                "prompt": [{"text": "keep", "text_chat": "keep"}]
            }
        ]}])
    }

    #[test]
    fn overwrites_matching_prompts_only() {
        let sheet = sheet(vec![
            vec![RawCellData::Float(1.0), s(""), s("1. Новый 2. Второй"), s("Да или нет")],
            vec![s("1.1"), s("Оцените"), s("ignored")],
        ]);
        let result = transfer(&tree(), &sheet, &Config::default()).unwrap();
        let q = &result.tree[0]["0"][0];

        assert_eq!(result.updated, 2);
        assert!(result.warnings.is_empty());
        assert_eq!(
            q["prompt"],
            json!([
                {"text": "Новый", "text_chat": "Новый"},
                {"text": "Второй", "text_chat": "Второй"}
            ])
        );
        assert_eq!(
            q["variatns_prompt"],
            json!([{"text": "Да или нет", "text_chat": "Да или нет"}])
        );
        assert_eq!(q["nlu_tag"], "x");
        assert_eq!(q["next_question_id"], "2");
        assert_eq!(
            q["subquestions"][0]["prompt"],
            json!([{"text": "Оцените", "text_chat": "Оцените"}])
        );
        assert!(q["subquestions"][0].get("variatns_prompt").is_none());
    }

    #[test]
    fn missing_ids_are_untouched() {
        let sheet = sheet(vec![vec![s("1"), s(""), s("new")]]);
        let result = transfer(&tree(), &sheet, &Config::default()).unwrap();
        let second = &result.tree[0]["0"][1];

        assert_eq!(second, &tree()[0]["0"][1]);
        assert_eq!(second["nlu_tag"], "y");
    }

    #[test]
    fn blank_variants_clear_the_list() {
        let sheet = sheet(vec![vec![s("1"), s(""), s("new"), s("  ")]]);
        let result = transfer(&tree(), &sheet, &Config::default()).unwrap();
        assert_eq!(result.tree[0]["0"][0]["variatns_prompt"], json!([]));
    }

    #[test]
    fn input_tree_is_not_modified() {
        let original = tree();
        let sheet = sheet(vec![vec![s("2"), s("Тюнинг"), s("")]]);
        let result = transfer(&original, &sheet, &Config::default()).unwrap();

        assert_eq!(original, tree());
        assert_ne!(result.tree, original);
        assert_eq!(
            result.tree[0]["0"][1]["prompt"],
            json!([{"text": "Тюнинг", "text_chat": "Тюнинг"}])
        );
    }

    #[test]
    fn sheet_ids_missing_from_json_warn() {
        let sheet = sheet(vec![vec![s("7"), s(""), s("x")], vec![s("3"), s(""), s("y")]]);
        let result = transfer(&tree(), &sheet, &Config::default()).unwrap();
        assert_eq!(result.updated, 0);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains(" 3 "));
    }

    #[test]
    fn key_order_is_preserved() {
        let sheet = sheet(vec![vec![s("1"), s(""), s("new")]]);
        let result = transfer(&tree(), &sheet, &Config::default()).unwrap();
        let keys: Vec<&String> = result.tree[0]["0"][0].as_object().unwrap().keys().collect();
        let original = tree();
        let expected: Vec<&String> = original[0]["0"][0].as_object().unwrap().keys().collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn malformed_trees_rejected() {
        assert!(matches!(parse_tree("{\"0\": []}"), Err(ConvertError::MalformedTree(_))));
        assert!(matches!(parse_tree("[{\"0\": [1]}]"), Err(ConvertError::MalformedTree(_))));
        assert!(matches!(
            parse_tree("[{\"0\": [{\"subquestions\": 5}]}]"),
            Err(ConvertError::MalformedTree(_))
        ));
        assert!(matches!(parse_tree("[{"), Err(ConvertError::Json(_))));
        assert!(parse_tree("[{\"0\": []}]").is_ok());

        let sheet = sheet(vec![]);
        assert!(matches!(
            transfer(&json!({}), &sheet, &Config::default()),
            Err(ConvertError::MalformedTree(_))
        ));
    }

    #[test]
    fn validation_reports_both_sides() {
        let sheet = sheet(vec![
            vec![s("1")],
            vec![s("1.1")],
            vec![s("10")],
            vec![s("3")],
        ]);
        let validation = validate(&tree(), &sheet, &Config::default()).unwrap();

        assert_eq!(validation.only_in_sheet, vec!["3", "10"]);
        assert_eq!(validation.only_in_json, vec!["2"]);
        assert!(!validation.is_consistent());
    }

    #[test]
    fn missing_id_column_aborts() {
        let raw = RawSheet {
            id: "x".to_owned(),
            start_row: 0,
            data: vec![vec![s("Текст")], vec![s("a")]],
        };
        let sheet = Sheet::try_from(raw).unwrap();
        assert!(matches!(
            validate(&tree(), &sheet, &Config::default()),
            Err(ConvertError::MissingQuestionColumn(_))
        ));
    }
}
