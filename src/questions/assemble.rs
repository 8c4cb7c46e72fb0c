//! Flat records → top-level questions owning their subquestions

use super::{push_warning, Question, Record, Subquestion};
use crate::sheets::parse::id_key;

/// Builds the question list from records in sheet order.
///
/// Ids without a dot become top-level questions. Dotted ids are attached,
/// in sheet order, to the top-level question named by the part before the
/// first dot, wherever that question appears in the sheet. Subquestions
/// without such a parent are dropped with a warning. The result is sorted
/// by [`id_key`].
pub fn assemble(records: Vec<Record>) -> (Vec<Question>, Vec<String>) {
    let mut warnings = Vec::new();
    let (subs, tops): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| r.id.contains('.'));

    let mut questions: Vec<Question> = Vec::with_capacity(tops.len());
    for record in tops {
        if questions.iter().any(|q| q.question_id == record.id) {
            push_warning(
                &mut warnings,
                format!("Question {} appears more than once", record.id),
            );
        }
        questions.push(Question::new(record.id, record.body));
    }

    for record in subs {
        let parent_id = record.id.split('.').next().unwrap_or_default();
        match questions.iter_mut().find(|q| q.question_id == parent_id) {
            Some(parent) => parent.subquestions.push(Subquestion {
                body: record.body,
                subquestion_id: record.id,
            }),
            None => push_warning(
                &mut warnings,
                format!(
                    "Subquestion {} has no parent question {}",
                    record.id, parent_id
                ),
            ),
        }
    }

    questions.sort_by(|a, b| id_key(&a.question_id).cmp(&id_key(&b.question_id)));
    (questions, warnings)
}
