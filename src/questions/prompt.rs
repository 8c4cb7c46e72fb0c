//! Prompt text → prompt variants.
//!
//! A single reconciliation rule is used for the two prompt columns: the
//! tuning text wins when it is a numbered list, then the main text when it
//! is one. Otherwise the first non-blank of the two becomes one variant.
//! Every variant carries the same text for voice and chat.

use super::PromptVariant;
use crate::sheets::parse::split_numbered;

/// A single variant holding the trimmed text, nothing for blank text
pub fn single_variant(text: &str) -> Vec<PromptVariant> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    vec![PromptVariant::same(text)]
}

pub fn make_prompt(tuning: &str, main: &str) -> Vec<PromptVariant> {
    let (tuning, main) = (tuning.trim(), main.trim());

    if let Some(items) = split_numbered(tuning).or_else(|| split_numbered(main)) {
        return items.into_iter().map(PromptVariant::same).collect();
    }

    single_variant(if tuning.is_empty() { main } else { tuning })
}

/// Answer choices: a numbered list, else one choice per non-blank line,
/// else the whole text as one choice
pub fn make_variants(text: &str) -> Vec<PromptVariant> {
    if let Some(items) = split_numbered(text) {
        return items.into_iter().map(PromptVariant::same).collect();
    }

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() > 1 {
        return lines.into_iter().map(PromptVariant::same).collect();
    }

    single_variant(text)
}
