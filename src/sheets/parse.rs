//! Contains parsers for numbered prompt lists and question ids

use nom::{
    character::complete::{char, digit1, multispace0},
    combinator::{map, map_res, opt, recognize},
    error::VerboseError,
    sequence::{pair, preceded, tuple},
};

type VerboseResult<I, O, E> = Result<(I, O), nom::Err<VerboseError<E>>>;

/// Ordering key of a question id: ids with a leading `major[.minor]`
/// number come first, everything else after them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IdKey<'a> {
    Numeric(u64, u64, &'a str),
    Text(&'a str),
}

// `12.` together with any whitespace after it
fn item_marker(i: &str) -> VerboseResult<&str, &str, &str> {
    recognize(tuple((digit1, char('.'), multispace0)))(i)
}

fn number(i: &str) -> VerboseResult<&str, u64, &str> {
    map_res(digit1, |s: &str| s.parse::<u64>())(i)
}

fn numeric_prefix(i: &str) -> VerboseResult<&str, (u64, u64), &str> {
    map(
        pair(number, opt(preceded(char('.'), number))),
        |(major, minor)| (major, minor.unwrap_or(0)),
    )(i)
}

/// Byte offset of the next item marker and the input following it
fn find_marker(text: &str) -> Option<(usize, &str)> {
    text.char_indices()
        .find_map(|(pos, _)| item_marker(&text[pos..]).ok().map(|(rest, _)| (pos, rest)))
}

/// True if `text` contains a digit directly followed by a `.`
pub fn is_numbered(text: &str) -> bool {
    find_marker(text).is_some()
}

/// Splits `"1. foo 2. bar"` into `["foo", "bar"]`.
///
/// Returns `None` when the text holds no item marker at all. Any run of
/// digits followed by a dot counts as a marker, wherever it appears, so
/// `"01."` and `"12."` split too and `"3.14"` yields `["14"]`. Segments
/// are trimmed and blank ones dropped, which also swallows text before
/// the first marker if it is blank.
pub fn split_numbered(text: &str) -> Option<Vec<String>> {
    let (first, mut rest) = find_marker(text)?;
    let mut segments = vec![&text[..first]];

    while let Some((pos, after)) = find_marker(rest) {
        segments.push(&rest[..pos]);
        rest = after;
    }
    segments.push(rest);

    Some(
        segments
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    )
}

pub fn id_key(id: &str) -> IdKey<'_> {
    match numeric_prefix(id.trim()) {
        Ok((_, (major, minor))) => IdKey::Numeric(major, minor, id),
        Err(_) => IdKey::Text(id),
    }
}
