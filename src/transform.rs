//! Capture groups to new file name.
//!
//! Every capture group of a match is read as a number, shifted by the delta, and written back in its original format.
//! Replacements are collected against the untouched name first and merged in one pass afterwards,
//! so a group growing or shrinking never shifts the position of any other group.

use std::ops::Range;

use owo_colors::OwoColorize;
use regex::Captures;

use crate::{error::{Error, Result},
            number::{format_number, infer_format, Number}};

/// New text for one capture group's span of the original name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub span: Range<usize>,
    pub text: String,
}

/// New file name for `file_name`, given its `captures` and the `delta` to apply.
///
/// `captures` must come from matching against `file_name` itself.
/// Groups that aren't numbers are logged and left as they were.
pub fn transform(file_name: &str, captures: &Captures, delta: Number) -> String {
    splice(file_name, replacements(captures, delta))
}

/// One [`Replacement`] per participating capture group that holds a number.
#[tracing::instrument(skip(captures), fields(groups = captures.len() - 1))]
pub fn replacements(captures: &Captures, delta: Number) -> Vec<Replacement> {
    captures.iter()
            .enumerate()
            .skip(1)
            .filter_map(|(group, m)| {
                // Guard: optional group that didn't take part in the match
                let Some(m) = m else {
                    tracing::trace!("group {} did not participate", group);
                    return None;
                };
                match shift_literal(m.as_str(), delta) {
                    Ok(text) => {
                        tracing::debug!("group {}: {} ~~> {}", group, m.as_str().green(), text.blue());
                        Some(Replacement { span: m.range(), text })
                    }
                    Err(e) => {
                        tracing::error!("group {}: {}", group, e);
                        None
                    }
                }
            })
            .collect()
}

/// Add `delta` to a numeric literal, keeping the literal's padding and precision.
///
/// ```
/// use numincrement::{number::Number, transform::shift_literal};
/// assert_eq!(shift_literal("009", Number::ONE).unwrap(), "010");
/// ```
pub fn shift_literal(literal: &str, delta: Number) -> Result<String> {
    let format = infer_format(literal);
    let value: Number = literal.parse()?;
    let shifted = value.checked_add(delta).ok_or_else(|| Error::Overflow { text: literal.to_owned() })?;
    Ok(format_number(format, shifted))
}

/// Build `text` with each replacement swapped in for its span.
///
/// Spans refer to the original `text`. A span overlapping one already written (nested groups) is dropped;
/// on equal starts the replacement listed first wins.
pub fn splice(text: &str, mut replacements: Vec<Replacement>) -> String {
    replacements.sort_by_key(|r| r.span.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for r in replacements {
        if r.span.start < cursor {
            tracing::warn!("replacement for {:?} overlaps an earlier group, ignoring it", &text[r.span.clone()]);
            continue;
        }
        out.push_str(&text[cursor..r.span.start]);
        out.push_str(&r.text);
        cursor = r.span.end;
    }
    out.push_str(&text[cursor..]);
    out
}
