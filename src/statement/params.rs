//! Placeholder scanning.
//!
//! A placeholder is `$` followed by one or more decimal digits. String
//! literals and comments are not recognized, so a `$3` inside quotes counts.
//! A digit run too long for `usize` is read as `usize::MAX`.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Iterates over the indices of all `$n` placeholders in order of appearance.
fn placeholders(text: &str) -> impl Iterator<Item = usize> + '_ {
    let bytes = text.as_bytes();
    let mut pos = 0;

    std::iter::from_fn(move || {
        while pos < bytes.len() {
            if bytes[pos] == b'$' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) {
                pos += 1;
                let mut value = Some(0usize);
                while let Some(digit) = bytes.get(pos).filter(|b| b.is_ascii_digit()) {
                    value = value
                        .and_then(|v| v.checked_mul(10))
                        .and_then(|v| v.checked_add(usize::from(digit - b'0')));
                    pos += 1;
                }
                return Some(value.unwrap_or(usize::MAX));
            }
            pos += 1;
        }
        None
    })
}

/// Returns the highest placeholder index in `text`, or 0 if there is none.
///
/// This is the statement's arity; placeholders are assumed to be contiguous
/// from `$1`.
pub fn count_parameters(text: &str) -> usize {
    placeholders(text).max().unwrap_or(0)
}

/// Returns the ranges of indices in `1..=count_parameters(text)` that never appear.
///
/// Work is bounded by the number of distinct placeholders, not by the highest index.
pub fn missing_placeholders(text: &str) -> Vec<RangeInclusive<usize>> {
    let seen: BTreeSet<usize> = placeholders(text).filter(|&i| i > 0).collect();
    let highest = seen.last().copied().unwrap_or(0);
    if seen.len() == highest {
        return Vec::new();
    }

    let mut gaps = Vec::new();
    let mut previous = 0;
    for &index in &seen {
        if index > previous + 1 {
            gaps.push(previous + 1..=index - 1);
        }
        previous = index;
    }
    gaps
}
