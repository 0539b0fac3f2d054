//! Lexical command classification.
//!
//! Looks at no more than the first two non-space characters. This is a sniff,
//! not a parser: a command whose keyword merely starts with a known letter is
//! classified by that letter.

use super::CommandKind;

/// Maps command text to its kind, or `None` if it cannot be classified.
///
/// `WITH` (a common table expression) is treated as a SELECT. `D` is resolved
/// by the second character: `E` for DELETE, `R` for DROP.
pub fn classify_command(text: &str) -> Option<CommandKind> {
    let mut chars = text.trim_start().chars();
    let first = chars.next()?.to_ascii_uppercase();

    match first {
        'S' | 'W' => Some(CommandKind::Select),
        'I' => Some(CommandKind::Insert),
        'U' => Some(CommandKind::Update),
        'C' => Some(CommandKind::Create),
        'A' => Some(CommandKind::Alter),
        'T' => Some(CommandKind::Truncate),
        'D' => match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('E') => Some(CommandKind::Delete),
            Some('R') => Some(CommandKind::Drop),
            _ => None,
        },
        _ => None,
    }
}
