//! Delimiter scanning shared by the recognizers

/// Byte index of the delimiter closing the one at `open_at`.
///
/// Delimiters inside quoted strings are ignored; a backslash escapes the
/// next character within a string. Returns `None` when the text ends first.
pub(crate) fn find_closing(
    text: &str,
    open_at: usize,
    open: char,
    close: char,
    quotes: &[char],
) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in text[open_at..].char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }

        if quotes.contains(&c) {
            in_string = Some(c);
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(open_at + offset);
            }
        }
    }

    None
}
