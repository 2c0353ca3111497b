//! `name(key=value, ...)` call expressions

use regex::Regex;
use serde_json::{Map, Number, Value};
use std::iter::Peekable;
use std::str::Chars;
use std::sync::LazyLock;

use super::scan::find_closing;
use super::{CallRecognizer, Grammar, Recognized};

static CALL_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("call expression pattern is valid")
});

pub struct CallExpressionRecognizer;

/// Every call expression in `text` with the byte range it covers.
///
/// Only registered tool names count, so prose like `Alice (id=EMP001)` or
/// `(see above)` is left alone.
fn scan(text: &str, is_known: &dyn Fn(&str) -> bool) -> Vec<(usize, usize, Recognized)> {
    let mut found = Vec::new();

    for caps in CALL_OPEN.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let tool_name = name.as_str();
        if !is_known(tool_name) {
            continue;
        }
        let open = whole.end() - 1;

        let Some(close) = find_closing(text, open, '(', ')', &['"', '\'']) else {
            found.push((
                name.start(),
                text.len(),
                Recognized::Malformed {
                    tool_name: Some(tool_name.to_string()),
                    message: "unterminated argument list".to_string(),
                },
            ));
            continue;
        };

        let recognized = match parse_kwargs(&text[open + 1..close]) {
            Ok(arguments) => Recognized::Call {
                tool_name: tool_name.to_string(),
                arguments,
            },
            Err(message) => Recognized::Malformed {
                tool_name: Some(tool_name.to_string()),
                message,
            },
        };
        found.push((name.start(), close + 1, recognized));
    }

    found
}

/// Parse `key=value, key2='value'` into an argument map
pub(crate) fn parse_kwargs(input: &str) -> Result<Map<String, Value>, String> {
    let mut arguments = Map::new();
    let mut chars = input.chars().peekable();

    loop {
        skip_whitespace(&mut chars);
        if chars.peek().is_none() {
            break;
        }

        let name = read_identifier(&mut chars)
            .ok_or_else(|| "expected arguments of the form name=value".to_string())?;
        skip_whitespace(&mut chars);
        if chars.next() != Some('=') {
            return Err(format!("expected `=` after `{}`", name));
        }
        skip_whitespace(&mut chars);

        let value = match chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                Value::String(read_quoted(&mut chars, quote)?)
            }
            _ => {
                let raw = read_bare(&mut chars);
                if raw.is_empty() {
                    return Err(format!("missing value for `{}`", name));
                }
                parse_bare(&raw)
            }
        };

        if arguments.insert(name.clone(), value).is_some() {
            return Err(format!("duplicate argument `{}`", name));
        }

        skip_whitespace(&mut chars);
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(c) => return Err(format!("unexpected `{}` after value of `{}`", c, name)),
        }
    }

    Ok(arguments)
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

fn read_identifier(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let first = chars.next_if(|c| c.is_ascii_alphabetic() || *c == '_')?;
    let mut name = String::from(first);
    while let Some(c) = chars.next_if(|c| c.is_ascii_alphanumeric() || *c == '_') {
        name.push(c);
    }
    Some(name)
}

fn read_quoted(chars: &mut Peekable<Chars<'_>>, quote: char) -> Result<String, String> {
    let mut value = String::new();
    loop {
        match chars.next() {
            None => return Err("unterminated string".to_string()),
            Some('\\') => match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(other) => value.push(other),
                None => return Err("unterminated string".to_string()),
            },
            Some(c) if c == quote => return Ok(value),
            Some(c) => value.push(c),
        }
    }
}

fn read_bare(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut raw = String::new();
    while let Some(c) = chars.next_if(|c| *c != ',' && !c.is_whitespace()) {
        raw.push(c);
    }
    raw
}

fn parse_bare(raw: &str) -> Value {
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Some(number) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    match raw {
        "true" | "True" => Value::Bool(true),
        "false" | "False" => Value::Bool(false),
        "null" | "None" => Value::Null,
        _ => Value::String(raw.to_string()),
    }
}

impl CallRecognizer for CallExpressionRecognizer {
    fn grammar(&self) -> Grammar {
        Grammar::CallExpression
    }

    fn recognize(&self, text: &str, is_known: &dyn Fn(&str) -> bool) -> Option<Recognized> {
        let mut malformed = None;
        for (_, _, recognized) in scan(text, is_known) {
            match recognized {
                call @ Recognized::Call { .. } => return Some(call),
                broken => {
                    malformed.get_or_insert(broken);
                }
            }
        }
        malformed
    }

    fn spans(&self, text: &str, is_known: &dyn Fn(&str) -> bool) -> Vec<(usize, usize)> {
        scan(text, is_known)
            .into_iter()
            .filter(|(_, _, recognized)| matches!(recognized, Recognized::Call { .. }))
            .map(|(start, end, _)| (start, end))
            .collect()
    }
}
