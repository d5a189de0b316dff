use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Enum representing possible errors while parsing a PHP configuration file.
#[derive(Debug, Error, PartialEq)]
pub enum PhpParseError {
    #[error("Missing '<?php' tag at start of configuration")]
    MissingPhpTag,
    #[error("Expected {0}")]
    Expected(&'static str),
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected input: {0}")]
    Unexpected(String),
    #[error("Unterminated string")]
    UnterminatedString,
    #[error("Unterminated block comment")]
    UnterminatedComment,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Array key must be an integer or a string, got an {0}")]
    InvalidArrayKey(&'static str),
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Unexpected trailing input: {0}")]
    TrailingInput(String),
}

/// Parses the data subset of PHP that configuration files such as
/// `app/etc/env.php` consist of: a `<?php return <value>;` unit where the
/// value is built from scalars and array literals.
///
/// Arrays follow `json_encode` semantics: keys `0..n-1` in order produce a
/// JSON array, anything else a JSON object with stringified keys in
/// insertion order.
pub fn parse_php_config(source: &str) -> Result<Value, PhpParseError> {
    let input = source.strip_prefix('\u{feff}').unwrap_or(source);
    let input = input
        .strip_prefix("<?php")
        .ok_or(PhpParseError::MissingPhpTag)?;
    let mut input = skip_whitespace(input)?;

    while let Some(rest) = strip_keyword(input, "declare") {
        let rest = skip_whitespace(rest)?;
        let rest = rest.strip_prefix('(').ok_or(PhpParseError::Expected("'('"))?;
        let close = rest.find(')').ok_or(PhpParseError::Expected("')'"))?;
        let rest = skip_whitespace(&rest[close + 1..])?;
        input = rest.strip_prefix(';').ok_or(PhpParseError::Expected("';'"))?;
        input = skip_whitespace(input)?;
    }

    let input = strip_keyword(input, "return").ok_or(PhpParseError::Expected("'return'"))?;
    let (input, value) = parse_value(input)?;
    let input = skip_whitespace(input)?;
    let input = input.strip_prefix(';').ok_or(PhpParseError::Expected("';'"))?;
    let input = skip_whitespace(input)?;
    let input = match input.strip_prefix("?>") {
        Some(rest) => rest.trim_start(),
        None => input,
    };
    if !input.is_empty() {
        return Err(PhpParseError::TrailingInput(snippet(input)));
    }
    Ok(value)
}

fn parse_value(input: &str) -> Result<(&str, Value), PhpParseError> {
    let input = skip_whitespace(input)?;
    match input.chars().next() {
        None => Err(PhpParseError::UnexpectedEof),
        Some('\'') => parse_single_quoted(input),
        Some('"') => parse_double_quoted(input),
        Some('[') => parse_array_items(&input[1..], ']'),
        Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => parse_number(input),
        Some(c) if c.is_ascii_alphabetic() || c == '_' => parse_keyword(input),
        Some(_) => Err(PhpParseError::Unexpected(snippet(input))),
    }
}

fn parse_keyword(input: &str) -> Result<(&str, Value), PhpParseError> {
    let end = input
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(input.len());
    let word = &input[..end];
    let rest = &input[end..];
    // PHP keywords and the true/false/null constants are case-insensitive.
    if word.eq_ignore_ascii_case("true") {
        Ok((rest, Value::Bool(true)))
    } else if word.eq_ignore_ascii_case("false") {
        Ok((rest, Value::Bool(false)))
    } else if word.eq_ignore_ascii_case("null") {
        Ok((rest, Value::Null))
    } else if word.eq_ignore_ascii_case("array") {
        let rest = skip_whitespace(rest)?;
        let rest = rest.strip_prefix('(').ok_or(PhpParseError::Expected("'('"))?;
        parse_array_items(rest, ')')
    } else {
        Err(PhpParseError::UnsupportedExpression(word.to_string()))
    }
}

/// Array keys as PHP normalizes them before insertion.
#[derive(Debug, Clone, PartialEq)]
enum ArrayKey {
    Int(i64),
    Str(String),
}

impl ArrayKey {
    fn into_string(self) -> String {
        match self {
            ArrayKey::Int(i) => i.to_string(),
            ArrayKey::Str(s) => s,
        }
    }
}

fn parse_array_items(mut input: &str, close: char) -> Result<(&str, Value), PhpParseError> {
    let delimiter_error = if close == ']' {
        "',' or ']' in array"
    } else {
        "',' or ')' in array"
    };
    let mut entries: Vec<(ArrayKey, Value)> = Vec::new();
    let mut next_index: i64 = 0;

    loop {
        input = skip_whitespace(input)?;
        if let Some(rest) = input.strip_prefix(close) {
            return Ok((rest, entries_to_value(entries)));
        }

        let (rest, first) = parse_value(input)?;
        let rest = skip_whitespace(rest)?;
        let (rest, key, value) = match rest.strip_prefix("=>") {
            Some(rest) => {
                let (rest, value) = parse_value(rest)?;
                (rest, Some(array_key_from(first)?), value)
            }
            None => (rest, None, first),
        };

        let key = match key {
            Some(ArrayKey::Int(i)) => {
                if i >= next_index {
                    next_index = i + 1;
                }
                ArrayKey::Int(i)
            }
            Some(key) => key,
            None => {
                let key = ArrayKey::Int(next_index);
                next_index += 1;
                key
            }
        };
        // A duplicate key overwrites the earlier value but keeps its position.
        match entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }

        input = skip_whitespace(rest)?;
        if let Some(rest) = input.strip_prefix(',') {
            input = rest;
        } else if !input.starts_with(close) {
            return Err(PhpParseError::Expected(delimiter_error));
        }
    }
}

/// Applies PHP's array key casts: canonical integer strings, booleans and
/// floats become integer keys, null becomes the empty string.
fn array_key_from(value: Value) -> Result<ArrayKey, PhpParseError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(ArrayKey::Int(i)),
            None => Ok(ArrayKey::Int(n.as_f64().unwrap_or(0.0) as i64)),
        },
        Value::String(s) => Ok(fold_numeric_key(s)),
        Value::Bool(b) => Ok(ArrayKey::Int(b as i64)),
        Value::Null => Ok(ArrayKey::Str(String::new())),
        Value::Array(_) => Err(PhpParseError::InvalidArrayKey("array")),
        Value::Object(_) => Err(PhpParseError::InvalidArrayKey("array")),
    }
}

fn fold_numeric_key(s: String) -> ArrayKey {
    let digits = s.strip_prefix('-').unwrap_or(&s);
    let canonical = match digits.chars().next() {
        Some('0') => digits.len() == 1 && !s.starts_with('-'),
        Some(c) if c.is_ascii_digit() => digits.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    };
    if canonical {
        if let Ok(i) = s.parse::<i64>() {
            return ArrayKey::Int(i);
        }
    }
    ArrayKey::Str(s)
}

fn entries_to_value(entries: Vec<(ArrayKey, Value)>) -> Value {
    let is_list = entries
        .iter()
        .enumerate()
        .all(|(index, (key, _))| *key == ArrayKey::Int(index as i64));
    if is_list {
        Value::Array(entries.into_iter().map(|(_, value)| value).collect())
    } else {
        let mut map = Map::new();
        for (key, value) in entries {
            map.insert(key.into_string(), value);
        }
        Value::Object(map)
    }
}

/// Parses a single-quoted string. Only `\\` and `\'` are escapes; any other
/// backslash is literal.
fn parse_single_quoted(input: &str) -> Result<(&str, Value), PhpParseError> {
    let mut unescaped = String::new();
    let mut chars = input[1..].char_indices();

    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some((_, '\'')) => unescaped.push('\''),
                Some((_, '\\')) => unescaped.push('\\'),
                Some((_, other)) => {
                    unescaped.push('\\');
                    unescaped.push(other);
                }
                None => return Err(PhpParseError::UnterminatedString),
            }
        } else if c == '\'' {
            let consumed = idx + c.len_utf8() + 1;
            return Ok((&input[consumed..], Value::String(unescaped)));
        } else {
            unescaped.push(c);
        }
    }

    Err(PhpParseError::UnterminatedString)
}

/// Parses a double-quoted string. Unknown escape sequences keep the
/// backslash, as PHP does.
fn parse_double_quoted(input: &str) -> Result<(&str, Value), PhpParseError> {
    let mut unescaped = String::new();
    let mut chars = input[1..].char_indices();

    while let Some((idx, c)) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some((_, escaped)) => {
                    match escaped {
                        '"' => unescaped.push('"'),
                        '\\' => unescaped.push('\\'),
                        '$' => unescaped.push('$'),
                        'n' => unescaped.push('\n'),
                        't' => unescaped.push('\t'),
                        'r' => unescaped.push('\r'),
                        'v' => unescaped.push('\u{0B}'),
                        'f' => unescaped.push('\u{0C}'),
                        'e' => unescaped.push('\u{1B}'),
                        '0' => unescaped.push('\0'),
                        other => {
                            unescaped.push('\\');
                            unescaped.push(other);
                        }
                    };
                }
                None => return Err(PhpParseError::UnterminatedString),
            }
        } else if c == '"' {
            let consumed = idx + c.len_utf8() + 1;
            return Ok((&input[consumed..], Value::String(unescaped)));
        } else {
            unescaped.push(c);
        }
    }

    Err(PhpParseError::UnterminatedString)
}

fn parse_number(input: &str) -> Result<(&str, Value), PhpParseError> {
    let bytes = input.as_bytes();
    let mut pos = 0;
    let negative = bytes.first() == Some(&b'-');
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        pos += 1;
    }

    if bytes[pos..].starts_with(b"0x") || bytes[pos..].starts_with(b"0X") {
        let digits_start = pos + 2;
        let mut end = digits_start;
        while end < bytes.len() && bytes[end].is_ascii_hexdigit() {
            end += 1;
        }
        if end == digits_start {
            return Err(PhpParseError::InvalidNumber(snippet(input)));
        }
        let magnitude = i64::from_str_radix(&input[digits_start..end], 16)
            .map_err(|_| PhpParseError::InvalidNumber(snippet(input)))?;
        let value = if negative { -magnitude } else { magnitude };
        return Ok((&input[end..], Value::from(value)));
    }

    let mut end = pos;
    let mut is_float = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        is_float = true;
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            is_float = true;
            end = exp_end;
        }
    }

    let literal = &input[..end];
    if !literal.bytes().any(|b| b.is_ascii_digit()) {
        return Err(PhpParseError::InvalidNumber(snippet(input)));
    }
    let rest = &input[end..];

    if is_float {
        let number = literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(|| PhpParseError::InvalidNumber(literal.to_string()))?;
        Ok((rest, Value::Number(number)))
    } else {
        match literal.parse::<i64>() {
            Ok(value) => Ok((rest, Value::from(value))),
            // PHP promotes overflowing integer literals to floats.
            Err(_) => {
                let number = literal
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .ok_or_else(|| PhpParseError::InvalidNumber(literal.to_string()))?;
                Ok((rest, Value::Number(number)))
            }
        }
    }
}

/// Skips whitespace along with `//`, `#` and `/* ... */` comments.
fn skip_whitespace(mut input: &str) -> Result<&str, PhpParseError> {
    loop {
        input = input.trim_start();
        if let Some(rest) = input.strip_prefix("//").or_else(|| input.strip_prefix('#')) {
            input = match rest.find('\n') {
                Some(i) => &rest[i + 1..],
                None => "",
            };
        } else if let Some(rest) = input.strip_prefix("/*") {
            let end = rest.find("*/").ok_or(PhpParseError::UnterminatedComment)?;
            input = &rest[end + 2..];
        } else {
            return Ok(input);
        }
    }
}

fn strip_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    if input.len() < keyword.len() || !input.is_char_boundary(keyword.len()) {
        return None;
    }
    let (head, rest) = input.split_at(keyword.len());
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    if rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(rest)
}

fn snippet(input: &str) -> String {
    input.chars().take(24).collect()
}
