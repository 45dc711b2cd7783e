use crate::error::AdapterError;

/// Renders `text` as a double-quoted, escaped literal for error messages.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn error(expected: &str, found: &str, line: usize, column: usize) -> AdapterError {
    AdapterError::ParseError {
        expected: expected.to_string(),
        found:    quote(found),
        line,
        column,
    }
}

/// Upper-cases the first character and keeps the rest as written.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None        => String::new(),
        Some(first) => first.to_uppercase().to_string() + chars.as_str(),
    }
}

/// Converts snake_case to camelCase. The first segment is kept as written and
/// every following segment gets its first letter upper-cased and the rest
/// lower-cased.
pub fn to_camel_case(s: &str) -> String {
    let mut parts = s.split('_');
    let mut out = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push_str(&first.to_uppercase().to_string());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out
}

/// Advances `line`/`column` across `part`. Columns count characters.
pub fn advance_position(part: &str, line: &mut usize, column: &mut usize) {
    let newline_count = part.matches('\n').count();
    if newline_count > 0 {
        *line += newline_count;
        if let Some(last_line_part) = part.rsplit('\n').next() {
            *column = last_line_part.chars().count() + 1;
        }
    } else {
        *column += part.chars().count();
    }
}
