use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use thiserror::Error;

/// Indent width used when the caller has no preference.
pub const DEFAULT_INDENT: usize = 2;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("manifest is not valid JSON: {0}")]
    Parse(serde_json::Error),
    #[error("failed to render manifest: {0}")]
    Render(serde_json::Error),
}

/// Rewrite empty-container tokens (`{}`, `{ }`, `[]`, `[ ]`) so the container
/// always spans a line boundary.
///
/// Hand-edited and minified manifests often collapse empty containers onto one
/// line; forcing an internal newline keeps line-oriented diffs stable once the
/// container gains entries. Tokens inside JSON string literals are untouched.
pub fn normalize_empty_containers(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            '{' | '[' => {
                let close = if c == '{' { '}' } else { ']' };
                let tight = chars.get(i + 1) == Some(&close);
                let spaced = chars.get(i + 1) == Some(&' ') && chars.get(i + 2) == Some(&close);
                if tight || spaced {
                    out.push(c);
                    out.push('\n');
                    out.push(close);
                    i += if spaced { 3 } else { 2 };
                } else {
                    out.push(c);
                    i += 1;
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Parse manifest text into a JSON value, applying the empty-container
/// normalization pre-pass first. Object key order is preserved as written.
pub fn parse(text: &str) -> Result<Value, CodecError> {
    let normalized = normalize_empty_containers(text);
    serde_json::from_str(&normalized).map_err(CodecError::Parse)
}

/// Render a JSON value with the given indent width: one entry per line for
/// non-empty containers, `"key": value` with exactly one space after the colon.
pub fn serialize(value: &Value, indent: usize) -> Result<String, CodecError> {
    let pad = " ".repeat(indent);
    let mut buf = Vec::with_capacity(256);
    let formatter = PrettyFormatter::with_indent(pad.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).map_err(CodecError::Render)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
