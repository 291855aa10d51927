//! Template rendering
//!
//! Templates embed keys between a start and an end character, `{` and `}` by
//! default: `My name is {user.name}`. Keys are resolved as paths against a
//! document. The reserved key [`ORIGINAL_VALUE_KEY`] resolves to a value
//! supplied by the caller instead.

use crate::document::{value_to_string, Document, Value};
use crate::path;

/// Key replaced by the caller supplied original value.
pub const ORIGINAL_VALUE_KEY: &str = "__original";

pub const DEFAULT_START_CHAR: char = '{';
pub const DEFAULT_END_CHAR: char = '}';

/// Encodes resolved values before they are appended to the output.
pub trait ValueEncoder: Send + Sync {
    fn encode(&self, value: &Value) -> String;
}

/// Form URL encoding of the stringified value.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlEncoder;

impl ValueEncoder for UrlEncoder {
    fn encode(&self, value: &Value) -> String {
        value_to_string(value)
            .map(|s| url::form_urlencoded::byte_serialize(s.as_bytes()).collect())
            .unwrap_or_default()
    }
}

/// JSON string escaping of the stringified value, without surrounding quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStringEncoder;

impl ValueEncoder for JsonStringEncoder {
    fn encode(&self, value: &Value) -> String {
        let Some(s) = value_to_string(value) else {
            return String::new();
        };
        let quoted = Value::String(s).to_string();
        quoted[1..quoted.len() - 1].to_string()
    }
}

/// Render `template` against `document`.
///
/// Placeholders do not nest. A key that resolves to nothing contributes
/// nothing, and an unterminated placeholder is emitted verbatim.
pub fn render(
    template: &str,
    document: Option<&Document>,
    original: Option<&Value>,
    start_char: char,
    end_char: char,
    encoder: Option<&dyn ValueEncoder>,
) -> String {
    let mut output = String::with_capacity(template.len());
    let mut in_placeholder = false;
    let mut key = String::new();

    for ch in template.chars() {
        if !in_placeholder && ch == start_char {
            in_placeholder = true;
            key.clear();
        } else if in_placeholder && ch == end_char {
            in_placeholder = false;
            if let Some(value) = resolve_key(&key, document, original) {
                append_value(&mut output, &value, encoder);
            }
        } else if in_placeholder {
            key.push(ch);
        } else {
            output.push(ch);
        }
    }

    if in_placeholder {
        output.push(start_char);
        output.push_str(&key);
    }

    output
}

fn resolve_key(key: &str, document: Option<&Document>, original: Option<&Value>) -> Option<Value> {
    if key.is_empty() {
        return None;
    }
    if key == ORIGINAL_VALUE_KEY {
        return original.filter(|v| !v.is_null()).cloned();
    }
    document
        .and_then(|doc| path::extract(doc, key))
        .map(|value| value.into_owned())
}

fn append_value(output: &mut String, value: &Value, encoder: Option<&dyn ValueEncoder>) {
    match encoder {
        Some(encoder) => output.push_str(&encoder.encode(value)),
        None => {
            if let Some(s) = value_to_string(value) {
                output.push_str(&s);
            }
        }
    }
}

/// A template string together with its delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    start_char: char,
    end_char: char,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            start_char: DEFAULT_START_CHAR,
            end_char: DEFAULT_END_CHAR,
        }
    }

    pub fn with_delimiters(mut self, start_char: char, end_char: char) -> Self {
        self.start_char = start_char;
        self.end_char = end_char;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the template contains a start delimiter at all.
    pub fn has_placeholders(&self) -> bool {
        self.source.contains(self.start_char)
    }

    pub fn render(
        &self,
        document: Option<&Document>,
        original: Option<&Value>,
        encoder: Option<&dyn ValueEncoder>,
    ) -> String {
        render(
            &self.source,
            document,
            original,
            self.start_char,
            self.end_char,
            encoder,
        )
    }
}
