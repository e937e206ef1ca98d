use std::fmt;

/// A single field value, tagged by how the backing text spells it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Rendered as a double-quoted string literal.
    Text(String),
    /// Numeric field, re-emitted as a quoted literal such as `"12.0"`.
    Number(f64),
    /// Bracketed literal list, rendered unquoted: `['/a.jpg', '/b.jpg']`.
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// The individual paths or strings held by this value.
    pub fn items(&self) -> Vec<&str> {
        match self {
            FieldValue::Text(s) => vec![s.as_str()],
            FieldValue::Number(_) => Vec::new(),
            FieldValue::List(items) => items.iter().map(|s| s.as_str()).collect(),
        }
    }

    /// Source-text rendering, as it appears after `key: `.
    pub fn to_literal(&self) -> String {
        match self {
            FieldValue::Text(s) => format!("\"{}\"", escape(s, '"')),
            FieldValue::Number(n) => format!("\"{}\"", format_number(*n)),
            FieldValue::List(items) => {
                let quoted: Vec<String> = items
                    .iter()
                    .map(|item| format!("'{}'", escape(item, '\'')))
                    .collect();
                format!("[{}]", quoted.join(", "))
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => f.write_str(&format_number(*n)),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// Whole numbers keep one decimal place so `12` round-trips as `"12.0"`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

/// Escape `s` for a string literal delimited by `quote`.
fn escape(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Object key as written in source: bare when it is an identifier,
/// otherwise a double-quoted string.
pub fn key_literal(key: &str) -> String {
    let mut chars = key.chars();
    let identifier = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$');

    if identifier {
        key.to_string()
    } else {
        format!("\"{}\"", escape(key, '"'))
    }
}

/// Ordered field mapping. Re-inserting an existing key replaces its value
/// in place, keeping the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn with(mut self, key: &str, value: FieldValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let idx = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Display helper: the value of `key` as plain text, or empty.
    pub fn display(&self, key: &str) -> String {
        self.get(key).map(|v| v.to_string()).unwrap_or_default()
    }

    /// Numeric value of the `id` field, if it is a digit string.
    pub fn numeric_id(&self) -> Option<u64> {
        match self.get("id")? {
            FieldValue::Text(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                s.parse().ok()
            }
            FieldValue::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u64),
            _ => None,
        }
    }
}

#[cfg(test)]
impl Record {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}
