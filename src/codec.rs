//! Reads and writes record arrays embedded in source text.
//!
//! Parsing is line-oriented and lenient: segments that are not
//! `key: value` pairs are skipped rather than rejected. Everything outside
//! the `open`..`close` span of a [`Template`] is left to [`splice`].

use crate::collection::{
    find_unquoted, matching_brace, split_fields, split_key, unquote, Layout, Schema, Template,
};
use crate::record::{key_literal, Record};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMarker(pub String);

/// The text between the opening and closing markers, or the whole text if
/// either marker is absent.
fn region<'a>(text: &'a str, template: &Template) -> &'a str {
    markers(text, template)
        .map(|(start, end)| &text[start + template.open.len()..end])
        .unwrap_or(text)
}

/// Byte offsets of the opening marker and the first closing marker after
/// it. Closing markers inside string literals do not count.
fn markers(text: &str, template: &Template) -> Option<(usize, usize)> {
    let start = text.find(&template.open)?;
    let body = start + template.open.len();
    let end = find_unquoted(&text[body..], &template.close)? + body;
    Some((start, end))
}

/// Where a record block opens: `wrapper({` or a bare `{`.
fn block_start(wrapper: Option<&str>) -> Regex {
    let pattern = match wrapper {
        Some(name) => format!(r"{}\(\s*\{{", regex::escape(name)),
        None => r"\{".to_string(),
    };
    Regex::new(&pattern).expect("block pattern is a valid regex")
}

/// Bodies of the record blocks in `region`. A block ends at the brace that
/// balances its opening one, skipping braces inside quoted values; a
/// wrapped block must also be followed by `)`.
fn block_bodies<'a>(region: &'a str, wrapper: Option<&str>) -> Vec<&'a str> {
    let start = block_start(wrapper);
    let mut bodies = Vec::new();
    let mut pos = 0;

    while let Some(open) = start.find_at(region, pos) {
        let body = open.end();
        let Some(len) = matching_brace(&region[body..]) else {
            log::trace!("unterminated block at offset {}", open.start());
            break;
        };
        let close = body + len;

        if wrapper.is_some() && !region[close + 1..].trim_start().starts_with(')') {
            pos = body;
            continue;
        }
        bodies.push(&region[body..close]);
        pos = close + 1;
    }

    bodies
}

fn parse_body(body: &str, schema: &Schema) -> Record {
    let mut record = Record::new();

    for segment in split_fields(body) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((key, value)) = split_key(segment) else {
            log::trace!("skipping segment without separator: {}", segment);
            continue;
        };

        let key = unquote(key);
        if key.is_empty() {
            continue;
        }
        let value = schema.decode(&key, value);
        record.insert(key, value);
    }

    record
}

/// Parse every record block of an array layout, in order of appearance.
pub fn parse(text: &str, template: &Template, schema: &Schema) -> Vec<Record> {
    let wrapper = match &template.layout {
        Layout::Array { wrapper } => wrapper.as_deref(),
        Layout::Mapping => return parse_mapping(text, template, schema).into_iter().collect(),
    };

    block_bodies(region(text, template), wrapper)
        .into_iter()
        .map(|body| parse_body(body, schema))
        .collect()
}

/// Parse the single mapping block of a mapping layout. `None` when the
/// opening marker is missing.
pub fn parse_mapping(text: &str, template: &Template, schema: &Schema) -> Option<Record> {
    let (start, end) = markers(text, template)?;
    Some(parse_body(&text[start + template.open.len()..end], schema))
}

fn field_lines(record: &Record, indent: &str) -> String {
    record
        .iter()
        .map(|(key, value)| format!("{}{}: {}", indent, key_literal(key), value.to_literal()))
        .collect::<Vec<_>>()
        .join(",\n")
}

fn serialize_block(record: &Record, wrapper: Option<&str>) -> String {
    let (head, tail) = match wrapper {
        Some(name) => (format!("  {}({{", name), "  })"),
        None => ("  {".to_string(), "  }"),
    };

    if record.is_empty() {
        format!("{}\n{}", head, tail)
    } else {
        format!("{}\n{}\n{}", head, field_lines(record, "    "), tail)
    }
}

/// Render the full `open`..`close` block for `records`.
pub fn serialize(records: &[Record], template: &Template) -> String {
    let mut out = String::new();
    out.push_str(&template.open);
    out.push('\n');

    match &template.layout {
        Layout::Array { wrapper } => {
            let blocks: Vec<String> = records
                .iter()
                .map(|r| serialize_block(r, wrapper.as_deref()))
                .collect();
            if !blocks.is_empty() {
                out.push_str(&blocks.join(",\n"));
                out.push('\n');
            }
        }
        Layout::Mapping => {
            if let Some(record) = records.first() {
                if !record.is_empty() {
                    out.push_str(&field_lines(record, "  "));
                    out.push('\n');
                }
            }
        }
    }

    out.push_str(&template.close);
    out
}

/// Replace the `open`..`close` span of `original` (inclusive) with `block`.
pub fn splice(original: &str, template: &Template, block: &str) -> Result<String, MissingMarker> {
    let start = original
        .find(&template.open)
        .ok_or_else(|| MissingMarker(template.open.clone()))?;
    let (_, close) =
        markers(original, template).ok_or_else(|| MissingMarker(template.close.clone()))?;
    let end = close + template.close.len();

    let mut out = String::with_capacity(original.len() + block.len());
    out.push_str(&original[..start]);
    out.push_str(block);
    out.push_str(&original[end..]);
    Ok(out)
}
