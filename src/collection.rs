use crate::record::{FieldValue, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Products,
    Ads,
    Socials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// `open` + one block per record + `close`, optionally wrapped in a call.
    Array { wrapper: Option<String> },
    /// `open` + `key: value` lines + `close`.
    Mapping,
}

/// How one collection is spelled inside its backing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub open: String,
    pub close: String,
    pub layout: Layout,
}

/// Per-collection field rules.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub required: &'static [&'static str],
    pub numeric: &'static [&'static str],
    pub lists: &'static [&'static str],
    /// Keys always present in a mapping, filled with empty strings.
    pub defaults: &'static [&'static str],
    pub sequential_ids: bool,
    /// Attach every media path as `images` in addition to `image`.
    pub multi_media: bool,
}

pub const SOCIAL_KEYS: &[&str] = &["facebook", "instagram", "snapchat", "whatsapp", "tiktok"];

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Products, Collection::Ads, Collection::Socials];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Ads => "ads",
            Collection::Socials => "socials",
        }
    }

    pub fn schema(self) -> Schema {
        match self {
            Collection::Products => Schema {
                required: &["name", "description", "price", "category"],
                numeric: &["price"],
                lists: &["images"],
                defaults: &[],
                sequential_ids: true,
                multi_media: true,
            },
            Collection::Ads => Schema {
                required: &["text", "image"],
                numeric: &[],
                lists: &[],
                defaults: &[],
                sequential_ids: true,
                multi_media: false,
            },
            Collection::Socials => Schema {
                required: &[],
                numeric: &[],
                lists: &[],
                defaults: SOCIAL_KEYS,
                sequential_ids: false,
                multi_media: false,
            },
        }
    }

    pub fn template(self) -> Template {
        match self {
            Collection::Products => Template {
                open: "export const products: Product[] = [".to_string(),
                close: "];".to_string(),
                layout: Layout::Array {
                    wrapper: Some("withDefaultSocials".to_string()),
                },
            },
            Collection::Ads => Template {
                open: "export const ads = [".to_string(),
                close: "];".to_string(),
                layout: Layout::Array { wrapper: None },
            },
            Collection::Socials => Template {
                open: "export const socials = {".to_string(),
                close: "};".to_string(),
                layout: Layout::Mapping,
            },
        }
    }
}

impl Schema {
    /// Classify a raw captured value. Lists stay raw until decoded here;
    /// everything else loses one pair of surrounding quotes.
    pub fn decode(&self, key: &str, raw: &str) -> FieldValue {
        let raw = raw.trim();

        if self.lists.contains(&key) && raw.starts_with('[') && raw.ends_with(']') {
            return FieldValue::List(parse_list(&raw[1..raw.len() - 1]));
        }

        let value = unquote(raw);
        if self.numeric.contains(&key) {
            if let Ok(n) = value.trim().parse::<f64>() {
                if n.is_finite() {
                    return FieldValue::Number(n);
                }
            }
        }
        FieldValue::Text(value)
    }

    /// Mapping with every default key present; missing ones are appended
    /// as empty strings after the existing keys.
    pub fn with_defaults(&self, record: Option<Record>) -> Record {
        let mut filled = record.unwrap_or_default();
        for key in self.defaults {
            if !filled.contains_key(key) {
                filled.insert(*key, FieldValue::text(""));
            }
        }
        filled
    }
}

/// Visit every character of `text` that sits outside a string literal,
/// stopping at the first one for which `visit` returns true. Returns that
/// byte offset. An unterminated quote ends with its line.
pub fn scan_unquoted(text: &str, mut visit: impl FnMut(usize, char) -> bool) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                '\\' => {
                    escaped = true;
                    continue;
                }
                c if c == q => {
                    quote = None;
                    continue;
                }
                '\n' => quote = None,
                _ => continue,
            }
        } else if matches!(ch, '"' | '\'' | '`') {
            quote = Some(ch);
            continue;
        }

        if visit(idx, ch) {
            return Some(idx);
        }
    }
    None
}

/// Byte offset of the first `needle` outside string literals.
pub fn find_unquoted(text: &str, needle: &str) -> Option<usize> {
    scan_unquoted(text, |idx, _| text[idx..].starts_with(needle))
}

/// Offset of the `}` closing a block whose `{` sits just before `text`.
pub fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 1;
    scan_unquoted(text, |_, ch| {
        match ch {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        depth == 0
    })
}

/// Split a block body into `key: value` segments at newlines and at commas
/// that sit outside quotes and square brackets.
pub fn split_fields(body: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    scan_unquoted(body, |idx, ch| {
        match ch {
            '[' => depth += 1,
            ']' => depth = (depth - 1).max(0),
            ',' | '\n' if depth == 0 => {
                segments.push(&body[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
        false
    });
    segments.push(&body[start..]);
    segments
}

/// Split `key: value` at the first colon outside quotes, so quoted keys
/// may themselves contain colons.
pub fn split_key(segment: &str) -> Option<(&str, &str)> {
    let idx = find_unquoted(segment, ":")?;
    Some((&segment[..idx], &segment[idx + 1..]))
}

/// Strip one pair of matching quotes and decode backslash escapes inside.
pub fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    let mut chars = raw.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if first == last && matches!(first, '"' | '\'' | '`') => {
            unescape(&raw[1..raw.len() - 1])
        }
        _ => raw.to_string(),
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn parse_list(inner: &str) -> Vec<String> {
    split_fields(inner)
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(unquote)
        .collect()
}
