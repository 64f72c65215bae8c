//! Label and identifier filters used by the chart renderer
//!
//! All functions here are pure. The renderer receives them through
//! [`LabelFilters`] instead of looking them up in a shared registry, so tests
//! can swap any of them out.

use crate::org::OrgModel;
use regex::Regex;
use std::sync::LazyLock;

/// Title shown for an identifier that never appeared as a record
pub const MISSING_TITLE: &str = "(missing from database)";

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}_]+").expect("static pattern is valid"));

/// Filter functions injected into [`super::ChartRenderer`]
#[derive(Debug, Clone, Copy)]
pub struct LabelFilters {
    /// Department name -> cluster identifier
    pub slug: fn(&str) -> String,
    /// Identifier -> two-line node label
    pub name_and_title: fn(&OrgModel, &str) -> String,
}

impl Default for LabelFilters {
    fn default() -> Self {
        Self {
            slug: slugify,
            name_and_title,
        }
    }
}

/// Collapse every run of characters other than letters, digits and `_` to
/// `_`, trim `_` from both ends and lowercase.
///
/// Combining marks and connector punctuation count as separators, so a
/// decomposed `é` loses its accent rather than keeping it in the slug.
///
/// ```
/// use orgchart::render::slugify;
/// assert_eq!(slugify("Research & Development"), "research_development");
/// ```
pub fn slugify(value: &str) -> String {
    NON_WORD
        .replace_all(value, "_")
        .trim_matches('_')
        .to_lowercase()
}

/// Display name of `identifier`, or its leading DN component when the model
/// has no non-empty name for it.
pub fn resolve_name(model: &OrgModel, identifier: &str) -> String {
    match model.display_name_of(identifier) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => leading_component(identifier),
    }
}

/// Title of `identifier`. A known record with no title resolves to the
/// empty string; an unknown identifier resolves to [`MISSING_TITLE`].
pub fn resolve_title(model: &OrgModel, identifier: &str) -> String {
    model
        .title_of(identifier)
        .unwrap_or(MISSING_TITLE)
        .to_string()
}

/// Name and title on two lines
pub fn name_and_title(model: &OrgModel, identifier: &str) -> String {
    format!(
        "{}\n{}",
        resolve_name(model, identifier),
        resolve_title(model, identifier)
    )
}

/// Attribute values of the first RDN of a distinguished name, without their
/// attribute types and with DN escapes decoded.
///
/// `cn=Doe\, Jane,ou=People,dc=example,dc=com` yields `Doe, Jane`. Input
/// that is not a DN is returned trimmed.
pub fn leading_component(dn: &str) -> String {
    let rdn = split_unescaped(dn, &[',', ';'])
        .into_iter()
        .next()
        .unwrap_or_default();

    split_unescaped(rdn, &['+'])
        .into_iter()
        .map(|ava| match find_unescaped(ava, '=') {
            Some(pos) => unescape_value(ava[pos + 1..].trim()),
            None => unescape_value(ava.trim()),
        })
        .collect::<Vec<_>>()
        .join("+")
}

fn find_unescaped(value: &str, needle: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == needle {
            return Some(i);
        }
    }
    None
}

fn split_unescaped<'a>(value: &'a str, separators: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    let mut quoted = false;

    for (i, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => quoted = !quoted,
            c if !quoted && separators.contains(&c) => {
                parts.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}

fn unescape_value(value: &str) -> String {
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);

    let chars: Vec<char> = value.chars().collect();
    let mut bytes = Vec::with_capacity(value.len());
    let mut buf = [0u8; 4];
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            let hex = chars
                .get(i + 1..i + 3)
                .filter(|pair| pair.iter().all(|h| h.is_ascii_hexdigit()))
                .and_then(|pair| {
                    let pair: String = pair.iter().collect();
                    u8::from_str_radix(&pair, 16).ok()
                });
            match hex {
                Some(byte) => {
                    bytes.push(byte);
                    i += 3;
                }
                None => {
                    bytes.extend_from_slice(chars[i + 1].encode_utf8(&mut buf).as_bytes());
                    i += 2;
                }
            }
            continue;
        }
        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        i += 1;
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
