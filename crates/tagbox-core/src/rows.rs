//! Row text convention for tag sets.
//!
//! A tag set crosses the boundary as an array of rows. Each row is
//! `KEY<TAB>value`; several values for one key are joined with a vertical
//! tab. Reads emit one row per value, writes send one row per key. A write
//! row with an empty value erases the key.

use std::collections::BTreeMap;

/// Flattened tag set: key to values, in key order.
pub type Tags = BTreeMap<String, Vec<String>>;

/// Separates a key from its value(s).
pub const KEY_SEPARATOR: char = '\t';

/// Separates multiple values sharing one key.
pub const VALUE_SEPARATOR: char = '\u{0B}';

/// Build a single row from a key and its values.
pub fn row<S: AsRef<str>>(key: &str, values: &[S]) -> String {
    let mut out = String::with_capacity(key.len() + 1 + values.iter().map(|v| v.as_ref().len() + 1).sum::<usize>());
    out.push_str(key);
    out.push(KEY_SEPARATOR);
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.push(VALUE_SEPARATOR);
        }
        out.push_str(value.as_ref());
    }
    out
}

/// Split a row into key and values. Rows without a TAB are rejected.
pub fn split_row(row: &str) -> Option<(&str, Vec<&str>)> {
    let (key, value) = row.split_once(KEY_SEPARATOR)?;
    if value.is_empty() {
        return Some((key, Vec::new()));
    }
    Some((key, value.split(VALUE_SEPARATOR).collect()))
}

/// Encode a tag set in the write direction: one row per key.
pub fn encode_rows(tags: &Tags) -> Vec<String> {
    tags.iter().map(|(key, values)| row(key, values)).collect()
}

/// Decode rows in either direction, merging repeated keys in order.
///
/// A key whose only row has an empty value maps to an empty list.
pub fn decode_rows<I, S>(rows: I) -> Tags
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags = Tags::new();
    for r in rows {
        if let Some((key, values)) = split_row(r.as_ref()) {
            tags.entry(key.to_string())
                .or_default()
                .extend(values.into_iter().map(str::to_string));
        }
    }
    tags
}
