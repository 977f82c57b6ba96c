//! Page front matter.
//!
//! A page file starts with an optional metadata block, separated from the
//! body by `++++`:
//!
//! ```text
//! title = Hello World
//! date = 2024-01-01
//! tags = cake baking
//! ++++
//! Body text.
//! ```
//!
//! Metadata lines are flat `key = value` (or `key: value`) pairs. Keys are
//! case-insensitive; blank lines and `#`/`;` comments are skipped.

use crate::log;
use std::collections::BTreeMap;

/// Separates the metadata block from the body.
pub const DELIMITER: &str = "++++";

/// Keys a page understands.
pub const RECOGNIZED: &[&str] = &["tags", "date", "title", "slug", "template"];

/// Split a page file on the first delimiter.
///
/// Returns the trimmed metadata block (if there is one) and the trimmed body.
pub fn split_front_matter(text: &str) -> (Option<&str>, &str) {
    match text.split_once(DELIMITER) {
        Some((meta, body)) => (Some(meta.trim()), body.trim()),
        None => (None, text.trim()),
    }
}

/// Parse a metadata block into lowercased keys and trimmed values.
///
/// Malformed lines are reported and skipped. A repeated key keeps the last
/// value.
pub fn parse(text: &str, filepath: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let Some((key, value)) = split_entry(line) else {
            log!("warn"; "{filepath}:{}: ignoring malformed metadata line `{line}`", lineno + 1);
            continue;
        };

        if values.insert(key.clone(), value.to_owned()).is_some() {
            log!("warn"; "{filepath}:{}: duplicate metadata key `{key}`", lineno + 1);
        }
    }

    values
}

/// Split on whichever separator comes first.
fn split_entry(line: &str) -> Option<(String, &str)> {
    let idx = line.find(['=', ':'])?;
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_lowercase(), line[idx + 1..].trim()))
}
