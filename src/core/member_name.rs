//! Member-name grammar for JSON:API documents and query parameters
//!
//! Member names (resource types, attribute and relationship names) and
//! custom query parameter names share one grammar:
//!
//! - at least one character
//! - first and last character from the "globally allowed" class
//!   (ASCII alphanumerics and any code point from U+0080 upwards)
//! - interior characters may additionally be `-`, `_` or a space
//!
//! See <https://jsonapi.org/format/#document-member-names>.

use regex::Regex;
use std::sync::OnceLock;

/// Characters allowed anywhere in a member name.
///
/// U+0080 and above are allowed but not URL-safe.
const GLOBALLY_ALLOWED: &str = r"a-zA-Z0-9\x{80}-\x{10FFFF}";

/// Characters allowed except as the first or last character.
const INNER_ALLOWED: &str = r"a-zA-Z0-9\x{80}-\x{10FFFF}\-_ ";

/// The reserved (official) query parameters.
pub const RESERVED_QUERY_PARAMETERS: [&str; 3] = ["sort", "page", "filter"];

fn member_name_regex() -> &'static Regex {
    static MEMBER_NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    MEMBER_NAME_REGEX.get_or_init(|| {
        // One globally allowed character, optionally followed by any inner
        // characters and a closing globally allowed character.
        Regex::new(&format!(
            "^[{g}](?:[{i}]*[{g}])?$",
            g = GLOBALLY_ALLOWED,
            i = INNER_ALLOWED
        ))
        .unwrap()
    })
}

/// Check whether the given member name is valid
pub fn is_valid_member_name(name: &str) -> bool {
    member_name_regex().is_match(name)
}

/// Check whether the given custom query parameter name is valid
///
/// A custom query parameter name must be a valid member name containing at
/// least one character outside `a-z` (e.g. `myFilter`, `my_filter`).
pub fn is_valid_custom_query_parameter(name: &str) -> bool {
    is_valid_member_name(name) && name.chars().any(|c| !c.is_ascii_lowercase())
}

/// Get the reserved (official) query parameter names
pub fn reserved_query_parameters() -> &'static [&'static str] {
    &RESERVED_QUERY_PARAMETERS
}

/// Check whether a query parameter family is one of the reserved names
pub fn is_reserved_query_parameter(name: &str) -> bool {
    RESERVED_QUERY_PARAMETERS.contains(&name)
}
