//! URL slugs for courses, lessons and categories.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").expect("valid regex"));
static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").expect("valid regex"));

/// Normalizes a title into a slug.
///
/// Only ASCII letters, digits, `_` and `-` survive, so a title written
/// entirely in Persian produces an empty string and callers must ask for an
/// explicit slug.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let dashed = WHITESPACE.replace_all(&lowered, "-");
    let stripped = NON_SLUG.replace_all(&dashed, "");
    let collapsed = DASH_RUN.replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}
