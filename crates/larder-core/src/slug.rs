//! URL slugs for recipes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Alphabet for the random slug suffix.
const SUFFIX_ALPHABET: [char; 62] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L',
    'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '0', '1', '2', '3', '4',
    '5', '6', '7', '8', '9',
];

/// Length of the random slug suffix.
pub const SUFFIX_LEN: usize = 6;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]+").unwrap());
static REPEATED_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Turn a title into a URL-safe base slug of at most `max_len` characters.
pub fn slugify(title: &str, max_len: usize) -> String {
    let lower = title.to_lowercase();
    let dashed = WHITESPACE.replace_all(&lower, "-");
    let cleaned = DISALLOWED.replace_all(&dashed, "");
    let collapsed = REPEATED_DASH.replace_all(&cleaned, "-");

    collapsed.trim_matches('-').chars().take(max_len).collect()
}

/// Slug for a new recipe: the title's base slug plus a random suffix.
pub fn recipe_slug(title: &str, max_len: usize) -> String {
    let suffix = nanoid::nanoid!(SUFFIX_LEN, &SUFFIX_ALPHABET);
    let base = slugify(title, max_len);

    if base.is_empty() {
        suffix
    } else {
        format!("{}-{}", base, suffix)
    }
}
