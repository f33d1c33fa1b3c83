//! Thread slug generation.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

const MAX_BASE_LEN: usize = 50;
const FALLBACK_BASE: &str = "thread";
pub(crate) const MAX_ATTEMPTS: usize = 5;

/// Folds to ASCII (NFKD, combining marks dropped), lowercases, keeps
/// letters/digits/underscores/hyphens, turns runs of whitespace and hyphens
/// into one hyphen and trims stray separators.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.nfkd().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_dash = true;
        }
    }
    out.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Slugified title cut to 50 chars, or `"thread"` when nothing survives.
/// A hyphen left dangling by the cut is dropped.
pub fn slug_base(title: &str) -> String {
    let slug = slugify(title);
    let cut: String = slug.chars().take(MAX_BASE_LEN).collect();
    let base = cut.trim_end_matches('-').to_string();
    if base.is_empty() {
        FALLBACK_BASE.to_string()
    } else {
        base
    }
}

/// Eight random lowercase hex characters.
pub(crate) fn random_suffix() -> String {
    let mut hex = Uuid::new_v4().simple().to_string();
    hex.truncate(8);
    hex
}

pub(crate) fn candidate(base: &str) -> String {
    format!("{base}-{}", random_suffix())
}

/// Used once every candidate collided.
pub(crate) fn fallback() -> String {
    format!("{FALLBACK_BASE}-{}", random_suffix())
}
