//! Name sanitization and deterministic target-path derivation.
//!
//! Every path component is derived purely from (collection title, artist,
//! asset reference), so the same listed item always lands at the same path.
//! That determinism is what lets the dedup check work with nothing but a
//! filesystem existence test.

/// Sanitizes a display string into a filesystem-safe name.
///
/// Trims, drops every character that is not ASCII alphanumeric, space, dash,
/// or underscore, turns dashes/underscores into spaces, and title-cases the
/// result. `"Abstract-Botanical_2024!!"` becomes `"Abstract Botanical 2024"`.
#[must_use]
pub fn sanitize_name(raw: &str) -> String {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    title_case(&kept.replace(['-', '_'], " "))
}

/// Normalizes a raw asset reference (the listing's `data-url` slug) into the
/// filename segment.
///
/// Sanitizes, lowercases, strips the site's literal `dl` prefix that marks
/// downloadable variants, then re-applies title casing.
#[must_use]
pub fn normalize_reference(raw: &str) -> String {
    let lowered = sanitize_name(raw).to_ascii_lowercase();
    let stripped = lowered.strip_prefix("dl").unwrap_or(&lowered);
    sanitize_name(stripped)
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
