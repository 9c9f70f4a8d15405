//! String utilities
//!
//! Helpers for safe string truncation and for masking secrets before they
//! reach logs or the console.

/// Suffix appended to masked secrets
pub const MASK_SUFFIX: &str = "...";

/// Safely truncate a string at a character boundary
///
/// Returns at most `max_chars` characters of `s`, never splitting a
/// multi-byte character.
///
/// # Example
/// ```
/// use llm_key_rotator::utils::truncate_str;
///
/// assert_eq!(truncate_str("Hello, 世界!", 8), "Hello, 世");
/// assert_eq!(truncate_str("Hello", 100), "Hello");
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string and append `suffix` only if something was cut off
pub fn truncate_with_suffix(s: &str, max_chars: usize, suffix: &str) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}{}", truncate_str(s, max_chars), suffix)
    }
}

/// Mask a secret for display
///
/// Shows at most `prefix_chars` leading characters, and never more than half
/// of the secret, followed by [`MASK_SUFFIX`]. The suffix is always present,
/// so a masked value can never be mistaken for the full secret.
///
/// # Example
/// ```
/// use llm_key_rotator::utils::mask_secret;
///
/// assert_eq!(mask_secret("sk-proj-abcdefghijklmnop", 10), "sk-proj-ab...");
/// assert_eq!(mask_secret("short", 10), "sh...");
/// ```
pub fn mask_secret(secret: &str, prefix_chars: usize) -> String {
    let visible = prefix_chars.min(secret.chars().count() / 2);
    format!("{}{}", truncate_str(secret, visible), MASK_SUFFIX)
}
