//! Text sanitization for user-submitted form fields.
//!
//! Strips embedded markup before values are stored. This is not an HTML
//! parser: it removes anything that looks like a tag, drops the bodies of
//! `<script>`/`<style>` elements, removes stray angle brackets and trims.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SCRIPT_BLOCK_REGEX: Regex =
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap();
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref ANGLE_BRACKET_REGEX: Regex = Regex::new(r"[<>]").unwrap();
}

/// Sanitizes free text by removing markup and trimming whitespace.
///
/// ```
/// use shared::sanitize::sanitize_text;
///
/// assert_eq!(sanitize_text("  <b>Rice</b> "), "Rice");
/// assert_eq!(sanitize_text("<script>x</script>Rice"), "Rice");
/// ```
pub fn sanitize_text(text: &str) -> String {
    let without_scripts = SCRIPT_BLOCK_REGEX.replace_all(text, "");
    let without_tags = TAG_REGEX.replace_all(&without_scripts, "");
    ANGLE_BRACKET_REGEX
        .replace_all(&without_tags, "")
        .trim()
        .to_string()
}

/// Sanitizes an optional field, mapping blank results to `None`.
pub fn sanitize_optional(text: Option<&str>) -> Option<String> {
    text.map(sanitize_text).filter(|s| !s.is_empty())
}
