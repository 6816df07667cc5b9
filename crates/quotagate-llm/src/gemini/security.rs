//! Security utilities for Gemini API

/// Sanitize Gemini API error messages before they reach the logs
pub(crate) fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("api key")
        || lower.contains("apikey")
        || lower.contains("invalid key")
        || lower.contains("unauthorized")
        || lower.contains("permission denied")
    {
        return "API authentication error. Please check your API key configuration.".to_string();
    }

    if lower.contains("rate limit")
        || lower.contains("quota")
        || lower.contains("resource_exhausted")
    {
        return "API rate limit exceeded. Please try again later.".to_string();
    }

    if lower.contains("internal") || lower.contains("server error") {
        return "API server error. Please try again later.".to_string();
    }

    let cleaned = mask_key_params(error);

    if cleaned.chars().count() > 300 {
        format!("{}...(truncated)", crate::util::truncate_safe(&cleaned, 300))
    } else {
        cleaned
    }
}

/// Replace the value of every `key=` parameter (any case) with `****`.
///
/// The value runs to the next `&` or whitespace; the rest of the text is kept.
fn mask_key_params(text: &str) -> String {
    const NEEDLE: &[u8] = b"key=";

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;

    while i + NEEDLE.len() <= bytes.len() {
        if bytes[i..i + NEEDLE.len()].eq_ignore_ascii_case(NEEDLE) {
            let value_start = i + NEEDLE.len();
            let value_end = text[value_start..]
                .find(|c: char| c == '&' || c.is_whitespace())
                .map_or(text.len(), |offset| value_start + offset);

            out.push_str(&text[copied..value_start]);
            out.push_str("****");
            copied = value_end;
            i = value_end.max(value_start);
        } else {
            i += 1;
        }
    }

    out.push_str(&text[copied..]);
    out
}
