//! Isolating the JSON object in free-form model output.
//!
//! Models wrap JSON in prose, in fenced code blocks, or both. Extraction is two
//! narrowing steps applied in this order: [`strip_code_fence`] then
//! [`bound_braces`]. Neither step fails; text they cannot improve passes
//! through untouched and the caller's parse reports the problem.

const FENCE: &str = "```";

/// Pick the first fenced segment that starts with `{`, after trimming and
/// dropping a leading `json` language tag. Text without a fence, or with no
/// such segment, is returned unchanged.
pub fn strip_code_fence(raw: &str) -> &str {
    if !raw.contains(FENCE) {
        return raw;
    }

    for segment in raw.split(FENCE) {
        let cleaned = segment.trim();
        let cleaned = match cleaned.strip_prefix("json") {
            Some(rest) => rest.trim(),
            None => cleaned,
        };
        if cleaned.starts_with('{') {
            return cleaned;
        }
    }

    raw
}

/// Narrow to the span from the first `{` to the last `}`, inclusive.
pub fn bound_braces(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &text[start..=end],
        _ => text,
    }
}

/// Both narrowing steps, in order.
pub fn extract_json(raw: &str) -> &str {
    bound_braces(strip_code_fence(raw))
}
