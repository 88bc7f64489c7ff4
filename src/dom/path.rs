//! Resource path normalization and id generation

use unicode_normalization::UnicodeNormalization;

/// Separator between path segments inside a resource id
pub const ID_SEPARATOR: char = '.';

/// Normalize a single path segment
///
/// This function:
/// 1. Normalizes Unicode to NFC
/// 2. Trims surrounding whitespace and lowercases
/// 3. Collapses every run of non-alphanumeric characters into one hyphen
/// 4. Strips a leading or trailing hyphen
///
/// A segment with no alphanumeric characters normalizes to the empty string.
pub fn normalize_segment(segment: &str) -> String {
    let composed: String = segment.nfc().collect();
    let lowered = composed.trim().to_lowercase();

    let mut result = String::with_capacity(lowered.len());
    let mut pending_separator = false;
    for ch in lowered.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !result.is_empty() {
                result.push('-');
            }
            pending_separator = false;
            result.push(ch);
        } else {
            pending_separator = true;
        }
    }

    // Hyphens are only emitted between two alphanumerics, so edge hyphens never survive.
    result
}

/// Normalize every segment of a path, dropping segments that normalize to nothing
pub fn normalize_path<S: AsRef<str>>(segments: &[S]) -> Vec<String> {
    segments
        .iter()
        .map(|s| normalize_segment(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Join normalized segments into a resource id
pub fn generate_id<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(&ID_SEPARATOR.to_string())
}

/// Split a resource id back into its segments
pub fn parse_id(id: &str) -> Vec<String> {
    id.split(ID_SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Convert a resource kind name to kebab-case (`AwsRdsInstance` -> `aws-rds-instance`)
pub fn kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map(|c| c.is_lowercase()).unwrap_or(false);
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push('-');
            }
        }
        out.extend(ch.to_lowercase());
    }

    normalize_segment(&out)
}

/// Whether `child` extends `parent` by exactly one segment
pub fn is_direct_child(parent: &[String], child: &[String]) -> bool {
    child.len() == parent.len() + 1 && child[..parent.len()] == *parent
}
