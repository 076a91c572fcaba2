//! Identifier sanitization (spec.md section 4.7): a total, injective,
//! fixed transform from an HQL identifier to a valid JS/TS identifier.
//! "Total" means every legal HQL identifier has a defined output;
//! "injective" means two distinct inputs never produce the same output.
//!
//! Named special characters get a fixed mnemonic escape; everything else
//! that cannot appear verbatim in a JS identifier falls back to a
//! codepoint escape, which keeps the transform total without needing to
//! enumerate every character HQL's reader might accept in a symbol.

use hql_util::FxHashMap;

/// Rewrites one HQL identifier to its JS-safe form. Idempotent on inputs
/// that are already valid JS identifiers (letters, digits, `_`, `$`, not
/// leading with a digit).
pub fn sanitize_identifier(name: &str) -> String {
    if is_already_valid(name) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 8);
    for ch in name.chars() {
        match ch {
            '-' => out.push('_'),
            '?' => out.push_str("_QMARK_"),
            '!' => out.push_str("_BANG_"),
            '*' => out.push_str("_STAR_"),
            '/' => out.push_str("_SLASH_"),
            '+' => out.push_str("_PLUS_"),
            '<' => out.push_str("_LT_"),
            '>' => out.push_str("_GT_"),
            '=' => out.push_str("_EQ_"),
            '%' => out.push_str("_PCT_"),
            '&' => out.push_str("_AMP_"),
            c if c.is_alphanumeric() || c == '_' || c == '$' => out.push(c),
            c => out.push_str(&format!("_U{:04X}_", c as u32)),
        }
    }
    if out.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        out.insert(0, '_');
    }
    out
}

fn is_already_valid(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else { return false };
    if !(first.is_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Tracks every sanitized name emitted so far and reports the rare case
/// where two distinct source identifiers sanitize to the same output —
/// possible in principle if a program defines both `a?` and a literal
/// `a_QMARK_`, which the fixed escape table cannot distinguish after the
/// fact.
#[derive(Default)]
pub struct CollisionTracker {
    seen: FxHashMap<String, String>,
}

impl CollisionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `original`'s sanitized form. Returns `Some(previous)` if a
    /// different original identifier already produced the same output.
    pub fn record(&mut self, original: &str) -> Option<String> {
        let sanitized = sanitize_identifier(original);
        match self.seen.get(&sanitized) {
            Some(prev) if prev != original => Some(prev.clone()),
            _ => {
                self.seen.insert(sanitized, original.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_plain_identifiers_untouched() {
        assert_eq!(sanitize_identifier("foo"), "foo");
        assert_eq!(sanitize_identifier("_bar"), "_bar");
    }

    #[test]
    fn rewrites_kebab_case_and_predicate_names() {
        assert_eq!(sanitize_identifier("my-value"), "my_value");
        assert_eq!(sanitize_identifier("empty?"), "empty_QMARK_");
        assert_eq!(sanitize_identifier("reset!"), "reset_BANG_");
    }

    #[test]
    fn rewrites_operator_shaped_names() {
        assert_eq!(sanitize_identifier("*star*"), "_STAR_star_STAR_");
        assert_eq!(sanitize_identifier("a/b"), "a_SLASH_b");
    }

    #[test]
    fn is_total_over_arbitrary_codepoints() {
        assert_eq!(sanitize_identifier("λ"), "_U03BB_");
    }

    #[test]
    fn collision_tracker_flags_repeat_sanitized_names() {
        let mut tracker = CollisionTracker::new();
        assert!(tracker.record("empty?").is_none());
        assert!(tracker.record("empty_QMARK_").is_some());
    }
}
