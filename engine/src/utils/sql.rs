//! SQL text helpers

/// Escape LIKE metacharacters (`%`, `_`, `\`) so a value matches literally
///
/// Patterns built from the result must be rendered with `ESCAPE '\'`.
///
/// ```
/// use gridfilter::utils::sql::escape_like_pattern;
///
/// let pattern = format!("{}%", escape_like_pattern("50%_off"));
/// assert_eq!(pattern, "50\\%\\_off%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(escape_like_pattern("GEN-01"), "GEN-01");
        assert_eq!(escape_like_pattern(""), "");
    }

    #[test]
    fn metacharacters_are_escaped() {
        assert_eq!(escape_like_pattern("100%"), "100\\%");
        assert_eq!(escape_like_pattern("line_a"), "line\\_a");
        assert_eq!(escape_like_pattern("a\\b"), "a\\\\b");
    }

    #[test]
    fn backslash_escaped_before_others() {
        assert_eq!(escape_like_pattern("\\%"), "\\\\\\%");
    }
}
