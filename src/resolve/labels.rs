//! Branch roles of labelled execution edges.

pub const THEN_LABELS: &[&str] = &["then", "true", "yes"];
pub const ELSE_LABELS: &[&str] = &["else", "false", "no"];
pub const BODY_LABELS: &[&str] = &["body", "loop", "loop_body", "each", "do"];

/// Case-insensitive match, with spaces and dashes read as underscores.
pub fn matches_label(label: &str, accepted: &[&str]) -> bool {
    let label = label.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    accepted.contains(&label.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_normalized_before_matching() {
        assert!(matches_label("Then", THEN_LABELS));
        assert!(matches_label(" TRUE ", THEN_LABELS));
        assert!(matches_label("Loop Body", BODY_LABELS));
        assert!(matches_label("loop-body", BODY_LABELS));
        assert!(!matches_label("completed", BODY_LABELS));
        assert!(!matches_label("else", THEN_LABELS));
    }
}
