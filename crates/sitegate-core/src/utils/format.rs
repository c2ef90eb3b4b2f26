/// Number of leading hex characters shown when a digest is displayed or logged
const SHORT_HASH_LEN: usize = 12;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Shorten a hex digest for display and log fields.
/// Full digests never need to appear in logs.
pub fn short_hash(hash: &str) -> String {
    if hash.chars().count() <= SHORT_HASH_LEN {
        hash.to_string()
    } else {
        let prefix: String = hash.chars().take(SHORT_HASH_LEN).collect();
        format!("{}...", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Hello", 2), "He");
    }

    #[test]
    fn test_short_hash() {
        let digest = "a".repeat(64);
        assert_eq!(short_hash(&digest), format!("{}...", "a".repeat(12)));
        assert_eq!(short_hash("abc"), "abc"); // Already short, return as-is
        assert_eq!(short_hash(""), "");
    }

    #[test]
    fn test_short_hash_non_ascii() {
        // Session files are editable, so stored hashes may not be hex
        assert_eq!(short_hash("aéééééé"), "aéééééé");
        assert_eq!(short_hash("aéééééééééééééé"), "aééééééééééé...");
        assert_eq!(short_hash(&"ü".repeat(40)), format!("{}...", "ü".repeat(12)));
    }
}
