//! Constant-time secret comparison.

use subtle::ConstantTimeEq;

/// Compare two secrets without short-circuiting on the first differing byte.
///
/// Inputs of different byte length return `false` straight away. That leaks
/// the length of the expected token through timing, which is accepted here;
/// the content is never leaked because equal-length inputs are always scanned
/// in full.
pub fn safe_compare(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();

    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_secrets() {
        assert!(safe_compare("sk-admin-token", "sk-admin-token"));
        assert!(safe_compare("", ""));
        assert!(safe_compare("héllo", "héllo"));
    }

    #[test]
    fn test_unequal_secrets() {
        assert!(!safe_compare("sk-admin-token", "sk-admin-tokem"));
        assert!(!safe_compare("abc", "abcd"));
        assert!(!safe_compare("", "a"));
        // Same char count, different byte length.
        assert!(!safe_compare("é", "e"));
    }

    #[test]
    fn test_matches_plain_equality() {
        let samples = ["", "a", "b", "ab", "ba", "abc123", "Bearer abc123", " abc123"];
        for a in samples {
            for b in samples {
                assert_eq!(safe_compare(a, b), a == b, "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_equal_length_mismatch_at_either_end() {
        assert!(!safe_compare("xbc123", "abc123"));
        assert!(!safe_compare("abc12x", "abc123"));
        assert!(!safe_compare("\u{1}bc12\u{0}", "\u{0}bc12\u{2}"));
    }
}
