use crate::secure::{ExposeSecret, Salt};
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Computes the digest over `salt ++ canonical`.
///
/// The base64 form of the SHA-256 output is stripped to `[A-Za-z0-9]`.
/// Previously issued URLs depend on this exact form.
pub(crate) fn compute(salt: &Salt, canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.expose_secret().as_bytes());
    hasher.update(canonical.as_bytes());
    sanitize(&STANDARD.encode(hasher.finalize()))
}

pub(crate) fn sanitize(encoded: &str) -> String {
    encoded
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Constant-time digest comparison.
pub(crate) fn matches(expected: &str, received: &str) -> bool {
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salt(s: &str) -> Salt {
        Salt::try_from(s).unwrap()
    }

    #[test]
    fn test_sanitize_strips_non_alphanumerics() {
        assert_eq!(sanitize("ab+c/d=="), "abcd");
        assert_eq!(sanitize("++//=="), "");
        assert_eq!(sanitize("AZaz09"), "AZaz09");
    }

    #[test]
    fn test_digest_is_deterministic() {
        let a = compute(&salt("pepper"), "/protect-me?id=1");
        let b = compute(&salt("pepper"), "/protect-me?id=1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_known_value() {
        // base64(SHA256("abc")) = "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0="
        let digest = compute(&salt("a"), "bc");
        assert_eq!(digest, "ungWv48BzpBQUDeXa4iI7ADYaOWF3qctBDYfIAFa0");
    }

    #[test]
    fn test_digest_charset() {
        for input in ["", "/", "/a?b=c", "/path with spaces?x=%20"] {
            let digest = compute(&salt("s"), input);
            assert!(!digest.is_empty());
            assert!(digest.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(digest.len() <= 43);
        }
    }

    #[test]
    fn test_digest_depends_on_salt_and_input() {
        let base = compute(&salt("one"), "/p?id=1");
        assert_ne!(base, compute(&salt("two"), "/p?id=1"));
        assert_ne!(base, compute(&salt("one"), "/p?id=2"));
    }

    #[test]
    fn test_matches() {
        assert!(matches("abc", "abc"));
        assert!(!matches("abc", "abd"));
        assert!(!matches("abc", "abcd"));
        assert!(!matches("abc", ""));
    }
}
