//! Shared secret comparison.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

/// Whether `presented` equals the configured secret.
///
/// Both values are hashed first so the byte comparison always runs over two
/// 32-byte digests, whatever the lengths of the inputs.
#[must_use]
pub fn secrets_match(expected: &SecretString, presented: &str) -> bool {
    let expected = Sha256::digest(expected.expose_secret().as_bytes());
    let presented = Sha256::digest(presented.as_bytes());

    expected
        .iter()
        .zip(presented.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_secrets_match() {
        assert!(secrets_match(&SecretString::from("s3cret"), "s3cret"));
    }

    #[test]
    fn test_different_secrets_do_not_match() {
        let expected = SecretString::from("s3cret");
        assert!(!secrets_match(&expected, "s3cre"));
        assert!(!secrets_match(&expected, "s3cret "));
        assert!(!secrets_match(&expected, ""));
    }
}
