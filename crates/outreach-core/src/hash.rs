//! Hash helpers for content fingerprints.

use sha2::{Digest, Sha256};

/// Compute a stable, lower-case hex SHA-256 fingerprint of a string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::sha256_hex;

    #[test]
    fn test_hash_stable() {
        let first = sha256_hex("a@b.c|street|cardio|Oran");
        let second = sha256_hex("a@b.c|street|cardio|Oran");
        let different = sha256_hex("a@b.c|street|cardio|Algiers");

        assert_eq!(first, second);
        assert_ne!(first, different);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_hash_known_value() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
