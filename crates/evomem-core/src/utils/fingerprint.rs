//! Hashing Utilities

/// Short fingerprint: the first 16 hex chars of the MD5 digest
pub fn fingerprint(content: &str) -> String {
    let mut hex = full_fingerprint(content);
    hex.truncate(16);
    hex
}

/// Full 32-char hex MD5 digest
pub fn full_fingerprint(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_length() {
        assert_eq!(fingerprint("hello world").len(), 16);
        assert_eq!(full_fingerprint("hello world").len(), 32);

        // Same input should produce same fingerprint
        assert_eq!(fingerprint("hello world"), fingerprint("hello world"));
        assert_ne!(fingerprint("hello world"), fingerprint("hello world!"));
    }

    #[test]
    fn test_known_digest() {
        // Known MD5 digest for "hello"
        assert_eq!(full_fingerprint("hello"), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(fingerprint("hello"), "5d41402abc4b2a76");
    }
}
