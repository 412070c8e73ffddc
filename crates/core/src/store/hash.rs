//! Cache key generation for response entries.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request.
///
/// The key is the normalized request identity: method plus full URL.
/// Two requests with the same method and URL always map to the same
/// entry regardless of which partition stores them.
pub fn entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = entry_key("GET", "https://tablemate.app/app.css");
        let key2 = entry_key("GET", "https://tablemate.app/app.css");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_method_case_insensitive() {
        let key1 = entry_key("get", "https://tablemate.app/");
        let key2 = entry_key("GET", "https://tablemate.app/");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_different_urls() {
        let key1 = entry_key("GET", "https://tablemate.app/dinners");
        let key2 = entry_key("GET", "https://tablemate.app/profiles");
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_key_format() {
        let key = entry_key("GET", "https://tablemate.app/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
