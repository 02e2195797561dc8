//! Hashing and address primitives for LedgerChain

use sha2::{Digest, Sha256};

/// A 256-bit SHA-256 digest.
pub type Sha256Hash = [u8; 32];

/// Previous-hash marker of the genesis block.
pub const ZERO_HASH: Sha256Hash = [0u8; 32];

/// Maximum address length in characters.
pub const MAX_ADDRESS_LEN: usize = 63;

/// SHA-256 over a byte slice.
pub fn sha256(data: &[u8]) -> Sha256Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Convert a hash to a hex string for display.
pub fn hash_to_hex(hash: &Sha256Hash) -> String {
    hex::encode(hash)
}

/// An address is well-formed when it has 1..=63 characters and none of them is
/// an ASCII control character (0x00..=0x1F, 0x7F).
pub fn is_valid_address(address: &str) -> bool {
    let len = address.chars().count();
    if len == 0 || len > MAX_ADDRESS_LEN {
        return false;
    }
    address.chars().all(|c| !(c < ' ' || c == '\u{7f}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hash_to_hex(&sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_address_bounds() {
        assert!(is_valid_address("alice"));
        assert!(is_valid_address(&"a".repeat(MAX_ADDRESS_LEN)));
        assert!(!is_valid_address(""));
        assert!(!is_valid_address(&"a".repeat(MAX_ADDRESS_LEN + 1)));
    }

    #[test]
    fn test_address_rejects_control_characters() {
        assert!(!is_valid_address("ali\nce"));
        assert!(!is_valid_address("bob\0"));
        assert!(!is_valid_address("del\u{7f}"));
        assert!(is_valid_address("ünïcödé wallet"));
    }
}
