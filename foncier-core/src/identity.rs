//! Identity, timestamps and content hashing

use chrono::{DateTime, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Entity identifier using UUIDv7, so ids sort by creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// SHA-256 digest of a stored file.
pub type ContentHash = [u8; 32];

/// Prefix of server-generated cadastral references.
pub const AUTO_REFERENCE_PREFIX: &str = "AUTO-";

/// Generate a new UUIDv7 EntityId.
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

/// Compute SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hasher.finalize().into()
}

/// Hex rendering of [`compute_content_hash`].
pub fn content_hash_hex(content: &[u8]) -> String {
    hex::encode(compute_content_hash(content))
}

/// Reference for parcels registered without one: `AUTO-` and 8 hex digits.
pub fn generate_reference() -> String {
    let suffix: u32 = rand::rng().random();
    format!("{AUTO_REFERENCE_PREFIX}{suffix:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_v7() {
        let a = new_entity_id();
        assert_eq!(a.get_version_num(), 7);
        assert_ne!(a, new_entity_id());
    }

    #[test]
    fn test_content_hash_known_vector() {
        assert_eq!(
            content_hash_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_generated_reference_shape() {
        let reference = generate_reference();
        assert_eq!(reference.len(), AUTO_REFERENCE_PREFIX.len() + 8);
        assert!(reference.starts_with(AUTO_REFERENCE_PREFIX));
        assert!(reference[5..].chars().all(|c| c.is_ascii_hexdigit()));
    }
}
