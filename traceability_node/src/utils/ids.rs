//! Identifier minting and QR payload hashing.
//!
//! Identifiers follow the `<PREFIX>-<millis>-<random>` convention the
//! rest of the network uses. Only uniqueness is contractual; nothing may
//! parse structure back out of an identifier.

use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::types::EventType;

fn mint(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let random = rand::thread_rng().gen_range(0..10_000);
    format!("{}-{}-{}", prefix, millis, random)
}

/// New batch identifier, e.g. `HERB-1718000000000-4821`.
pub fn generate_batch_id() -> String {
    mint("HERB")
}

/// New event identifier for the given kind,
/// e.g. `QUALITY_TEST-1718000000000-193`.
pub fn generate_event_id(kind: EventType) -> String {
    mint(kind.id_prefix())
}

/// Hash bound into an event's QR code, tying the code to the batch and
/// event it resolves to. The code image itself is rendered elsewhere.
pub fn qr_code_hash(batch_id: &str, event_id: &str) -> String {
    let digest = Sha256::digest(format!("{}:{}", batch_id, event_id).as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_ids_carry_the_herb_prefix() {
        let id = generate_batch_id();
        assert!(id.starts_with("HERB-"));
        assert_eq!(id.split('-').count(), 3);
    }

    #[test]
    fn event_ids_carry_the_kind_prefix() {
        assert!(generate_event_id(EventType::QualityTest).starts_with("QUALITY_TEST-"));
        assert!(generate_event_id(EventType::Manufacturing).starts_with("MANUFACTURING-"));
    }

    #[test]
    fn qr_hash_is_stable_and_binding() {
        let first = qr_code_hash("HERB-1", "QUALITY_TEST-1");
        let second = qr_code_hash("HERB-1", "QUALITY_TEST-1");
        assert_eq!(first, second);
        assert_ne!(first, qr_code_hash("HERB-2", "QUALITY_TEST-1"));
        assert_eq!(first.len(), 64);
    }
}
