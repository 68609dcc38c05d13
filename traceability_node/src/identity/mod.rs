//! Participant directory.
//!
//! Chain events carry only an address; the directory maps it to a
//! display profile for consumer views. Resolution is best-effort: an
//! unknown address simply has no profile attached.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Role a registered participant plays in the supply chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Collector,
    Tester,
    Processor,
    Manufacturer,
    Admin,
}

/// Display profile behind a participant address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantProfile {
    pub name: String,
    pub organization: String,
    pub role: ParticipantRole,
}

/// Maps a chain address to a display profile, if one is registered.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, address: &str) -> Option<ParticipantProfile>;
}

/// Process-local directory. Addresses match case-insensitively, since
/// chain backends are inconsistent about hex casing.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    profiles: RwLock<HashMap<String, ParticipantProfile>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, address: &str, profile: ParticipantProfile) {
        let mut profiles = self.profiles.write().await;
        profiles.insert(address.to_lowercase(), profile);
    }

    /// Directory pre-seeded with one participant per role, for demo mode.
    pub async fn with_demo_participants() -> Self {
        let directory = Self::new();
        let seed = [
            ("0xc0110001", "Ramesh Kumar", "Himalayan Herb Collectors", ParticipantRole::Collector),
            ("0x7e570002", "Dr. Priya Sharma", "AyurLab Quality Services", ParticipantRole::Tester),
            ("0xp20c0003", "Suresh Patel", "Vedic Processing Unit", ParticipantRole::Processor),
            ("0x3afc0004", "Anita Singh", "HerbionYX Manufacturing", ParticipantRole::Manufacturer),
        ];
        for (address, name, organization, role) in seed {
            directory
                .register(
                    address,
                    ParticipantProfile {
                        name: name.to_string(),
                        organization: organization.to_string(),
                        role,
                    },
                )
                .await;
        }
        directory
    }
}

#[async_trait]
impl IdentityResolver for InMemoryDirectory {
    async fn resolve(&self, address: &str) -> Option<ParticipantProfile> {
        let profiles = self.profiles.read().await;
        profiles.get(&address.to_lowercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolution_ignores_address_casing() {
        let directory = InMemoryDirectory::new();
        directory
            .register(
                "0xAbCdEf",
                ParticipantProfile {
                    name: "Ramesh Kumar".to_string(),
                    organization: "Himalayan Herb Collectors".to_string(),
                    role: ParticipantRole::Collector,
                },
            )
            .await;

        let profile = directory.resolve("0xABCDEF").await.expect("registered");
        assert_eq!(profile.name, "Ramesh Kumar");
        assert_eq!(profile.role, ParticipantRole::Collector);
        assert!(directory.resolve("0xother").await.is_none());
    }
}
