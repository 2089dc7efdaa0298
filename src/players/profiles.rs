use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::Arc;

use crate::cluster::validate::{validate_external_id, ValidationError};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub external_id: String,
    pub display_name: String,
}

/// Display names registered by admins, keyed by the player's external id.
pub struct PlayerProfiles {
    db: Arc<Db>,
}

impl PlayerProfiles {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(db_path)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Throwaway store, removed when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn get(&self, external_id: &str) -> Result<Option<PlayerProfile>> {
        if let Some(data) = self.db.get(external_id.as_bytes())? {
            let profile: PlayerProfile = serde_json::from_slice(&data)?;
            Ok(Some(profile))
        } else {
            Ok(None)
        }
    }

    pub fn display_name(&self, external_id: &str) -> Result<Option<String>> {
        Ok(self
            .get(external_id)?
            .map(|p| p.display_name)
            .filter(|name| !name.is_empty()))
    }

    /// Create, update or (for an empty name) delete a profile.
    pub fn set_display_name(&self, external_id: &str, display_name: &str) -> Result<Option<PlayerProfile>> {
        validate_external_id(external_id)?;
        let display_name = display_name.trim();

        if display_name.is_empty() {
            self.db.remove(external_id.as_bytes())?;
            tracing::info!("Deleted player profile {}", external_id);
            return Ok(None);
        }
        if display_name.chars().count() > 64 {
            return Err(ValidationError::TooLong {
                field: "displayName".to_string(),
                max: 64,
            }
            .into());
        }

        let profile = PlayerProfile {
            external_id: external_id.to_string(),
            display_name: display_name.to_string(),
        };
        let serialized = serde_json::to_vec(&profile)?;
        self.db.insert(external_id.as_bytes(), serialized)?;

        tracing::info!("Registered display name for {}", external_id);
        Ok(Some(profile))
    }

    pub fn list(&self) -> Result<Vec<PlayerProfile>> {
        let mut profiles = Vec::new();
        for item in self.db.iter() {
            let (_, value) = item?;
            let profile: PlayerProfile = serde_json::from_slice(&value)?;
            profiles.push(profile);
        }
        Ok(profiles)
    }
}
