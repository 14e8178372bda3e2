//! Read-only mission definitions.
use crate::error::MissionError;
use crate::mission::{Mission, MissionId};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_MISSION_DATA: &str = include_str!("../assets/missions.json");

/// Source of mission definitions.
pub trait MissionCatalog {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Look up a mission by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn get_mission(&self, id: MissionId) -> Result<Option<Mission>, Self::Error>;

    /// Every mission in id order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn all_missions(&self) -> Result<Vec<Mission>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("mission data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] MissionError),
    #[error("duplicate {0}")]
    Duplicate(MissionId),
}

#[derive(Debug, Deserialize, Serialize)]
struct MissionFile {
    missions: Vec<Mission>,
}

/// Validated, immutable set of missions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaticCatalog {
    missions: Vec<Mission>,
}

impl StaticCatalog {
    /// Validate and index a list of missions.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Invalid`] for a mission breaking its invariants
    /// and [`CatalogError::Duplicate`] for repeated ids.
    pub fn from_missions(mut missions: Vec<Mission>) -> Result<Self, CatalogError> {
        for mission in &missions {
            mission.validate()?;
        }
        missions.sort_by_key(|mission| mission.id);
        if let Some(pair) = missions.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(CatalogError::Duplicate(pair[0].id));
        }
        Ok(Self { missions })
    }

    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a mission is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: MissionFile = serde_json::from_str(json)?;
        Self::from_missions(file.missions)
    }

    /// Parse the embedded mission asset, falling back to an empty catalog.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_MISSION_DATA).unwrap_or_else(|err| {
            log::error!("embedded mission asset rejected: {err}");
            Self::default()
        })
    }

    #[must_use]
    pub fn default_catalog() -> &'static Self {
        static CATALOG: OnceLock<StaticCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    #[must_use]
    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    #[must_use]
    pub fn find(&self, id: MissionId) -> Option<&Mission> {
        self.missions
            .binary_search_by_key(&id, |mission| mission.id)
            .ok()
            .and_then(|idx| self.missions.get(idx))
    }
}

impl MissionCatalog for StaticCatalog {
    type Error = std::convert::Infallible;

    fn get_mission(&self, id: MissionId) -> Result<Option<Mission>, Self::Error> {
        Ok(self.find(id).cloned())
    }

    fn all_missions(&self) -> Result<Vec<Mission>, Self::Error> {
        Ok(self.missions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::Difficulty;

    #[test]
    fn embedded_catalog_has_three_tiers() {
        let catalog = StaticCatalog::default_catalog();
        let missions = catalog.all_missions().unwrap();
        assert_eq!(missions.len(), 3);
        let tagger = catalog.get_mission(MissionId(1)).unwrap().unwrap();
        assert_eq!(tagger.name, "Street Tagger");
        assert_eq!(tagger.difficulty, Difficulty::Easy);
        assert_eq!((tagger.cost, tagger.min_reward, tagger.max_reward), (1, 2, 5));
        let hack = catalog.find(MissionId(3)).unwrap();
        assert_eq!(hack.difficulty, Difficulty::Hard);
        assert_eq!(hack.time_required, "2 hours");
        assert!(catalog.get_mission(MissionId(99)).unwrap().is_none());
    }

    #[test]
    fn invalid_missions_are_rejected() {
        let json = r#"{ "missions": [
            { "id": 4, "name": "Broken", "description": "", "difficulty": "Easy",
              "cost": 5, "min_reward": 9, "max_reward": 3, "success_rate": 50 }
        ] }"#;
        assert!(matches!(
            StaticCatalog::from_json(json),
            Err(CatalogError::Invalid(MissionError::InvalidMission(_)))
        ));
        assert!(matches!(
            StaticCatalog::from_json("{ not json"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mission = Mission::new(MissionId(1), "Twice", Difficulty::Easy, 1, (1, 2)).unwrap();
        let err = StaticCatalog::from_missions(vec![mission.clone(), mission]).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(MissionId(1))));
    }
}
