//! Narrative and archetype pools backing the content generator.
use crate::stats::Stat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

const DEFAULT_CONTENT_DATA: &str = include_str!("../assets/content.json");

/// Placeholder replaced with a stat name in complication and lesson templates.
pub const STAT_PLACEHOLDER: &str = "{stat}";

/// Template for one kind of action a player can be offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionArchetype {
    pub stat: Stat,
    pub name: String,
    pub description: String,
    pub risk: u8,
}

/// Name and description for the all-round `success` offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialOfferText {
    pub name: String,
    pub description: String,
}

/// Progress event that boosts one stat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomEventDef {
    pub stat: Stat,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AbortText {
    pub narrative: String,
    pub lesson: String,
}

/// Loot that may drop after a successful mission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BonusItem {
    pub name: String,
    #[serde(default)]
    pub icon: String,
}

/// All text pools used by the content generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContentData {
    #[serde(default)]
    pub archetypes: Vec<ActionArchetype>,
    #[serde(default)]
    pub special_offers: Vec<SpecialOfferText>,
    #[serde(default)]
    pub narratives: Vec<String>,
    #[serde(default)]
    pub complications: Vec<String>,
    #[serde(default)]
    pub milestones: Vec<String>,
    #[serde(default)]
    pub continue_fallback: String,
    #[serde(default)]
    pub random_events: Vec<RandomEventDef>,
    #[serde(default)]
    pub failure_reasons: BTreeMap<Stat, Vec<String>>,
    #[serde(default)]
    pub lessons: Vec<String>,
    #[serde(default)]
    pub success_headlines: Vec<String>,
    #[serde(default)]
    pub abort: AbortText,
    #[serde(default)]
    pub bonus_items: Vec<BonusItem>,
}

impl ContentData {
    /// Load content pools from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into content data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse the embedded content asset, falling back to empty pools.
    #[must_use]
    pub fn load_from_static() -> Self {
        match Self::from_json(DEFAULT_CONTENT_DATA) {
            Ok(data) => data,
            Err(err) => {
                log::error!("embedded content asset failed to parse: {err}");
                Self::default()
            }
        }
    }

    /// Shared instance of the embedded content.
    #[must_use]
    pub fn default_content() -> &'static Self {
        static CONTENT: OnceLock<ContentData> = OnceLock::new();
        CONTENT.get_or_init(Self::load_from_static)
    }

    /// Archetypes that affect `stat`, in asset order.
    pub fn archetypes_for(&self, stat: Stat) -> impl Iterator<Item = &ActionArchetype> {
        self.archetypes.iter().filter(move |arch| arch.stat == stat)
    }

    /// Failure reasons keyed by `stat`, falling back to the luck pool.
    #[must_use]
    pub fn failure_reasons_for(&self, stat: Stat) -> &[String] {
        self.failure_reasons
            .get(&stat)
            .or_else(|| self.failure_reasons.get(&Stat::Luck))
            .map_or(&[], Vec::as_slice)
    }
}

/// Replace the stat placeholder in a template.
#[must_use]
pub fn fill_stat(template: &str, stat: Stat) -> String {
    template.replace(STAT_PLACEHOLDER, stat.key())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_content_is_complete() {
        let data = ContentData::default_content();
        for stat in Stat::ALL {
            assert_eq!(data.archetypes_for(stat).count(), 5, "{stat} archetypes");
            assert_eq!(data.failure_reasons_for(stat).len(), 3);
        }
        assert!(data.archetypes.iter().all(|arch| (10..=50).contains(&arch.risk)));
        assert_eq!(data.narratives.len(), 12);
        assert_eq!(data.milestones.len(), 5);
        assert_eq!(data.random_events.len(), 4);
        assert_eq!(data.bonus_items.len(), 5);
        assert!(data.lessons.iter().any(|lesson| lesson.contains(STAT_PLACEHOLDER)));
        assert!(!data.abort.narrative.is_empty());
    }

    #[test]
    fn missing_failure_pool_uses_luck() {
        let data = ContentData::from_json(
            r#"{ "failure_reasons": { "luck": ["Bad break."] } }"#,
        )
        .unwrap();
        assert_eq!(data.failure_reasons_for(Stat::Speed), ["Bad break."]);
        assert!(ContentData::default().failure_reasons_for(Stat::Luck).is_empty());
    }

    #[test]
    fn fill_stat_interpolates_name() {
        assert_eq!(
            fill_stat("Your {stat} is tested.", Stat::Intimidation),
            "Your intimidation is tested."
        );
    }
}
