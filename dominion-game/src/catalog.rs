//! Static content catalog: advisors, techs and run edicts.
//!
//! The simulation only consumes the declared effect kind and magnitude of an
//! entry, looked up by id.
use serde::{Deserialize, Serialize};

use crate::economy::ActionKind;
use crate::effects::{AcquiredEffect, EffectKind};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Advisor,
    Tech,
    Edict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    pub effect: EffectKind,
    pub magnitude: f64,
    /// Gold price; only shop techs charge one
    #[serde(default)]
    pub price: i64,
    /// Action whose mastery level rises by one on acquisition
    #[serde(default)]
    pub mastery: Option<ActionKind>,
}

impl CatalogEntry {
    #[must_use]
    pub fn to_effect(&self) -> AcquiredEffect {
        AcquiredEffect {
            id: self.id.clone(),
            effect: self.effect,
            magnitude: self.magnitude,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Parse a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into catalog entries.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded JSON is malformed.
    pub fn builtin() -> Result<Self, serde_json::Error> {
        Self::from_json(BUILTIN_CATALOG)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn of_kind(&self, kind: EntryKind) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses_every_kind() {
        let catalog = Catalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.of_kind(EntryKind::Advisor).count() >= 3);
        assert!(catalog.of_kind(EntryKind::Tech).count() >= 4);
        assert!(catalog.of_kind(EntryKind::Edict).count() >= 1);
        for entry in &catalog.entries {
            assert!(entry.magnitude > 0.0, "{} has no effect", entry.id);
            assert!(entry.price >= 0);
        }
    }

    #[test]
    fn lookup_by_id_resolves_effect() {
        let catalog = Catalog::builtin().unwrap();
        let entry = catalog.get("tech_masonry").unwrap();
        assert_eq!(entry.kind, EntryKind::Tech);
        assert_eq!(entry.mastery, Some(ActionKind::Build));
        let effect = entry.to_effect();
        assert_eq!(effect.effect, EffectKind::BuildCost);
        assert!(catalog.get("missing").is_none());
    }

    #[test]
    fn optional_fields_default() {
        let json = r#"{ "entries": [
            { "id": "x", "name": "X", "kind": "advisor", "effect": "offense", "magnitude": 0.1 }
        ] }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries[0].price, 0);
        assert!(catalog.entries[0].mastery.is_none());
    }
}
