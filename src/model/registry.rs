use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use super::BodyRecord;
use crate::error::{SceneError, SceneResult};

/// Static table of body records, keyed by body key.
///
/// Iteration order is the order the bodies appear in the data file. Records
/// are never mutated after loading.
#[derive(Debug, Clone, Default)]
pub struct BodyRegistry {
    // Invariant: `index[key]` is the position of `key` in `records`
    records: Vec<(String, BodyRecord)>,
    index: HashMap<String, usize>,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_file(path: impl AsRef<Path>) -> SceneResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Parses a JSON object mapping body key to record.
    ///
    /// Malformed records are logged and skipped; the rest of the table still
    /// loads. Only a document that isn't a JSON object at all is an error.
    pub fn from_json_str(text: &str) -> SceneResult<Self> {
        let table: Map<String, Value> = serde_json::from_str(text)?;

        let mut registry = Self::new();
        for (key, value) in table {
            match serde_json::from_value::<BodyRecord>(value) {
                Ok(record) => registry.insert(key, record),
                Err(e) => {
                    tracing::warn!(body = %key, error = %e, "skipping malformed body record");
                }
            }
        }

        tracing::debug!("loaded {} body records", registry.len());
        Ok(registry)
    }

    /// Adds a record, replacing any existing record with the same key in place.
    pub fn insert(&mut self, key: impl Into<String>, record: BodyRecord) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&idx) => self.records[idx].1 = record,
            None => {
                self.index.insert(key.clone(), self.records.len());
                self.records.push((key, record));
            }
        }
    }

    pub fn get(&self, key: &str) -> SceneResult<&BodyRecord> {
        self.index
            .get(key)
            .map(|&idx| &self.records[idx].1)
            .ok_or_else(|| SceneError::UnknownBody(key.to_owned()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BodyRecord)> + '_ {
        self.records.iter().map(|(key, record)| (key.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "sun": {
            "name": "Sun", "model": "sun.obj", "diameter": 1391400,
            "distance": 0, "day": 25.4, "year": 0, "inclination": 0, "obliquity": 7.25
        },
        "mercury": {
            "name": "Mercury", "model": "mercury.obj", "parent": "sun", "diameter": 4879,
            "distance": 57.9, "day": 58.6, "year": 88, "inclination": 7, "obliquity": 0.03
        },
        "broken": { "name": "Broken", "diameter": "big" },
        "venus": {
            "name": "Venus", "model": "venus.obj", "parent": "sun", "diameter": 12104,
            "distance": 108.2, "day": 243, "year": 224.7, "inclination": 3.4,
            "obliquity": 177.4, "retrograde": true
        }
    }"#;

    #[test]
    fn test_preserves_file_order() {
        let registry = BodyRegistry::from_json_str(TABLE).unwrap();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["sun", "mercury", "venus"]);
    }

    #[test]
    fn test_skips_malformed_records() {
        let registry = BodyRegistry::from_json_str(TABLE).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(matches!(
            registry.get("broken"),
            Err(SceneError::UnknownBody(_))
        ));
    }

    #[test]
    fn test_get() {
        let registry = BodyRegistry::from_json_str(TABLE).unwrap();
        let venus = registry.get("venus").unwrap();
        assert_eq!(venus.name, "Venus");
        assert_eq!(venus.parent, "sun");
        assert!(venus.retrograde);
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(BodyRegistry::from_json_str("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut registry = BodyRegistry::from_json_str(TABLE).unwrap();
        let mut sun = registry.get("sun").unwrap().clone();
        sun.name = String::from("Sol");
        registry.insert("sun", sun);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names().next(), Some("sun"));
        assert_eq!(registry.get("sun").unwrap().name, "Sol");
    }
}
