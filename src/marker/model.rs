//! Typed marker-set records.
//!
//! `MarkerSetFields` mirrors one definition file (camelCase at the file
//! boundary); `MarkerSet` is the validated, normalized record handed to
//! callers. The only way to obtain a `MarkerSet` is through the rules in
//! `marker::rules`, including when deserializing one.

use crate::marker::rules::{self, MarkerSetError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Deserialize)]
/// Raw marker definition as stored on disk, before domain rules run.
pub struct MarkerSetFields {
    pub name: String,
    pub keywords: Vec<String>,
    #[serde(default, rename = "semanticHints", alias = "semantic_hints")]
    pub semantic_hints: Vec<String>,
    #[serde(default, rename = "promptInserts", alias = "prompt_inserts")]
    pub prompt_inserts: BTreeMap<String, String>,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MarkerSetFields")]
/// One named detection rule. Immutable once built.
pub struct MarkerSet {
    name: String,
    keywords: Vec<String>,
    semantic_hints: Vec<String>,
    prompt_inserts: BTreeMap<String, String>,
    version: String,
}

impl MarkerSet {
    /// Build a marker set with no hints and no prompt inserts.
    pub fn new<I, S>(
        name: impl Into<String>,
        keywords: I,
        version: impl Into<String>,
    ) -> Result<Self, MarkerSetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let version = version.into();
        rules::validate_name(&name)?;
        let keywords = rules::normalize_keywords(keywords)?;
        rules::validate_version(&version)?;
        Ok(Self {
            name,
            keywords,
            semantic_hints: Vec::new(),
            prompt_inserts: BTreeMap::new(),
            version,
        })
    }

    pub fn with_semantic_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.semantic_hints = hints.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prompt_inserts<I, K, V>(mut self, inserts: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.prompt_inserts = inserts
            .into_iter()
            .map(|(lang, text)| (lang.into(), text.into()))
            .collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized keywords: trimmed, non-empty, unique, first occurrence order.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn semantic_hints(&self) -> &[String] {
        &self.semantic_hints
    }

    /// Prompt text keyed by language code.
    pub fn prompt_inserts(&self) -> &BTreeMap<String, String> {
        &self.prompt_inserts
    }

    pub fn prompt_insert(&self, lang: &str) -> Option<&str> {
        self.prompt_inserts.get(lang).map(String::as_str)
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl TryFrom<MarkerSetFields> for MarkerSet {
    type Error = MarkerSetError;

    fn try_from(fields: MarkerSetFields) -> Result<Self, Self::Error> {
        Ok(MarkerSet::new(fields.name, fields.keywords, fields.version)?
            .with_semantic_hints(fields.semantic_hints)
            .with_prompt_inserts(fields.prompt_inserts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_marker_gets_empty_defaults() {
        let marker = MarkerSet::new("Minimal Marker", ["test"], "1.0.0").unwrap();
        assert_eq!(marker.name(), "Minimal Marker");
        assert_eq!(marker.keywords(), ["test"]);
        assert_eq!(marker.version(), "1.0.0");
        assert!(marker.semantic_hints().is_empty());
        assert!(marker.prompt_inserts().is_empty());
    }

    #[test]
    fn full_marker_keeps_hints_and_inserts() {
        let marker = MarkerSet::new("Full Marker", ["test", "example"], "2.1.3")
            .unwrap()
            .with_semantic_hints(["hint1", "hint2"])
            .with_prompt_inserts([("de", "Deutsch"), ("en", "English")]);
        assert_eq!(marker.keywords().len(), 2);
        assert_eq!(marker.semantic_hints(), ["hint1", "hint2"]);
        assert_eq!(marker.prompt_insert("de"), Some("Deutsch"));
        assert_eq!(marker.prompt_insert("fr"), None);
        assert_eq!(marker.version(), "2.1.3");
    }

    #[test]
    fn construction_rejects_domain_violations() {
        assert_eq!(
            MarkerSet::new("", ["test"], "1.0.0"),
            Err(MarkerSetError::EmptyName)
        );
        assert_eq!(
            MarkerSet::new("Test", Vec::<&str>::new(), "1.0.0"),
            Err(MarkerSetError::NoKeywords)
        );
        assert_eq!(
            MarkerSet::new("Test", ["test"], "1.0"),
            Err(MarkerSetError::InvalidVersion("1.0".to_string()))
        );
    }

    #[test]
    fn file_fields_map_to_record_fields() {
        let value = json!({
            "name": "Test-Marker",
            "keywords": ["test", "test", " example "],
            "semanticHints": ["testing"],
            "promptInserts": {"de": "Test auf Deutsch", "en": "Test in English"},
            "version": "1.0.0"
        });
        let marker: MarkerSet = serde_json::from_value(value).unwrap();
        assert_eq!(marker.keywords(), ["test", "example"]);
        assert_eq!(marker.semantic_hints(), ["testing"]);
        assert_eq!(marker.prompt_insert("en"), Some("Test in English"));
    }

    #[test]
    fn serialized_record_reads_back_equal() {
        let marker = MarkerSet::new("Test Marker", ["test", "serialize"], "1.0.0")
            .unwrap()
            .with_semantic_hints(["hint"])
            .with_prompt_inserts([("de", "Test")]);

        let value = serde_json::to_value(&marker).unwrap();
        assert_eq!(value["name"], "Test Marker");
        assert_eq!(value["semantic_hints"], json!(["hint"]));
        assert_eq!(value["prompt_inserts"], json!({"de": "Test"}));

        let back: MarkerSet = serde_json::from_value(value).unwrap();
        assert_eq!(back, marker);
    }

    #[test]
    fn deserializing_runs_domain_rules() {
        let err = serde_json::from_value::<MarkerSet>(json!({
            "name": "Test",
            "keywords": ["  ", ""],
            "version": "1.0.0"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("at least one non-empty keyword"));
    }
}
