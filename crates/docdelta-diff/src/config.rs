use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// Attribute keys that are bookkeeping rather than content.
///
/// Block ids are regenerated every time a document is loaded and revision
/// session ids change on every save, so neither says anything about what a
/// user edited.
pub const IGNORED_ATTRIBUTES: &[&str] = &[
    "sdBlockId",
    "sdBlockRev",
    "rsidR",
    "rsidRDefault",
    "rsidP",
    "rsidRPr",
    "rsidDel",
];

/// Tunables for the diff engine.
///
/// The similarity threshold and minimum length were picked empirically;
/// keep them configurable rather than re-deriving them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Minimum similarity (1 - distance / longest length) for a deleted and
    /// an inserted paragraph to be reported as one modified paragraph.
    pub similarity_threshold: f64,
    /// Paragraphs shorter than this (by the longer text) are never re-paired
    /// on similarity alone.
    pub min_similarity_length: usize,
    /// Attribute keys skipped at every nesting level.
    pub ignored_attributes: Vec<String>,
    /// Type name of paragraph-like blocks.
    pub paragraph_type: String,
    /// Type name of inline runs whose attributes apply to the text inside.
    pub run_type: String,
    /// Type name of table rows.
    pub row_type: String,
    /// Attribute holding a paragraph's stable identifier.
    pub paragraph_id_attr: String,
    /// Attribute holding a row's stable identifier.
    pub row_id_attr: String,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.65,
            min_similarity_length: 4,
            ignored_attributes: IGNORED_ATTRIBUTES.iter().map(|k| k.to_string()).collect(),
            paragraph_type: "paragraph".into(),
            run_type: "run".into(),
            row_type: "tableRow".into(),
            paragraph_id_attr: "paraId".into(),
            row_id_attr: "paraId".into(),
        }
    }
}

impl DiffConfig {
    /// Parse a TOML fragment. Missing keys keep their defaults.
    ///
    /// ```rust
    /// use docdelta_diff::DiffConfig;
    ///
    /// let config = DiffConfig::from_toml_str("similarity_threshold = 0.8").unwrap();
    /// assert_eq!(config.similarity_threshold, 0.8);
    /// assert_eq!(config.paragraph_type, "paragraph");
    /// ```
    pub fn from_toml_str(source: &str) -> DiffResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make the heuristics meaningless.
    pub fn validate(&self) -> DiffResult<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(DiffError::invalid_config(
                "similarity_threshold",
                format!("{} is outside 0.0..=1.0", self.similarity_threshold),
            ));
        }
        let type_names = [
            ("paragraph_type", &self.paragraph_type),
            ("run_type", &self.run_type),
            ("row_type", &self.row_type),
            ("paragraph_id_attr", &self.paragraph_id_attr),
            ("row_id_attr", &self.row_id_attr),
        ];
        for (field, value) in type_names {
            if value.trim().is_empty() {
                return Err(DiffError::invalid_config(field, "must not be empty"));
            }
        }
        Ok(())
    }

    /// Whether `key` is in the configured ignore set.
    pub fn is_ignored(&self, key: &str) -> bool {
        self.ignored_attributes.iter().any(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DiffConfig::default();
        assert_eq!(c.similarity_threshold, 0.65);
        assert_eq!(c.min_similarity_length, 4);
        assert!(c.is_ignored("sdBlockId"));
        assert!(!c.is_ignored("paraId"));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn toml_overrides_selected_keys() {
        let c = DiffConfig::from_toml_str(
            r#"
            min_similarity_length = 10
            ignored_attributes = ["revision"]
            row_type = "row"
            "#,
        )
        .unwrap();
        assert_eq!(c.min_similarity_length, 10);
        assert_eq!(c.row_type, "row");
        assert!(c.is_ignored("revision"));
        assert!(!c.is_ignored("sdBlockId"));
        assert_eq!(c.similarity_threshold, 0.65);
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let err = DiffConfig::from_toml_str("similarity_threshold = 1.5").unwrap_err();
        assert!(matches!(
            err,
            DiffError::InvalidConfig { field: "similarity_threshold", .. }
        ));
    }

    #[test]
    fn empty_type_name_rejected() {
        let config = DiffConfig {
            paragraph_type: " ".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DiffError::InvalidConfig { field: "paragraph_type", .. })
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = DiffConfig::from_toml_str("similarity_threshold = ").unwrap_err();
        assert!(matches!(err, DiffError::ConfigParse(_)));
    }
}
