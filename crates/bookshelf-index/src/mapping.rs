//! Index settings and field mappings.
//!
//! Both use the same JSON shape as an Elasticsearch `create index` body
//! and `put mapping` body, restricted to what the embedded engine
//! supports: n-gram tokenizers, `cjk_width`/`lowercase` filters, and
//! `keyword`/`text` fields with analyzed sub-fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Analyzer used for two-character phrase matching.
pub const BIGRAM_ANALYZER: &str = "bigram_analyzer";

/// Analyzer used for single-character matching.
pub const UNIGRAM_ANALYZER: &str = "unigram_analyzer";

/// Sub-field names on `title` and `contents`.
pub const BIGRAM_SUBFIELD: &str = "bigram";
pub const UNIGRAM_SUBFIELD: &str = "unigram";

/// Settings passed to `create_index`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// Custom tokenizers and the analyzers built from them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default)]
    pub tokenizer: BTreeMap<String, TokenizerSettings>,
    #[serde(default)]
    pub analyzer: BTreeMap<String, AnalyzerSettings>,
}

/// A tokenizer definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenizerSettings {
    /// Character n-grams. Only `min_gram == max_gram` is supported.
    #[serde(alias = "nGram")]
    Ngram { min_gram: usize, max_gram: usize },
}

/// A custom analyzer: one tokenizer followed by token filters in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerSettings {
    pub tokenizer: String,
    #[serde(default)]
    pub filter: Vec<TokenFilterKind>,
}

/// Built-in token filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenFilterKind {
    /// Fold full-width ASCII variants to their basic forms
    CjkWidth,
    Lowercase,
}

impl AnalysisSettings {
    /// Check that every analyzer names a defined tokenizer and every
    /// tokenizer is one the engine can build.
    pub fn validate(&self) -> Result<(), IndexError> {
        for (name, tokenizer) in &self.tokenizer {
            match tokenizer {
                TokenizerSettings::Ngram { min_gram, max_gram } => {
                    if *min_gram == 0 || min_gram != max_gram {
                        return Err(IndexError::InvalidSettings(format!(
                            "tokenizer {}: min_gram and max_gram must be equal and > 0, got {}..{}",
                            name, min_gram, max_gram
                        )));
                    }
                }
            }
        }
        for (name, analyzer) in &self.analyzer {
            if !self.tokenizer.contains_key(&analyzer.tokenizer) {
                return Err(IndexError::InvalidSettings(format!(
                    "analyzer {} references unknown tokenizer {}",
                    name, analyzer.tokenizer
                )));
            }
        }
        Ok(())
    }
}

/// Field mapping passed to `put_mapping`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMapping {
    pub properties: BTreeMap<String, FieldMapping>,
}

/// Field data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Exact value: indexed untokenized, stored, sortable
    Keyword,
    /// Full text: tokenized with the field's analyzer
    Text,
}

/// Mapping for one property or sub-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Analyzer for `text` fields; the engine default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,

    /// Multi-fields indexing the same value differently
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldMapping>,
}

impl FieldMapping {
    pub fn keyword() -> Self {
        Self {
            field_type: FieldType::Keyword,
            analyzer: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn text() -> Self {
        Self {
            field_type: FieldType::Text,
            analyzer: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn analyzed_text(analyzer: &str) -> Self {
        Self {
            analyzer: Some(analyzer.to_string()),
            ..Self::text()
        }
    }

    pub fn with_field(mut self, name: &str, field: FieldMapping) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }
}

impl IndexMapping {
    /// Reject analyzers the settings do not define and nesting deeper than
    /// one level of sub-fields.
    pub fn validate(&self, analysis: &AnalysisSettings) -> Result<(), IndexError> {
        for (name, field) in &self.properties {
            validate_field(name, field, analysis)?;
            for (sub_name, sub_field) in &field.fields {
                let path = format!("{}.{}", name, sub_name);
                if !sub_field.fields.is_empty() {
                    return Err(IndexError::InvalidMapping(format!(
                        "{}: sub-fields cannot have sub-fields",
                        path
                    )));
                }
                validate_field(&path, sub_field, analysis)?;
            }
        }
        Ok(())
    }
}

fn validate_field(
    path: &str,
    field: &FieldMapping,
    analysis: &AnalysisSettings,
) -> Result<(), IndexError> {
    if path.starts_with('_') {
        return Err(IndexError::InvalidMapping(format!(
            "{}: field names starting with '_' are reserved",
            path
        )));
    }
    match (&field.field_type, &field.analyzer) {
        (FieldType::Keyword, Some(_)) => Err(IndexError::InvalidMapping(format!(
            "{}: keyword fields do not take an analyzer",
            path
        ))),
        (FieldType::Text, Some(analyzer)) if !analysis.analyzer.contains_key(analyzer) => {
            Err(IndexError::InvalidMapping(format!(
                "{}: unknown analyzer {}",
                path, analyzer
            )))
        }
        _ => Ok(()),
    }
}

/// Settings for the book index: bigram and unigram analyzers, each
/// folding character width and lowercasing.
pub fn book_index_settings() -> IndexSettings {
    let mut analysis = AnalysisSettings::default();
    analysis.tokenizer.insert(
        "bigram_tokenizer".to_string(),
        TokenizerSettings::Ngram {
            min_gram: 2,
            max_gram: 2,
        },
    );
    analysis.tokenizer.insert(
        "unigram_tokenizer".to_string(),
        TokenizerSettings::Ngram {
            min_gram: 1,
            max_gram: 1,
        },
    );
    analysis.analyzer.insert(
        BIGRAM_ANALYZER.to_string(),
        AnalyzerSettings {
            tokenizer: "bigram_tokenizer".to_string(),
            filter: vec![TokenFilterKind::CjkWidth, TokenFilterKind::Lowercase],
        },
    );
    analysis.analyzer.insert(
        UNIGRAM_ANALYZER.to_string(),
        AnalyzerSettings {
            tokenizer: "unigram_tokenizer".to_string(),
            filter: vec![TokenFilterKind::CjkWidth, TokenFilterKind::Lowercase],
        },
    );
    IndexSettings { analysis }
}

/// Mapping for the book index.
///
/// `title` is a keyword (sortable), `contents` is full text; both carry
/// `bigram` and `unigram` sub-fields.
pub fn book_mapping() -> IndexMapping {
    let ngram_fields = |field: FieldMapping| {
        field
            .with_field(BIGRAM_SUBFIELD, FieldMapping::analyzed_text(BIGRAM_ANALYZER))
            .with_field(UNIGRAM_SUBFIELD, FieldMapping::analyzed_text(UNIGRAM_ANALYZER))
    };

    let mut properties = BTreeMap::new();
    properties.insert("title".to_string(), ngram_fields(FieldMapping::keyword()));
    properties.insert("contents".to_string(), ngram_fields(FieldMapping::text()));
    IndexMapping { properties }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_settings_are_valid() {
        let settings = book_index_settings();
        settings.analysis.validate().unwrap();
        book_mapping().validate(&settings.analysis).unwrap();
    }

    #[test]
    fn test_settings_json_shape() {
        let json = serde_json::to_value(book_index_settings()).unwrap();
        assert_eq!(
            json["analysis"]["tokenizer"]["bigram_tokenizer"]["type"],
            "ngram"
        );
        assert_eq!(
            json["analysis"]["tokenizer"]["bigram_tokenizer"]["min_gram"],
            2
        );
        assert_eq!(
            json["analysis"]["analyzer"]["unigram_analyzer"]["filter"],
            serde_json::json!(["cjk_width", "lowercase"])
        );
    }

    #[test]
    fn test_settings_accept_legacy_ngram_name() {
        let json = r#"{"analysis":{"tokenizer":{"t":{"type":"nGram","min_gram":3,"max_gram":3}}}}"#;
        let settings: IndexSettings = serde_json::from_str(json).unwrap();
        assert_eq!(
            settings.analysis.tokenizer["t"],
            TokenizerSettings::Ngram {
                min_gram: 3,
                max_gram: 3
            }
        );
    }

    #[test]
    fn test_mapping_json_shape() {
        let json = serde_json::to_value(book_mapping()).unwrap();
        assert_eq!(json["properties"]["title"]["type"], "keyword");
        assert_eq!(json["properties"]["contents"]["type"], "text");
        assert_eq!(
            json["properties"]["title"]["fields"]["bigram"]["analyzer"],
            BIGRAM_ANALYZER
        );
    }

    #[test]
    fn test_unequal_ngram_rejected() {
        let mut settings = book_index_settings();
        settings.analysis.tokenizer.insert(
            "wide".to_string(),
            TokenizerSettings::Ngram {
                min_gram: 1,
                max_gram: 3,
            },
        );
        assert!(matches!(
            settings.analysis.validate(),
            Err(IndexError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_analyzer_with_unknown_tokenizer_rejected() {
        let mut settings = book_index_settings();
        settings.analysis.analyzer.insert(
            "broken".to_string(),
            AnalyzerSettings {
                tokenizer: "missing".to_string(),
                filter: Vec::new(),
            },
        );
        assert!(settings.analysis.validate().is_err());
    }

    #[test]
    fn test_mapping_with_unknown_analyzer_rejected() {
        let mapping = IndexMapping::default();
        let mut properties = mapping.properties;
        properties.insert(
            "title".to_string(),
            FieldMapping::keyword().with_field("x", FieldMapping::analyzed_text("nope")),
        );
        let mapping = IndexMapping { properties };
        assert!(matches!(
            mapping.validate(&book_index_settings().analysis),
            Err(IndexError::InvalidMapping(_))
        ));
    }

    #[test]
    fn test_reserved_field_name_rejected() {
        let mut properties = BTreeMap::new();
        properties.insert("_id".to_string(), FieldMapping::keyword());
        let mapping = IndexMapping { properties };
        assert!(mapping.validate(&AnalysisSettings::default()).is_err());
    }
}
