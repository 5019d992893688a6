//! Tantivy schema derived from an index mapping.
//!
//! Every property becomes a stored field under its own name. Each
//! sub-field becomes an indexed-only field named `{property}.{sub}`
//! that receives a copy of the property's value at index time. The
//! document id lives in the reserved `_id` u64 field.

use std::collections::BTreeMap;

use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED,
    STRING, TEXT,
};

use crate::error::IndexError;
use crate::mapping::{FieldMapping, FieldType, IndexMapping};

/// Name of the document id field.
pub const ID_FIELD: &str = "_id";

/// A mapped field and what it may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedField {
    pub field: Field,
    pub field_type: FieldType,
    /// Stored top-level property (as opposed to a sub-field)
    pub stored: bool,
    /// Positions are indexed, so phrase queries work
    pub positions: bool,
}

/// Schema with field handles resolved by mapping path.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    schema: Schema,
    /// Document id (u64, INDEXED | STORED | FAST)
    pub id: Field,
    /// Mapping path -> field
    fields: BTreeMap<String, MappedField>,
    /// Property name -> paths of fields that receive its value
    targets: BTreeMap<String, Vec<String>>,
}

impl IndexSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Resolve a mapping path such as `title` or `title.bigram`.
    pub fn field(&self, path: &str) -> Option<&MappedField> {
        self.fields.get(path)
    }

    /// Top-level properties and the fields each one is copied into.
    pub fn targets(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.targets
            .iter()
            .map(|(name, paths)| (name.as_str(), paths.as_slice()))
    }

    /// Build the schema for `mapping`.
    pub fn from_mapping(mapping: &IndexMapping) -> Self {
        let mut builder = Schema::builder();
        let id = builder.add_u64_field(ID_FIELD, INDEXED | STORED | FAST);

        let mut fields = BTreeMap::new();
        let mut targets = BTreeMap::new();

        for (name, property) in &mapping.properties {
            let (options, positions) = property_options(property);
            let field = builder.add_text_field(name, options);
            fields.insert(
                name.clone(),
                MappedField {
                    field,
                    field_type: property.field_type,
                    stored: true,
                    positions,
                },
            );

            let mut paths = vec![name.clone()];
            for (sub_name, sub_field) in &property.fields {
                let path = format!("{}.{}", name, sub_name);
                let (options, positions) = subfield_options(sub_field);
                let field = builder.add_text_field(&path, options);
                fields.insert(
                    path.clone(),
                    MappedField {
                        field,
                        field_type: sub_field.field_type,
                        stored: false,
                        positions,
                    },
                );
                paths.push(path);
            }
            targets.insert(name.clone(), paths);
        }

        Self {
            schema: builder.build(),
            id,
            fields,
            targets,
        }
    }

    /// Re-resolve handles against a schema read from disk.
    ///
    /// Fails when the on-disk schema lacks a field the mapping defines.
    pub fn from_existing(schema: Schema, mapping: &IndexMapping) -> Result<Self, IndexError> {
        let expected = Self::from_mapping(mapping);
        let id = schema
            .get_field(ID_FIELD)
            .map_err(|_| IndexError::SchemaMismatch(format!("missing {} field", ID_FIELD)))?;

        let mut fields = BTreeMap::new();
        for (path, mapped) in expected.fields {
            let field = schema
                .get_field(&path)
                .map_err(|_| IndexError::SchemaMismatch(format!("missing {} field", path)))?;
            fields.insert(path, MappedField { field, ..mapped });
        }

        Ok(Self {
            schema,
            id,
            fields,
            targets: expected.targets,
        })
    }
}

fn property_options(property: &FieldMapping) -> (TextOptions, bool) {
    match (property.field_type, &property.analyzer) {
        // Fast, so pages can be sorted without loading stored documents
        (FieldType::Keyword, _) => (STRING | STORED | FAST, false),
        (FieldType::Text, None) => (TEXT | STORED, true),
        (FieldType::Text, Some(analyzer)) => (analyzed(analyzer).set_stored(), true),
    }
}

fn subfield_options(sub_field: &FieldMapping) -> (TextOptions, bool) {
    match (sub_field.field_type, &sub_field.analyzer) {
        (FieldType::Keyword, _) => (STRING.into(), false),
        (FieldType::Text, None) => (TEXT.into(), true),
        (FieldType::Text, Some(analyzer)) => (analyzed(analyzer), true),
    }
}

fn analyzed(analyzer: &str) -> TextOptions {
    TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer(analyzer)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    )
}
