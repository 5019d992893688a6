//! Conversion between document sources and Tantivy documents.

use serde_json::Value;
use tantivy::schema::Value as _;
use tantivy::TantivyDocument;

use bookshelf_types::{Book, BookId};

use crate::error::IndexError;
use crate::schema::IndexSchema;

/// Document identity; books use their record id.
pub type DocumentId = BookId;

/// A document body: property name to value.
pub type Source = serde_json::Map<String, Value>;

/// Build the Tantivy document for `source`.
///
/// Every property value must be a string (or null, which indexes
/// nothing) and every property must be mapped. The value is copied into
/// each of the property's sub-fields.
pub fn to_tantivy_doc(
    schema: &IndexSchema,
    id: DocumentId,
    source: &Source,
) -> Result<TantivyDocument, IndexError> {
    for name in source.keys() {
        if schema.targets().all(|(property, _)| property != name) {
            return Err(IndexError::InvalidDocument(format!(
                "field {} is not mapped",
                name
            )));
        }
    }

    let mut doc = TantivyDocument::default();
    doc.add_u64(schema.id, id);

    for (property, paths) in schema.targets() {
        let text = match source.get(property) {
            None | Some(Value::Null) => continue,
            Some(Value::String(text)) => text,
            Some(other) => {
                return Err(IndexError::InvalidDocument(format!(
                    "field {} must be a string, got {}",
                    property, other
                )))
            }
        };
        for path in paths {
            if let Some(mapped) = schema.field(path) {
                doc.add_text(mapped.field, text);
            }
        }
    }
    Ok(doc)
}

/// Read the id and stored properties back out of a Tantivy document.
pub fn from_tantivy_doc(
    schema: &IndexSchema,
    doc: &TantivyDocument,
) -> Result<(DocumentId, Source), IndexError> {
    let id = doc
        .get_first(schema.id)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| IndexError::SchemaMismatch("stored document without _id".to_string()))?;

    let mut source = Source::new();
    for (property, _) in schema.targets() {
        let Some(mapped) = schema.field(property) else {
            continue;
        };
        if let Some(text) = doc.get_first(mapped.field).and_then(|v| v.as_str()) {
            source.insert(property.to_string(), Value::String(text.to_string()));
        }
    }
    Ok((id, source))
}

/// Index body for a book: `{title, contents}`, addressed by the book id.
pub fn book_source(book: &Book) -> Source {
    let mut source = Source::new();
    source.insert("title".to_string(), Value::String(book.title.clone()));
    source.insert("contents".to_string(), Value::String(book.contents.clone()));
    source
}

/// Rebuild a book from an indexed source.
pub fn book_from_source(id: DocumentId, source: &Source) -> Book {
    let text = |name: &str| {
        source
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Book::new(id, text("title"), text("contents"))
}
