//! Sorted, bounded paging over fast fields.
//!
//! A page is collected with a `TopDocs` heap of `from + size` entries keyed
//! on the sort fields' fast-field values, so no stored document is read
//! until the page is known. Keyword values compare bytewise; missing
//! values sort last in either direction; `_id` breaks every tie.

use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;
use std::sync::Arc;

use tantivy::collector::{Count, TopDocs};
use tantivy::columnar::{Column, StrColumn};
use tantivy::query::Query;
use tantivy::index::SegmentId;
use tantivy::{DocAddress, DocId, Searcher, SegmentReader};

use crate::error::IndexError;
use crate::query::{SortClause, SortOrder};
use crate::schema::ID_FIELD;

/// Total matches and the addresses of one page, in sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedPage {
    pub total: u64,
    pub addresses: Vec<DocAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SortValue {
    Id(u64),
    Keyword(Option<String>),
}

/// Position of one document under a list of sort clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SortKey {
    values: Vec<(SortValue, SortOrder)>,
    id: u64,
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        for ((a, order), (b, _)) in self.values.iter().zip(&other.values) {
            let ordering = match (a, b) {
                (SortValue::Id(x), SortValue::Id(y)) => directed(x.cmp(y), *order),
                (SortValue::Keyword(Some(x)), SortValue::Keyword(Some(y))) => {
                    directed(x.as_bytes().cmp(y.as_bytes()), *order)
                }
                (SortValue::Keyword(Some(_)), SortValue::Keyword(None)) => Ordering::Less,
                (SortValue::Keyword(None), SortValue::Keyword(Some(_))) => Ordering::Greater,
                _ => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.id.cmp(&other.id)
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

enum SortColumn {
    Id,
    Keyword(StrColumn),
}

/// Fast-field columns of one segment needed to build sort keys.
struct SegmentColumns {
    ids: Column<u64>,
    sort: Vec<(SortColumn, SortOrder)>,
}

impl SegmentColumns {
    fn open(reader: &SegmentReader, sort: &[SortClause]) -> Result<Self, IndexError> {
        let fast_fields = reader.fast_fields();
        let ids = fast_fields.u64(ID_FIELD)?;

        let mut columns = Vec::with_capacity(sort.len());
        for clause in sort {
            let column = if clause.field == ID_FIELD {
                SortColumn::Id
            } else {
                let column = fast_fields.str(&clause.field)?.ok_or_else(|| {
                    IndexError::SchemaMismatch(format!(
                        "{} is not a fast field; rebuild the index",
                        clause.field
                    ))
                })?;
                SortColumn::Keyword(column)
            };
            columns.push((column, clause.order));
        }

        Ok(Self { ids, sort: columns })
    }

    fn key(&self, doc: DocId) -> SortKey {
        let id = self.ids.first(doc).unwrap_or_default();
        let values = self
            .sort
            .iter()
            .map(|(column, order)| {
                let value = match column {
                    SortColumn::Id => SortValue::Id(id),
                    SortColumn::Keyword(column) => SortValue::Keyword(first_str(column, doc)),
                };
                (value, *order)
            })
            .collect();
        SortKey { values, id }
    }
}

fn first_str(column: &StrColumn, doc: DocId) -> Option<String> {
    let ord = column.term_ords(doc).next()?;
    let mut value = String::new();
    match column.ord_to_str(ord, &mut value) {
        Ok(true) => Some(value),
        _ => None,
    }
}

/// Count every match of `query` and collect the `[from, from + size)` slice
/// of them under `sort`.
pub fn sorted_page(
    searcher: &Searcher,
    query: &dyn Query,
    sort: &[SortClause],
    from: usize,
    size: usize,
) -> Result<SortedPage, IndexError> {
    if size == 0 {
        let total = searcher.search(query, &Count)? as u64;
        return Ok(SortedPage {
            total,
            addresses: Vec::new(),
        });
    }

    let mut columns: HashMap<SegmentId, Arc<SegmentColumns>> = HashMap::new();
    for reader in searcher.segment_readers() {
        columns.insert(
            reader.segment_id(),
            Arc::new(SegmentColumns::open(reader, sort)?),
        );
    }
    let columns = Arc::new(columns);

    // The heap keeps the largest scores, so keys are reversed to keep the
    // smallest.
    let top = TopDocs::with_limit(size)
        .and_offset(from)
        .custom_score(move |reader: &SegmentReader| {
            // Every segment of this searcher was opened above
            let segment = columns.get(&reader.segment_id()).cloned();
            move |doc: DocId| Reverse(segment.as_ref().map(|columns| columns.key(doc)))
        });

    let (total, top_docs) = searcher.search(query, &(Count, top))?;
    Ok(SortedPage {
        total: total as u64,
        addresses: top_docs.into_iter().map(|(_, address)| address).collect(),
    })
}
