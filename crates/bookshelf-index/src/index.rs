//! On-disk index layout and open Tantivy handles.
//!
//! Each named index lives in `{root}/{name}/`:
//! - `settings.json`: analysis settings from `create_index`
//! - `mapping.json`: field mapping from `put_mapping`
//! - `data/`: the Tantivy index, created together with the mapping

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tantivy::collector::Count;
use tantivy::query::TermQuery;
use tantivy::schema::IndexRecordOption;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, Term};
use tracing::{debug, info};

use crate::analysis::register_analyzers;
use crate::document::DocumentId;
use crate::error::IndexError;
use crate::mapping::{IndexMapping, IndexSettings};
use crate::schema::IndexSchema;

/// Default memory budget for IndexWriter (50MB)
const DEFAULT_WRITER_MEMORY_MB: usize = 50;

const SETTINGS_FILE: &str = "settings.json";
const MAPPING_FILE: &str = "mapping.json";
const DATA_DIR: &str = "data";

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct IndexGatewayConfig {
    /// Directory holding one subdirectory per index
    pub root_path: PathBuf,
    /// Memory budget for each index writer in MB
    pub writer_memory_mb: usize,
}

impl Default for IndexGatewayConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("./indexes"),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }
}

impl IndexGatewayConfig {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }
}

/// Check an index name before it is used as a directory name.
pub fn validate_index_name(name: &str) -> Result<(), IndexError> {
    let valid = !name.is_empty()
        && !name.starts_with(['_', '-'])
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(IndexError::InvalidIndexName(name.to_string()))
    }
}

/// Files of one named index.
#[derive(Debug, Clone)]
pub struct IndexDir {
    path: PathBuf,
}

impl IndexDir {
    pub fn new(root: &Path, name: &str) -> Self {
        Self {
            path: root.join(name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An index exists once its settings are written.
    pub fn exists(&self) -> bool {
        self.path.join(SETTINGS_FILE).exists()
    }

    pub fn write_settings(&self, settings: &IndexSettings) -> Result<(), IndexError> {
        fs::create_dir_all(&self.path)?;
        fs::write(
            self.path.join(SETTINGS_FILE),
            serde_json::to_vec_pretty(settings)?,
        )?;
        Ok(())
    }

    pub fn read_settings(&self) -> Result<IndexSettings, IndexError> {
        let bytes = fs::read(self.path.join(SETTINGS_FILE))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn write_mapping(&self, mapping: &IndexMapping) -> Result<(), IndexError> {
        fs::write(
            self.path.join(MAPPING_FILE),
            serde_json::to_vec_pretty(mapping)?,
        )?;
        Ok(())
    }

    /// The mapping, or `None` before `put_mapping`.
    pub fn read_mapping(&self) -> Result<Option<IndexMapping>, IndexError> {
        let path = self.path.join(MAPPING_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn data_path(&self) -> PathBuf {
        self.path.join(DATA_DIR)
    }

    pub fn remove(&self) -> Result<(), IndexError> {
        fs::remove_dir_all(&self.path)?;
        Ok(())
    }
}

/// A mapped index with its writer and reader.
///
/// The writer is shared behind a mutex; every write commits and reloads
/// the reader before returning, so searches see it immediately.
pub struct OpenIndex {
    index: Index,
    schema: IndexSchema,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
}

impl OpenIndex {
    /// Create the Tantivy index for a freshly mapped index.
    pub fn create(
        dir: &IndexDir,
        settings: &IndexSettings,
        mapping: &IndexMapping,
        writer_memory_mb: usize,
    ) -> Result<Self, IndexError> {
        let data_path = dir.data_path();
        fs::create_dir_all(&data_path)?;

        let schema = IndexSchema::from_mapping(mapping);
        let index = Index::create_in_dir(&data_path, schema.schema().clone())?;
        info!(path = ?data_path, "Created search index");

        Self::from_parts(index, schema, settings, writer_memory_mb)
    }

    /// Open the Tantivy index of an already mapped index.
    pub fn open(
        dir: &IndexDir,
        settings: &IndexSettings,
        mapping: &IndexMapping,
        writer_memory_mb: usize,
    ) -> Result<Self, IndexError> {
        let data_path = dir.data_path();
        let index = Index::open_in_dir(&data_path)?;
        let schema = IndexSchema::from_existing(index.schema(), mapping)?;
        debug!(path = ?data_path, "Opened search index");

        Self::from_parts(index, schema, settings, writer_memory_mb)
    }

    fn from_parts(
        index: Index,
        schema: IndexSchema,
        settings: &IndexSettings,
        writer_memory_mb: usize,
    ) -> Result<Self, IndexError> {
        register_analyzers(&index, &settings.analysis)?;

        let memory_budget = writer_memory_mb * 1024 * 1024;
        let writer = index.writer(memory_budget)?;
        debug!(memory_mb = writer_memory_mb, "Created index writer");

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            schema,
            writer: Mutex::new(writer),
            reader,
        })
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    pub fn searcher(&self) -> Searcher {
        self.reader.searcher()
    }

    pub fn lock_writer(&self) -> Result<MutexGuard<'_, IndexWriter>, IndexError> {
        self.writer
            .lock()
            .map_err(|e| IndexError::IndexLocked(e.to_string()))
    }

    pub fn id_term(&self, id: DocumentId) -> Term {
        Term::from_field_u64(self.schema.id, id)
    }

    /// Whether a committed document has this id.
    pub fn contains(&self, id: DocumentId) -> Result<bool, IndexError> {
        let query = TermQuery::new(self.id_term(id), IndexRecordOption::Basic);
        Ok(self.searcher().search(&query, &Count)? > 0)
    }

    /// Commit pending writes and make them visible to searches.
    pub fn commit(&self, writer: &mut IndexWriter) -> Result<u64, IndexError> {
        let opstamp = writer.commit()?;
        self.reader.reload()?;
        debug!(opstamp, "Committed index changes");
        Ok(opstamp)
    }
}
