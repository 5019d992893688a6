//! Key encoding and decoding for the storage layer.
//!
//! - Book rows: `{id:u64 big-endian}` so byte order equals id order
//! - Title index: `{escaped title}\0\0{id:u64 big-endian}` so byte order is
//!   (title ascending, id ascending) under binary collation. NUL bytes in
//!   the title are written as `\0\xff`, which keeps titles containing NUL
//!   in plain byte order.

use bookshelf_types::BookId;

use crate::error::StorageError;

const ID_LEN: usize = 8;

const TITLE_TERMINATOR: [u8; 2] = [0x00, 0x00];
const ESCAPED_NUL: [u8; 2] = [0x00, 0xff];

/// Key for a book row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BookKey {
    pub id: BookId,
}

impl BookKey {
    pub fn new(id: BookId) -> Self {
        Self { id }
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> [u8; ID_LEN] {
        self.id.to_be_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let raw: [u8; ID_LEN] = bytes
            .try_into()
            .map_err(|_| StorageError::Key(format!("Invalid book key length: {}", bytes.len())))?;
        Ok(Self {
            id: BookId::from_be_bytes(raw),
        })
    }
}

/// Key for the title ordering index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleKey {
    pub title: String,
    pub id: BookId,
}

impl TitleKey {
    pub fn new(title: impl Into<String>, id: BookId) -> Self {
        Self {
            title: title.into(),
            id,
        }
    }

    /// Encode key to bytes
    /// Format: "{escaped title}\0\0{id be}"
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.title.len() + TITLE_TERMINATOR.len() + ID_LEN);
        for &b in self.title.as_bytes() {
            if b == 0 {
                bytes.extend_from_slice(&ESCAPED_NUL);
            } else {
                bytes.push(b);
            }
        }
        bytes.extend_from_slice(&TITLE_TERMINATOR);
        bytes.extend_from_slice(&self.id.to_be_bytes());
        bytes
    }

    /// Decode only the id suffix, which is all a scan needs.
    pub fn id_from_bytes(bytes: &[u8]) -> Result<BookId, StorageError> {
        if bytes.len() < TITLE_TERMINATOR.len() + ID_LEN {
            return Err(StorageError::Key(format!(
                "Invalid title key length: {}",
                bytes.len()
            )));
        }
        let split = bytes.len() - ID_LEN;
        if bytes[split - TITLE_TERMINATOR.len()..split] != TITLE_TERMINATOR {
            return Err(StorageError::Key("Missing title key separator".to_string()));
        }
        Ok(BookKey::from_bytes(&bytes[split..])?.id)
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let id = Self::id_from_bytes(bytes)?;
        let escaped = &bytes[..bytes.len() - ID_LEN - TITLE_TERMINATOR.len()];

        let mut raw = Vec::with_capacity(escaped.len());
        let mut iter = escaped.iter();
        while let Some(&b) = iter.next() {
            if b == 0 && iter.next() != Some(&ESCAPED_NUL[1]) {
                return Err(StorageError::Key("Unescaped NUL in title key".to_string()));
            }
            raw.push(b);
        }

        let title = String::from_utf8(raw)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        Ok(Self::new(title, id))
    }
}
