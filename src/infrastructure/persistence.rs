//! Persistence of the address collection.
//!
//! The whole collection lives in a single named slot as a JSON array. A
//! [`SlotBackend`] only knows how to read and overwrite that slot; the
//! [`RecordStore`] on top of it owns decoding, identifier assignment and the
//! create/update/delete rules.

use crate::domain::AddressRecord;
use log::{info, warn};
use serde::Deserialize;
use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access saved addresses: {0}")]
    Io(#[from] io::Error),
    #[error("saved addresses are unreadable: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("could not encode addresses: {0}")]
    Encode(serde_json::Error),
    #[error("no address at position {0}")]
    OutOfRange(usize),
    #[error("the address at position {0} changed since it was listed")]
    Changed(usize),
    #[error("no identifiers left for new addresses")]
    IdsExhausted,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Raw access to the persisted slot.
pub trait SlotBackend {
    /// Returns `None` when the slot has never been written.
    fn read(&self) -> StoreResult<Option<String>>;

    /// Replaces the slot contents in a single step.
    fn write(&self, contents: &str) -> StoreResult<()>;
}

/// A slot stored as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SlotBackend for FileSlot {
    fn read(&self) -> StoreResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, contents: &str) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        // Readers must never observe a half-written slot.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// An in-process slot, used as a fake in tests.
#[derive(Debug, Default)]
pub struct MemorySlot {
    contents: RefCell<Option<String>>,
    writes: Cell<usize>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: RefCell::new(Some(contents.into())),
            writes: Cell::new(0),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }

    /// Number of writes performed so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl SlotBackend for MemorySlot {
    fn read(&self) -> StoreResult<Option<String>> {
        Ok(self.contents.borrow().clone())
    }

    fn write(&self, contents: &str) -> StoreResult<()> {
        *self.contents.borrow_mut() = Some(contents.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Slot contents as they may appear on disk: normally an array, but a bare
/// object is accepted as a one-element collection.
#[derive(Deserialize)]
#[serde(untagged)]
enum SlotContents {
    Many(Vec<AddressRecord>),
    One(AddressRecord),
}

/// Result of a tolerant read: whatever could be loaded, plus the reason
/// nothing could when the slot was unreadable.
#[derive(Debug)]
pub struct Listing {
    pub records: Vec<AddressRecord>,
    pub problem: Option<StoreError>,
}

/// Identifier for a new record: one past the largest one in use.
pub fn next_id(records: &[AddressRecord]) -> StoreResult<u64> {
    records
        .iter()
        .map(|record| record.id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(StoreError::IdsExhausted)
}

pub struct RecordStore<B: SlotBackend> {
    backend: B,
}

impl<B: SlotBackend> RecordStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reads the collection, failing on unreadable content.
    pub fn load(&self) -> StoreResult<Vec<AddressRecord>> {
        let Some(raw) = self.backend.read()? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<SlotContents>(&raw)? {
            SlotContents::Many(records) => Ok(records),
            SlotContents::One(record) => Ok(vec![record]),
        }
    }

    /// Reads the collection, degrading to an empty one on any failure.
    pub fn list(&self) -> Listing {
        match self.load() {
            Ok(records) => Listing {
                records,
                problem: None,
            },
            Err(e) => {
                warn!("could not load saved addresses: {e}");
                Listing {
                    records: Vec::new(),
                    problem: Some(e),
                }
            }
        }
    }

    pub fn save(&self, all: &[AddressRecord]) -> StoreResult<()> {
        let json = serde_json::to_string(all).map_err(StoreError::Encode)?;
        self.backend.write(&json)
    }

    pub fn find(&self, id: u64) -> StoreResult<Option<AddressRecord>> {
        Ok(self.load()?.into_iter().find(|record| record.id == id))
    }

    /// Replaces the record with `existing_id` in place, or appends `record`
    /// under a fresh identifier when there is no such record.
    ///
    /// The identifier carried by `record` itself is ignored, and id 0 never
    /// names an existing record.
    pub fn upsert(&self, record: AddressRecord, existing_id: Option<u64>) -> StoreResult<AddressRecord> {
        let mut records = self.load()?;
        let position = existing_id
            .filter(|id| *id != 0)
            .and_then(|id| records.iter().position(|stored| stored.id == id));

        let saved = match position {
            Some(index) => {
                let saved = AddressRecord {
                    id: records[index].id,
                    ..record
                };
                records[index] = saved.clone();
                info!("updated address {} at position {index}", saved.id);
                saved
            }
            None => {
                let saved = AddressRecord {
                    id: next_id(&records)?,
                    ..record
                };
                records.push(saved.clone());
                info!("created address {}", saved.id);
                saved
            }
        };

        self.save(&records)?;
        Ok(saved)
    }

    /// Removes the record at `index` of the stored collection and returns
    /// what is left.
    ///
    /// Nothing is removed unless the stored record at `index` still equals
    /// `expected`.
    pub fn delete_at(&self, index: usize, expected: &AddressRecord) -> StoreResult<Vec<AddressRecord>> {
        let mut records = self.load()?;
        match records.get(index) {
            None => return Err(StoreError::OutOfRange(index)),
            Some(stored) if stored != expected => {
                warn!("address at position {index} is no longer {}", expected.id);
                return Err(StoreError::Changed(index));
            }
            Some(_) => {}
        }
        let removed = records.remove(index);
        self.save(&records)?;
        info!("deleted address {} from position {index}", removed.id);
        Ok(records)
    }
}
