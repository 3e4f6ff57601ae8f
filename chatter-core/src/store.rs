use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::ChatterError;

/// Write policy for a [`FileStore`].
///
/// # Variants
/// - `Buffered`: mutations stay in memory until an explicit `flush`
///   (or `close`). The right mode for bulk learning.
/// - `WriteThrough`: every mutation is persisted immediately. Slower,
///   but the file on disk never lags the in-memory state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
	Buffered,
	WriteThrough,
}

/// Persistent string-keyed map with opaque serialized values.
///
/// The consumer must treat values as lazily materialized: read the full
/// value, mutate a local copy, and write it back through `set`. In-place
/// mutation of a returned value is never visible to the store.
///
/// `close` consumes the store; further use is a type error rather than
/// a runtime one.
pub trait Store {
	/// Returns the value for `key`, or `None` if absent.
	fn get(&self, key: &str) -> Option<Vec<u8>>;

	/// Inserts or replaces the value for `key`.
	fn set(&mut self, key: &str, value: Vec<u8>) -> Result<(), ChatterError>;

	/// Removes `key`. Absent keys are a no-op.
	fn delete(&mut self, key: &str) -> Result<(), ChatterError>;

	/// All known keys. Order is implementation-defined.
	fn keys(&self) -> Vec<String>;

	/// Persists any buffered state.
	fn flush(&mut self) -> Result<(), ChatterError>;

	/// Flushes and releases the store.
	fn close(self: Box<Self>) -> Result<(), ChatterError>;
}

/// On-disk layout of a [`FileStore`]: the whole map, postcard-encoded.
#[derive(Serialize, Deserialize, Default)]
struct FileStoreData {
	entries: BTreeMap<String, Vec<u8>>,
}

/// File-backed [`Store`].
///
/// The entire map lives in memory and is serialized to a single file
/// with postcard. Writes go through a temp file in the same directory
/// and are committed by rename, so a crash mid-flush leaves the
/// previous file intact.
///
/// Concurrent access to one file from several handles (or processes)
/// is undefined behavior; the store takes no lock.
pub struct FileStore {
	path: PathBuf,
	data: FileStoreData,
	mode: WriteMode,
}

impl FileStore {
	/// Opens the store file at `path`, creating an empty store if the
	/// file does not exist yet (the file itself is only written on the
	/// first flush).
	pub fn open<P: AsRef<Path>>(path: P, mode: WriteMode) -> Result<Self, ChatterError> {
		let path = path.as_ref().to_path_buf();
		let data = if path.exists() {
			let bytes = fs::read(&path)?;
			postcard::from_bytes(&bytes)?
		} else {
			FileStoreData::default()
		};
		Ok(Self { path, data, mode })
	}

	/// Serializes the map and commits it atomically (write to a temp
	/// file in the target directory, then rename over the old file).
	fn write_out(&self) -> Result<(), ChatterError> {
		let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
		let bytes = postcard::to_stdvec(&self.data)?;
		let tmp = NamedTempFile::new_in(parent)?;
		fs::write(tmp.path(), &bytes)?;
		tmp.persist(&self.path).map_err(|e| ChatterError::Io(e.error))?;
		Ok(())
	}

	fn after_mutation(&mut self) -> Result<(), ChatterError> {
		match self.mode {
			WriteMode::Buffered => Ok(()),
			WriteMode::WriteThrough => self.write_out(),
		}
	}
}

impl Store for FileStore {
	fn get(&self, key: &str) -> Option<Vec<u8>> {
		self.data.entries.get(key).cloned()
	}

	fn set(&mut self, key: &str, value: Vec<u8>) -> Result<(), ChatterError> {
		self.data.entries.insert(key.to_owned(), value);
		self.after_mutation()
	}

	fn delete(&mut self, key: &str) -> Result<(), ChatterError> {
		self.data.entries.remove(key);
		self.after_mutation()
	}

	fn keys(&self) -> Vec<String> {
		self.data.entries.keys().cloned().collect()
	}

	fn flush(&mut self) -> Result<(), ChatterError> {
		self.write_out()
	}

	fn close(mut self: Box<Self>) -> Result<(), ChatterError> {
		self.flush()
	}
}

/// In-memory [`Store`] with no persistence.
///
/// Used by tests and for throwaway models; `flush` is a no-op.
#[derive(Default)]
pub struct MemoryStore {
	entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Store for MemoryStore {
	fn get(&self, key: &str) -> Option<Vec<u8>> {
		self.entries.get(key).cloned()
	}

	fn set(&mut self, key: &str, value: Vec<u8>) -> Result<(), ChatterError> {
		self.entries.insert(key.to_owned(), value);
		Ok(())
	}

	fn delete(&mut self, key: &str) -> Result<(), ChatterError> {
		self.entries.remove(key);
		Ok(())
	}

	fn keys(&self) -> Vec<String> {
		self.entries.keys().cloned().collect()
	}

	fn flush(&mut self) -> Result<(), ChatterError> {
		Ok(())
	}

	fn close(self: Box<Self>) -> Result<(), ChatterError> {
		Ok(())
	}
}
