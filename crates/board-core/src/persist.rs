use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::Container;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to write board: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode board: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no persistence collaborator configured")]
    NoCollaborator,
    #[error("{0}")]
    Other(String),
}

impl PersistError {
    pub fn other(message: impl Into<String>) -> Self {
        PersistError::Other(message.into())
    }
}

/// Receives the full structure on every flush.
pub trait Persistence<T> {
    fn flush(&mut self, containers: &[Container<T>]) -> Result<(), PersistError>;
}

impl<T, F> Persistence<T> for F
where
    F: FnMut(&[Container<T>]) -> Result<(), PersistError>,
{
    fn flush(&mut self, containers: &[Container<T>]) -> Result<(), PersistError> {
        self(containers)
    }
}

/// Writes the container list as a pretty-printed JSON array.
///
/// Writes go to a sibling `.tmp` file first and are renamed into place.
#[derive(Clone, Debug)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a previously flushed board. Returns `Ok(None)` when nothing has been saved yet.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<Vec<Container<T>>>, PersistError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Encode containers the way [`Persistence::flush`] writes them.
    pub fn encode<T: Serialize>(containers: &[Container<T>]) -> Result<Vec<u8>, PersistError> {
        Ok(serde_json::to_vec_pretty(containers)?)
    }

    /// Atomically replace the file with already encoded bytes. Safe to call off the UI
    /// thread; a failed write leaves no temp file behind.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.tmp_path();
        if let Err(err) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl<T: Serialize> Persistence<T> for JsonFilePersistence {
    fn flush(&mut self, containers: &[Container<T>]) -> Result<(), PersistError> {
        let bytes = Self::encode(containers)?;
        self.write_bytes(&bytes)
    }
}
