use std::sync::{Arc, Mutex, PoisonError};

use manos_board_core::{Board, Container, JsonFilePersistence, PersistError, QueuedScheduler};
use serde::Serialize;

type Encode<T> = fn(&[Container<T>]) -> Result<Vec<u8>, PersistError>;

/// Writes a board to a JSON file. Encoding happens on the caller's thread; the write itself
/// is a [`WriteJob`] that can run on a background executor.
pub(crate) struct BoardWriter<T> {
    encode: Encode<T>,
    job: WriteJob,
}

impl<T: Serialize> BoardWriter<T> {
    pub(crate) fn new(storage: JsonFilePersistence) -> Self {
        Self {
            encode: JsonFilePersistence::encode::<T>,
            job: WriteJob {
                storage,
                written: Arc::new(Mutex::new(None)),
            },
        }
    }
}

impl<T> BoardWriter<T> {
    pub(crate) fn encode(&self, containers: &[Container<T>]) -> Result<Vec<u8>, PersistError> {
        (self.encode)(containers)
    }

    pub(crate) fn job(&self) -> WriteJob {
        self.job.clone()
    }
}

/// Shared by every write of one board, so a slow write of an older revision never lands on
/// top of a newer one.
#[derive(Clone)]
pub(crate) struct WriteJob {
    storage: JsonFilePersistence,
    written: Arc<Mutex<Option<u64>>>,
}

impl WriteJob {
    pub(crate) fn write(&self, revision: u64, bytes: &[u8]) -> Result<(), PersistError> {
        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        if written.is_some_and(|written| revision < written) {
            tracing::debug!(revision, "skipping write of an outdated board");
            return Ok(());
        }
        self.storage.write_bytes(bytes)?;
        *written = Some(revision);
        Ok(())
    }
}

/// Flush on the calling thread, through `writer` when there is one.
pub(crate) fn flush_blocking<T: 'static>(
    board: &mut Board<T, QueuedScheduler>,
    writer: Option<&BoardWriter<T>>,
) -> Result<(), PersistError> {
    let Some(writer) = writer else {
        return board.save_now();
    };

    let encoded = writer.encode(board.containers());
    let ticket = board.begin_flush();
    let result = encoded.and_then(|bytes| writer.job().write(ticket.revision(), &bytes));
    board.finish_flush(ticket, result)
}
