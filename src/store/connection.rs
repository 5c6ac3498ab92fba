/*!
 * Device database connection management.
 *
 * The annotation store is opened strictly read-only and for a bounded scope:
 * the connection lives for one read pass and is released when the reader is
 * dropped. Callers must hold exclusive logical access to the device path for
 * that duration (the device-presence poller must not probe the same file
 * while a read pass is in progress).
 */

use log::{debug, info};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ExportError;

/// Directory next to the database holding markup image files
const MARKUPS_DIRNAME: &str = "markups";

/// How long to wait on a busy database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Read-only connection to the device annotation store.
pub struct StoreConnection {
    /// Path to the database file
    db_path: PathBuf,
    /// The underlying connection
    connection: Connection,
}

impl StoreConnection {
    /// Open the store at the given path, read-only.
    ///
    /// A missing, locked or otherwise unreadable database maps to
    /// [`ExportError::IoUnavailable`]; the caller may retry once the device
    /// is free again.
    pub fn open_read_only<P: AsRef<Path>>(db_path: P) -> Result<Self, ExportError> {
        let db_path = db_path.as_ref().to_path_buf();

        if !db_path.is_file() {
            return Err(ExportError::IoUnavailable(format!(
                "no annotation store at {}",
                db_path.display()
            )));
        }

        info!("Opening annotation store at: {:?}", db_path);

        let connection = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| ExportError::IoUnavailable(format!("{}: {}", db_path.display(), e)))?;

        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| ExportError::IoUnavailable(e.to_string()))?;

        let store = Self {
            db_path,
            connection,
        };
        store.probe()?;

        Ok(store)
    }

    /// Verify the store is actually readable and looks like a device
    /// database. A lock held by the device firmware typically surfaces on
    /// the first query rather than on open.
    fn probe(&self) -> Result<(), ExportError> {
        let bookmark_table: String = self
            .connection
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'Bookmark'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => ExportError::IoUnavailable(format!(
                    "{} has no Bookmark table",
                    self.db_path.display()
                )),
                other => ExportError::IoUnavailable(format!(
                    "{}: {}",
                    self.db_path.display(),
                    other
                )),
            })?;

        debug!("Store probe found table: {:?}", bookmark_table);
        Ok(())
    }

    /// The database file path.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Directory holding the markup image files for this store.
    pub fn markups_dir(&self) -> PathBuf {
        self.db_path
            .parent()
            .map(|p| p.join(MARKUPS_DIRNAME))
            .unwrap_or_else(|| PathBuf::from(MARKUPS_DIRNAME))
    }

    /// Access the raw connection for queries.
    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }
}
