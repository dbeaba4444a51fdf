pub mod accounts;
pub mod catalog;
pub mod library;
pub mod models;
pub mod schema;

pub use accounts::{AccountStore, ProfileUpdate, UserCreation};
pub use catalog::{CatalogStore, CatalogWrite, GenreDeletion};
pub use library::{BatchAddOutcome, PlaylistAddOutcome, ReorderOutcome, UserLibraryStore};
pub use models::*;

use anyhow::Result;
use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

use schema::LIBRARY_SCHEMA;

/// Single SQLite-backed store for the whole library: catalog, accounts and
/// per-user rows live in one schema so cascading deletes can cross the
/// catalog/user boundary in one transaction.
///
/// The connection handle is shared and injected into the server state;
/// nothing reaches it except through the store traits.
pub struct SqliteLibraryStore {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl SqliteLibraryStore {
    /// Opens (or creates) the database at `path`. A fresh file gets the full
    /// schema; an existing one is validated against it and rejected on
    /// mismatch.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// In-memory store, used by tests.
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get(0),
        )?;
        if table_count == 0 {
            info!("Empty database, creating schema");
            LIBRARY_SCHEMA.create(&conn)?;
        } else {
            LIBRARY_SCHEMA.validate(&conn)?;
        }

        Ok(SqliteLibraryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

pub(crate) const TRACK_DETAILS_SELECT: &str = "SELECT t.id, t.title, t.duration, t.file_path, \
     al.id, al.title, ar.id, ar.name, g.id, g.name \
     FROM tracks t \
     JOIN albums al ON al.id = t.album_id \
     JOIN artists ar ON ar.id = t.artist_id \
     JOIN genres g ON g.id = t.genre_id";

pub(crate) fn parse_track_details(row: &Row) -> rusqlite::Result<TrackDetails> {
    Ok(TrackDetails {
        id: row.get(0)?,
        title: row.get(1)?,
        duration: row.get(2)?,
        file_path: row.get(3)?,
        album_id: row.get(4)?,
        album_title: row.get(5)?,
        artist_id: row.get(6)?,
        artist_name: row.get(7)?,
        genre_id: row.get(8)?,
        genre_name: row.get(9)?,
    })
}

pub(crate) fn parse_playlist(row: &Row) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        created: row.get(3)?,
    })
}
