//! Catalog reads and admin-side catalog writes.

use anyhow::Result;
use chrono::DateTime;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::*;
use super::schema::TrackRefTable;
use super::{parse_track_details, SqliteLibraryStore, TRACK_DETAILS_SELECT};

/// Outcome of a catalog write that can fail for reasons the caller must
/// distinguish from store faults.
#[derive(Debug)]
pub enum CatalogWrite<T> {
    Done(T),
    NotFound,
    /// Which uniqueness rule was violated.
    Duplicate(&'static str),
    /// Which referenced entity does not exist.
    MissingRelation(&'static str),
}

#[derive(Debug, PartialEq, Eq)]
pub enum GenreDeletion {
    Deleted,
    NotFound,
    /// Number of tracks and albums still referencing the genre.
    InUse(i64),
}

pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Browse (public, read-only)
    // =========================================================================

    fn list_artists(&self) -> Result<Vec<Artist>>;

    fn list_genres(&self) -> Result<Vec<Genre>>;

    fn list_albums(&self) -> Result<Vec<AlbumDetails>>;

    /// All tracks with album/artist/genre names denormalized for display.
    fn list_tracks(&self) -> Result<Vec<TrackDetails>>;

    /// Returns Ok(None) if no track with that id exists.
    fn get_track(&self, id: i64) -> Result<Option<Track>>;

    fn get_track_details(&self, id: i64) -> Result<Option<TrackDetails>>;

    // =========================================================================
    // Admin writes
    // =========================================================================

    fn create_artist(&self, new: &NewArtist) -> Result<CatalogWrite<Artist>>;

    fn update_artist(&self, id: i64, new: &NewArtist) -> Result<CatalogWrite<Artist>>;

    /// Cascades: dependent user rows for the artist's tracks, then tracks,
    /// then albums, then the artist. Returns false if the artist is unknown.
    fn delete_artist(&self, id: i64) -> Result<bool>;

    fn create_genre(&self, new: &NewGenre) -> Result<CatalogWrite<Genre>>;

    /// Genres still referenced by tracks are protected.
    fn delete_genre(&self, id: i64) -> Result<GenreDeletion>;

    /// Rejects a duplicate (title, artist) pair case-insensitively.
    fn create_album(&self, new: &NewAlbum) -> Result<CatalogWrite<Album>>;

    fn update_album(&self, id: i64, new: &NewAlbum) -> Result<CatalogWrite<Album>>;

    /// Cascade scoped to the album's tracks. Returns false if unknown.
    fn delete_album(&self, id: i64) -> Result<bool>;

    fn create_track(&self, new: &NewTrack) -> Result<CatalogWrite<Track>>;

    fn update_track(&self, id: i64, new: &NewTrack) -> Result<CatalogWrite<Track>>;

    /// Clears dependent user rows, then the track. Returns the deleted
    /// track's title, or Ok(None) if the id is unknown.
    fn delete_track(&self, id: i64) -> Result<Option<String>>;

    // =========================================================================
    // Admin dashboard
    // =========================================================================

    fn catalog_summary(&self) -> Result<CatalogSummary>;

    /// Latest created tracks/albums/artists/playlists, newest first,
    /// formatted for display.
    fn recent_catalog_activity(&self, limit: usize) -> Result<Vec<CatalogActivityItem>>;
}

fn artist_exists(conn: &Connection, id: i64) -> Result<bool> {
    exists(conn, "SELECT 1 FROM artists WHERE id = ?1", id)
}

fn genre_exists(conn: &Connection, id: i64) -> Result<bool> {
    exists(conn, "SELECT 1 FROM genres WHERE id = ?1", id)
}

fn album_exists(conn: &Connection, id: i64) -> Result<bool> {
    exists(conn, "SELECT 1 FROM albums WHERE id = ?1", id)
}

fn exists(conn: &Connection, sql: &str, id: i64) -> Result<bool> {
    Ok(conn
        .query_row(sql, params![id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn get_artist(conn: &Connection, id: i64) -> Result<Option<Artist>> {
    let artist = conn
        .query_row(
            "SELECT id, name, biography, created FROM artists WHERE id = ?1",
            params![id],
            |row| {
                Ok(Artist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    biography: row.get(2)?,
                    created: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(artist)
}

fn get_album(conn: &Connection, id: i64) -> Result<Option<Album>> {
    let album = conn
        .query_row(
            "SELECT id, artist_id, genre_id, title, release_year, created FROM albums WHERE id = ?1",
            params![id],
            |row| {
                Ok(Album {
                    id: row.get(0)?,
                    artist_id: row.get(1)?,
                    genre_id: row.get(2)?,
                    title: row.get(3)?,
                    release_year: row.get(4)?,
                    created: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(album)
}

fn get_track_row(conn: &Connection, id: i64) -> Result<Option<Track>> {
    let track = conn
        .query_row(
            "SELECT id, album_id, artist_id, genre_id, title, duration, file_path, created \
             FROM tracks WHERE id = ?1",
            params![id],
            |row| {
                Ok(Track {
                    id: row.get(0)?,
                    album_id: row.get(1)?,
                    artist_id: row.get(2)?,
                    genre_id: row.get(3)?,
                    title: row.get(4)?,
                    duration: row.get(5)?,
                    file_path: row.get(6)?,
                    created: row.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(track)
}

/// Deletes every user-facing row referencing tracks matched by `track_filter`
/// (a WHERE fragment over the tracks table with one `?1` parameter). Must run
/// inside the caller's transaction, before the tracks themselves go away.
fn clear_track_references(conn: &Connection, track_filter: &str, id: i64) -> Result<()> {
    for table in TrackRefTable::ALL {
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE track_id IN (SELECT id FROM tracks WHERE {})",
                table.table_name(),
                track_filter
            ),
            params![id],
        )?;
    }
    Ok(())
}

fn format_activity_timestamp(unix_secs: i64) -> String {
    match DateTime::from_timestamp(unix_secs, 0) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => unix_secs.to_string(),
    }
}

impl CatalogStore for SqliteLibraryStore {
    fn list_artists(&self) -> Result<Vec<Artist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, name, biography, created FROM artists ORDER BY id")?;
        let artists = stmt
            .query_map([], |row| {
                Ok(Artist {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    biography: row.get(2)?,
                    created: row.get(3)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(artists)
    }

    fn list_genres(&self) -> Result<Vec<Genre>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, name, description FROM genres ORDER BY id")?;
        let genres = stmt
            .query_map([], |row| {
                Ok(Genre {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(genres)
    }

    fn list_albums(&self) -> Result<Vec<AlbumDetails>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT al.id, al.title, al.release_year, ar.id, ar.name, g.id, g.name, al.created \
             FROM albums al \
             JOIN artists ar ON ar.id = al.artist_id \
             JOIN genres g ON g.id = al.genre_id \
             ORDER BY al.id",
        )?;
        let albums = stmt
            .query_map([], |row| {
                Ok(AlbumDetails {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    release_year: row.get(2)?,
                    artist_id: row.get(3)?,
                    artist_name: row.get(4)?,
                    genre_id: row.get(5)?,
                    genre_name: row.get(6)?,
                    created: row.get(7)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(albums)
    }

    fn list_tracks(&self) -> Result<Vec<TrackDetails>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!("{} ORDER BY t.id", TRACK_DETAILS_SELECT))?;
        let tracks = stmt
            .query_map([], parse_track_details)?
            .collect::<Result<_, _>>()?;
        Ok(tracks)
    }

    fn get_track(&self, id: i64) -> Result<Option<Track>> {
        let conn = self.conn.lock().unwrap();
        get_track_row(&conn, id)
    }

    fn get_track_details(&self, id: i64) -> Result<Option<TrackDetails>> {
        let conn = self.conn.lock().unwrap();
        let track = conn
            .query_row(
                &format!("{} WHERE t.id = ?1", TRACK_DETAILS_SELECT),
                params![id],
                parse_track_details,
            )
            .optional()?;
        Ok(track)
    }

    fn create_artist(&self, new: &NewArtist) -> Result<CatalogWrite<Artist>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let taken = tx
            .query_row(
                "SELECT 1 FROM artists WHERE name = ?1 COLLATE NOCASE",
                params![new.name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if taken {
            return Ok(CatalogWrite::Duplicate("artist name"));
        }

        tx.execute(
            "INSERT INTO artists (name, biography) VALUES (?1, ?2)",
            params![new.name, new.biography],
        )?;
        let id = tx.last_insert_rowid();
        let artist = get_artist(&tx, id)?;
        tx.commit()?;

        match artist {
            Some(artist) => Ok(CatalogWrite::Done(artist)),
            None => Ok(CatalogWrite::NotFound),
        }
    }

    fn update_artist(&self, id: i64, new: &NewArtist) -> Result<CatalogWrite<Artist>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let taken = tx
            .query_row(
                "SELECT 1 FROM artists WHERE name = ?1 COLLATE NOCASE AND id != ?2",
                params![new.name, id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if taken {
            return Ok(CatalogWrite::Duplicate("artist name"));
        }

        let changed = tx.execute(
            "UPDATE artists SET name = ?1, biography = ?2 WHERE id = ?3",
            params![new.name, new.biography, id],
        )?;
        if changed == 0 {
            return Ok(CatalogWrite::NotFound);
        }
        let artist = get_artist(&tx, id)?;
        tx.commit()?;

        match artist {
            Some(artist) => Ok(CatalogWrite::Done(artist)),
            None => Ok(CatalogWrite::NotFound),
        }
    }

    fn delete_artist(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if !artist_exists(&tx, id)? {
            return Ok(false);
        }

        // Dependency order: user rows, tracks, albums, artist.
        clear_track_references(
            &tx,
            "album_id IN (SELECT id FROM albums WHERE artist_id = ?1)",
            id,
        )?;
        tx.execute(
            "DELETE FROM tracks WHERE album_id IN (SELECT id FROM albums WHERE artist_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM albums WHERE artist_id = ?1", params![id])?;
        tx.execute("DELETE FROM artists WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(true)
    }

    fn create_genre(&self, new: &NewGenre) -> Result<CatalogWrite<Genre>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let taken = tx
            .query_row(
                "SELECT 1 FROM genres WHERE name = ?1 COLLATE NOCASE",
                params![new.name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if taken {
            return Ok(CatalogWrite::Duplicate("genre name"));
        }

        tx.execute(
            "INSERT INTO genres (name, description) VALUES (?1, ?2)",
            params![new.name, new.description],
        )?;
        let id = tx.last_insert_rowid();
        let genre = Genre {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
        };
        tx.commit()?;
        Ok(CatalogWrite::Done(genre))
    }

    fn delete_genre(&self, id: i64) -> Result<GenreDeletion> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if !genre_exists(&tx, id)? {
            return Ok(GenreDeletion::NotFound);
        }
        let references: i64 = tx.query_row(
            "SELECT (SELECT COUNT(*) FROM tracks WHERE genre_id = ?1) \
                 + (SELECT COUNT(*) FROM albums WHERE genre_id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        if references > 0 {
            return Ok(GenreDeletion::InUse(references));
        }

        tx.execute("DELETE FROM genres WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(GenreDeletion::Deleted)
    }

    fn create_album(&self, new: &NewAlbum) -> Result<CatalogWrite<Album>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if !artist_exists(&tx, new.artist_id)? {
            return Ok(CatalogWrite::MissingRelation("artist"));
        }
        if !genre_exists(&tx, new.genre_id)? {
            return Ok(CatalogWrite::MissingRelation("genre"));
        }
        let duplicate = tx
            .query_row(
                "SELECT 1 FROM albums WHERE artist_id = ?1 AND title = ?2 COLLATE NOCASE",
                params![new.artist_id, new.title],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if duplicate {
            return Ok(CatalogWrite::Duplicate("album title"));
        }

        tx.execute(
            "INSERT INTO albums (artist_id, genre_id, title, release_year) VALUES (?1, ?2, ?3, ?4)",
            params![new.artist_id, new.genre_id, new.title, new.release_year],
        )?;
        let id = tx.last_insert_rowid();
        let album = get_album(&tx, id)?;
        tx.commit()?;

        match album {
            Some(album) => Ok(CatalogWrite::Done(album)),
            None => Ok(CatalogWrite::NotFound),
        }
    }

    fn update_album(&self, id: i64, new: &NewAlbum) -> Result<CatalogWrite<Album>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if !artist_exists(&tx, new.artist_id)? {
            return Ok(CatalogWrite::MissingRelation("artist"));
        }
        if !genre_exists(&tx, new.genre_id)? {
            return Ok(CatalogWrite::MissingRelation("genre"));
        }
        let duplicate = tx
            .query_row(
                "SELECT 1 FROM albums WHERE artist_id = ?1 AND title = ?2 COLLATE NOCASE AND id != ?3",
                params![new.artist_id, new.title, id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if duplicate {
            return Ok(CatalogWrite::Duplicate("album title"));
        }

        let changed = tx.execute(
            "UPDATE albums SET artist_id = ?1, genre_id = ?2, title = ?3, release_year = ?4 \
             WHERE id = ?5",
            params![new.artist_id, new.genre_id, new.title, new.release_year, id],
        )?;
        if changed == 0 {
            return Ok(CatalogWrite::NotFound);
        }
        let album = get_album(&tx, id)?;
        tx.commit()?;

        match album {
            Some(album) => Ok(CatalogWrite::Done(album)),
            None => Ok(CatalogWrite::NotFound),
        }
    }

    fn delete_album(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if !album_exists(&tx, id)? {
            return Ok(false);
        }

        clear_track_references(&tx, "album_id = ?1", id)?;
        tx.execute("DELETE FROM tracks WHERE album_id = ?1", params![id])?;
        tx.execute("DELETE FROM albums WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(true)
    }

    fn create_track(&self, new: &NewTrack) -> Result<CatalogWrite<Track>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if !album_exists(&tx, new.album_id)? {
            return Ok(CatalogWrite::MissingRelation("album"));
        }
        if !artist_exists(&tx, new.artist_id)? {
            return Ok(CatalogWrite::MissingRelation("artist"));
        }
        if !genre_exists(&tx, new.genre_id)? {
            return Ok(CatalogWrite::MissingRelation("genre"));
        }

        tx.execute(
            "INSERT INTO tracks (album_id, artist_id, genre_id, title, duration, file_path) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.album_id,
                new.artist_id,
                new.genre_id,
                new.title,
                new.duration,
                new.file_path
            ],
        )?;
        let id = tx.last_insert_rowid();
        let track = get_track_row(&tx, id)?;
        tx.commit()?;

        match track {
            Some(track) => Ok(CatalogWrite::Done(track)),
            None => Ok(CatalogWrite::NotFound),
        }
    }

    fn update_track(&self, id: i64, new: &NewTrack) -> Result<CatalogWrite<Track>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        if !album_exists(&tx, new.album_id)? {
            return Ok(CatalogWrite::MissingRelation("album"));
        }
        if !artist_exists(&tx, new.artist_id)? {
            return Ok(CatalogWrite::MissingRelation("artist"));
        }
        if !genre_exists(&tx, new.genre_id)? {
            return Ok(CatalogWrite::MissingRelation("genre"));
        }

        let changed = tx.execute(
            "UPDATE tracks SET album_id = ?1, artist_id = ?2, genre_id = ?3, title = ?4, \
             duration = ?5, file_path = ?6 WHERE id = ?7",
            params![
                new.album_id,
                new.artist_id,
                new.genre_id,
                new.title,
                new.duration,
                new.file_path,
                id
            ],
        )?;
        if changed == 0 {
            return Ok(CatalogWrite::NotFound);
        }
        let track = get_track_row(&tx, id)?;
        tx.commit()?;

        match track {
            Some(track) => Ok(CatalogWrite::Done(track)),
            None => Ok(CatalogWrite::NotFound),
        }
    }

    fn delete_track(&self, id: i64) -> Result<Option<String>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let title: Option<String> = tx
            .query_row(
                "SELECT title FROM tracks WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let title = match title {
            Some(title) => title,
            None => return Ok(None),
        };

        clear_track_references(&tx, "id = ?1", id)?;
        tx.execute("DELETE FROM tracks WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(Some(title))
    }

    fn catalog_summary(&self) -> Result<CatalogSummary> {
        let conn = self.conn.lock().unwrap();
        let summary = conn.query_row(
            "SELECT \
                 (SELECT COUNT(*) FROM users), \
                 (SELECT COUNT(*) FROM artists), \
                 (SELECT COUNT(*) FROM albums), \
                 (SELECT COUNT(*) FROM tracks), \
                 (SELECT COUNT(*) FROM playlists)",
            [],
            |row| {
                Ok(CatalogSummary {
                    users: row.get(0)?,
                    artists: row.get(1)?,
                    albums: row.get(2)?,
                    tracks: row.get(3)?,
                    playlists: row.get(4)?,
                })
            },
        )?;
        Ok(summary)
    }

    fn recent_catalog_activity(&self, limit: usize) -> Result<Vec<CatalogActivityItem>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT 'Track' AS kind, title AS name, created FROM tracks \
             UNION ALL SELECT 'Album', title, created FROM albums \
             UNION ALL SELECT 'Artist', name, created FROM artists \
             UNION ALL SELECT 'Playlist', name, created FROM playlists \
             ORDER BY created DESC LIMIT ?1",
        )?;
        let items = stmt
            .query_map(params![limit as i64], |row| {
                let kind: String = row.get(0)?;
                let name: String = row.get(1)?;
                let created: i64 = row.get(2)?;
                Ok((kind, name, created))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(kind, name, created)| CatalogActivityItem {
                description: format!("Added {}: {}", kind, name),
                timestamp: format_activity_timestamp(created),
            })
            .collect();
        Ok(items)
    }
}
