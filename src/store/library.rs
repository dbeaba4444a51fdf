//! Per-user library state: likes, playlists, playback, downloads and the
//! user activity feed.

use std::collections::HashSet;

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::*;
use super::{parse_playlist, parse_track_details, SqliteLibraryStore, TRACK_DETAILS_SELECT};

#[derive(Debug, PartialEq, Eq)]
pub enum PlaylistAddOutcome {
    Added,
    /// The track was already on the playlist.
    Duplicate,
}

#[derive(Debug, PartialEq, Eq)]
pub enum BatchAddOutcome {
    /// How many tracks were actually appended (duplicates skipped).
    Added(usize),
    /// At least one of the requested track ids does not exist.
    UnknownTracks,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReorderOutcome {
    Reordered,
    /// The submitted ids are not exactly the playlist's current track set.
    TrackSetMismatch,
}

pub trait UserLibraryStore: Send + Sync {
    // =========================================================================
    // Likes
    // =========================================================================

    /// Idempotent. Returns true if the like was newly recorded.
    fn like_track(&self, user_id: i64, track_id: i64) -> Result<bool>;

    fn unlike_track(&self, user_id: i64, track_id: i64) -> Result<bool>;

    fn liked_tracks(&self, user_id: i64) -> Result<Vec<LikedTrack>>;

    fn liked_tracks_detailed(&self, user_id: i64) -> Result<Vec<LikedTrackDetails>>;

    // =========================================================================
    // Playlists
    // =========================================================================

    fn create_playlist(&self, user_id: i64, name: &str) -> Result<Playlist>;

    /// Atomically creates the playlist with an initial track list. Ok(None)
    /// when some requested track does not exist.
    fn create_playlist_with_tracks(
        &self,
        user_id: i64,
        name: &str,
        track_ids: &[i64],
    ) -> Result<Option<Playlist>>;

    fn get_playlist(&self, playlist_id: i64) -> Result<Option<Playlist>>;

    fn user_playlists(&self, user_id: i64) -> Result<Vec<PlaylistWithTracks>>;

    fn playlist_tracks(&self, playlist_id: i64) -> Result<Vec<PlaylistTrackEntry>>;

    fn rename_playlist(&self, playlist_id: i64, name: &str) -> Result<bool>;

    fn delete_playlist(&self, playlist_id: i64) -> Result<bool>;

    /// Appends at the next free position.
    fn add_track_to_playlist(&self, playlist_id: i64, track_id: i64)
        -> Result<PlaylistAddOutcome>;

    /// All-or-nothing append of several tracks.
    fn add_tracks_to_playlist(&self, playlist_id: i64, track_ids: &[i64])
        -> Result<BatchAddOutcome>;

    /// Removes the track and renumbers the remainder contiguously from 1.
    fn remove_track_from_playlist(&self, playlist_id: i64, track_id: i64) -> Result<bool>;

    /// Rewrites positions to match `track_ids` order (1-based). The submitted
    /// set must equal the playlist's current track set exactly.
    fn reorder_playlist(&self, playlist_id: i64, track_ids: &[i64]) -> Result<ReorderOutcome>;

    /// Admin-owned playlists, visible to everyone.
    fn public_playlists(&self) -> Result<Vec<PublicPlaylist>>;

    /// Copies an admin-owned playlist (tracks and positions included) into
    /// `new_owner`'s library. Ok(None) when the id is not an admin playlist.
    fn fork_public_playlist(&self, playlist_id: i64, new_owner: i64) -> Result<Option<Playlist>>;

    // =========================================================================
    // Playback, downloads, activity
    // =========================================================================

    fn record_playback(&self, user_id: i64, track_id: i64) -> Result<()>;

    fn now_playing(&self, user_id: i64) -> Result<Option<NowPlaying>>;

    fn record_download(&self, user_id: i64, track_id: i64) -> Result<()>;

    fn recent_downloads(&self, user_id: i64, limit: usize) -> Result<Vec<DownloadEntry>>;

    fn record_activity(&self, user_id: i64, activity: &str) -> Result<()>;

    fn recent_activity(&self, user_id: i64, limit: usize) -> Result<Vec<ActivityEntry>>;

    fn user_summary(&self, user_id: i64) -> Result<UserSummary>;
}

const PLAYLIST_SELECT: &str = "SELECT id, user_id, name, created FROM playlists";

const PLAYLIST_TRACKS_SELECT: &str =
    "SELECT pt.track_id, t.title, t.duration, pt.position, pt.added \
     FROM playlist_tracks pt \
     JOIN tracks t ON t.id = pt.track_id \
     WHERE pt.playlist_id = ?1 \
     ORDER BY pt.position";

fn playlist_tracks_of(conn: &Connection, playlist_id: i64) -> Result<Vec<PlaylistTrackEntry>> {
    let mut stmt = conn.prepare(PLAYLIST_TRACKS_SELECT)?;
    let entries = stmt
        .query_map(params![playlist_id], |row| {
            Ok(PlaylistTrackEntry {
                track_id: row.get(0)?,
                title: row.get(1)?,
                duration: row.get(2)?,
                position: row.get(3)?,
                added: row.get(4)?,
            })
        })?
        .collect::<Result<_, _>>()?;
    Ok(entries)
}

/// Distinct existing ids among `track_ids`. Placeholders are built from the
/// slice length, never from user text.
fn count_existing_tracks(conn: &Connection, track_ids: &HashSet<i64>) -> Result<usize> {
    if track_ids.is_empty() {
        return Ok(0);
    }
    let placeholders = vec!["?"; track_ids.len()].join(",");
    let sql = format!(
        "SELECT COUNT(*) FROM tracks WHERE id IN ({})",
        placeholders
    );
    let ids: Vec<i64> = track_ids.iter().copied().collect();
    let count: i64 = conn.query_row(&sql, rusqlite::params_from_iter(ids), |row| row.get(0))?;
    Ok(count as usize)
}

fn next_position(conn: &Connection, playlist_id: i64) -> Result<i64> {
    let max: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position), 0) FROM playlist_tracks WHERE playlist_id = ?1",
        params![playlist_id],
        |row| row.get(0),
    )?;
    Ok(max + 1)
}

/// Rewrites positions 1..=n following `ordered_ids`. Caller has already
/// verified the ids match the playlist's rows.
fn write_positions(conn: &Connection, playlist_id: i64, ordered_ids: &[i64]) -> Result<()> {
    let mut stmt = conn.prepare(
        "UPDATE playlist_tracks SET position = ?1 WHERE playlist_id = ?2 AND track_id = ?3",
    )?;
    for (index, track_id) in ordered_ids.iter().enumerate() {
        stmt.execute(params![(index + 1) as i64, playlist_id, track_id])?;
    }
    Ok(())
}

fn current_track_ids(conn: &Connection, playlist_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT track_id FROM playlist_tracks WHERE playlist_id = ?1 ORDER BY position",
    )?;
    let ids = stmt
        .query_map(params![playlist_id], |row| row.get(0))?
        .collect::<Result<_, _>>()?;
    Ok(ids)
}

impl UserLibraryStore for SqliteLibraryStore {
    fn like_track(&self, user_id: i64, track_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "INSERT OR IGNORE INTO liked_tracks (user_id, track_id) VALUES (?1, ?2)",
            params![user_id, track_id],
        )?;
        Ok(changed > 0)
    }

    fn unlike_track(&self, user_id: i64, track_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "DELETE FROM liked_tracks WHERE user_id = ?1 AND track_id = ?2",
            params![user_id, track_id],
        )?;
        Ok(changed > 0)
    }

    fn liked_tracks(&self, user_id: i64) -> Result<Vec<LikedTrack>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT track_id, liked_at FROM liked_tracks WHERE user_id = ?1 ORDER BY liked_at DESC, id DESC",
        )?;
        let likes = stmt
            .query_map(params![user_id], |row| {
                Ok(LikedTrack {
                    track_id: row.get(0)?,
                    liked_at: row.get(1)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(likes)
    }

    fn liked_tracks_detailed(&self, user_id: i64) -> Result<Vec<LikedTrackDetails>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "{}, lt.liked_at FROM liked_tracks lt \
             JOIN tracks t ON t.id = lt.track_id \
             JOIN albums al ON al.id = t.album_id \
             JOIN artists ar ON ar.id = t.artist_id \
             JOIN genres g ON g.id = t.genre_id \
             WHERE lt.user_id = ?1 \
             ORDER BY lt.liked_at DESC, lt.id DESC",
            "SELECT t.id, t.title, t.duration, t.file_path, \
             al.id, al.title, ar.id, ar.name, g.id, g.name"
        ))?;
        let likes = stmt
            .query_map(params![user_id], |row| {
                let track = parse_track_details(row)?;
                let liked_at: i64 = row.get(10)?;
                Ok(LikedTrackDetails { track, liked_at })
            })?
            .collect::<Result<_, _>>()?;
        Ok(likes)
    }

    fn create_playlist(&self, user_id: i64, name: &str) -> Result<Playlist> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO playlists (user_id, name) VALUES (?1, ?2)",
            params![user_id, name],
        )?;
        let playlist = conn.query_row(
            &format!("{} WHERE id = ?1", PLAYLIST_SELECT),
            params![conn.last_insert_rowid()],
            parse_playlist,
        )?;
        Ok(playlist)
    }

    fn create_playlist_with_tracks(
        &self,
        user_id: i64,
        name: &str,
        track_ids: &[i64],
    ) -> Result<Option<Playlist>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let distinct: HashSet<i64> = track_ids.iter().copied().collect();
        if count_existing_tracks(&tx, &distinct)? != distinct.len() {
            return Ok(None);
        }

        tx.execute(
            "INSERT INTO playlists (user_id, name) VALUES (?1, ?2)",
            params![user_id, name],
        )?;
        let playlist_id = tx.last_insert_rowid();

        let mut position = 0i64;
        let mut seen = HashSet::new();
        for track_id in track_ids {
            if !seen.insert(*track_id) {
                continue;
            }
            position += 1;
            tx.execute(
                "INSERT INTO playlist_tracks (playlist_id, track_id, position) VALUES (?1, ?2, ?3)",
                params![playlist_id, track_id, position],
            )?;
        }

        let playlist = tx.query_row(
            &format!("{} WHERE id = ?1", PLAYLIST_SELECT),
            params![playlist_id],
            parse_playlist,
        )?;
        tx.commit()?;
        Ok(Some(playlist))
    }

    fn get_playlist(&self, playlist_id: i64) -> Result<Option<Playlist>> {
        let conn = self.conn.lock().unwrap();
        let playlist = conn
            .query_row(
                &format!("{} WHERE id = ?1", PLAYLIST_SELECT),
                params![playlist_id],
                parse_playlist,
            )
            .optional()?;
        Ok(playlist)
    }

    fn user_playlists(&self, user_id: i64) -> Result<Vec<PlaylistWithTracks>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare(&format!("{} WHERE user_id = ?1 ORDER BY id", PLAYLIST_SELECT))?;
        let playlists: Vec<Playlist> = stmt
            .query_map(params![user_id], parse_playlist)?
            .collect::<Result<_, _>>()?;

        playlists
            .into_iter()
            .map(|playlist| {
                Ok(PlaylistWithTracks {
                    id: playlist.id,
                    name: playlist.name,
                    created: playlist.created,
                    tracks: playlist_tracks_of(&conn, playlist.id)?,
                })
            })
            .collect()
    }

    fn playlist_tracks(&self, playlist_id: i64) -> Result<Vec<PlaylistTrackEntry>> {
        let conn = self.conn.lock().unwrap();
        playlist_tracks_of(&conn, playlist_id)
    }

    fn rename_playlist(&self, playlist_id: i64, name: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE playlists SET name = ?1 WHERE id = ?2",
            params![name, playlist_id],
        )?;
        Ok(changed > 0)
    }

    fn delete_playlist(&self, playlist_id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM playlist_tracks WHERE playlist_id = ?1",
            params![playlist_id],
        )?;
        let changed = tx.execute("DELETE FROM playlists WHERE id = ?1", params![playlist_id])?;
        tx.commit()?;
        Ok(changed > 0)
    }

    fn add_track_to_playlist(
        &self,
        playlist_id: i64,
        track_id: i64,
    ) -> Result<PlaylistAddOutcome> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let position = next_position(&tx, playlist_id)?;
        let changed = tx.execute(
            "INSERT OR IGNORE INTO playlist_tracks (playlist_id, track_id, position) \
             VALUES (?1, ?2, ?3)",
            params![playlist_id, track_id, position],
        )?;
        tx.commit()?;
        if changed == 0 {
            Ok(PlaylistAddOutcome::Duplicate)
        } else {
            Ok(PlaylistAddOutcome::Added)
        }
    }

    fn add_tracks_to_playlist(
        &self,
        playlist_id: i64,
        track_ids: &[i64],
    ) -> Result<BatchAddOutcome> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let distinct: HashSet<i64> = track_ids.iter().copied().collect();
        if count_existing_tracks(&tx, &distinct)? != distinct.len() {
            return Ok(BatchAddOutcome::UnknownTracks);
        }

        let mut position = next_position(&tx, playlist_id)? - 1;
        let mut added = 0usize;
        let mut seen = HashSet::new();
        for track_id in track_ids {
            if !seen.insert(*track_id) {
                continue;
            }
            let changed = tx.execute(
                "INSERT OR IGNORE INTO playlist_tracks (playlist_id, track_id, position) \
                 VALUES (?1, ?2, ?3)",
                params![playlist_id, track_id, position + 1],
            )?;
            if changed > 0 {
                position += 1;
                added += 1;
            }
        }
        tx.commit()?;
        Ok(BatchAddOutcome::Added(added))
    }

    fn remove_track_from_playlist(&self, playlist_id: i64, track_id: i64) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "DELETE FROM playlist_tracks WHERE playlist_id = ?1 AND track_id = ?2",
            params![playlist_id, track_id],
        )?;
        if changed == 0 {
            return Ok(false);
        }

        let remaining = current_track_ids(&tx, playlist_id)?;
        write_positions(&tx, playlist_id, &remaining)?;
        tx.commit()?;
        Ok(true)
    }

    fn reorder_playlist(&self, playlist_id: i64, track_ids: &[i64]) -> Result<ReorderOutcome> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let current: HashSet<i64> = current_track_ids(&tx, playlist_id)?.into_iter().collect();
        let submitted: HashSet<i64> = track_ids.iter().copied().collect();
        if track_ids.len() != current.len() || submitted != current {
            return Ok(ReorderOutcome::TrackSetMismatch);
        }

        write_positions(&tx, playlist_id, track_ids)?;
        tx.commit()?;
        Ok(ReorderOutcome::Reordered)
    }

    fn public_playlists(&self) -> Result<Vec<PublicPlaylist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, u.name FROM playlists p \
             JOIN users u ON u.id = p.user_id \
             WHERE u.role = 'admin' \
             ORDER BY p.id",
        )?;
        let heads: Vec<(i64, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<_, _>>()?;

        heads
            .into_iter()
            .map(|(id, name, owner_name)| {
                Ok(PublicPlaylist {
                    id,
                    name,
                    owner_name,
                    tracks: playlist_tracks_of(&conn, id)?,
                })
            })
            .collect()
    }

    fn fork_public_playlist(&self, playlist_id: i64, new_owner: i64) -> Result<Option<Playlist>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let name: Option<String> = tx
            .query_row(
                "SELECT p.name FROM playlists p \
                 JOIN users u ON u.id = p.user_id \
                 WHERE p.id = ?1 AND u.role = 'admin'",
                params![playlist_id],
                |row| row.get(0),
            )
            .optional()?;
        let name = match name {
            Some(name) => name,
            None => return Ok(None),
        };

        tx.execute(
            "INSERT INTO playlists (user_id, name) VALUES (?1, ?2)",
            params![new_owner, name],
        )?;
        let copy_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO playlist_tracks (playlist_id, track_id, position) \
             SELECT ?1, track_id, position FROM playlist_tracks WHERE playlist_id = ?2",
            params![copy_id, playlist_id],
        )?;

        let playlist = tx.query_row(
            &format!("{} WHERE id = ?1", PLAYLIST_SELECT),
            params![copy_id],
            parse_playlist,
        )?;
        tx.commit()?;
        Ok(Some(playlist))
    }

    fn record_playback(&self, user_id: i64, track_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO playback_history (user_id, track_id) VALUES (?1, ?2)",
            params![user_id, track_id],
        )?;
        Ok(())
    }

    fn now_playing(&self, user_id: i64) -> Result<Option<NowPlaying>> {
        let conn = self.conn.lock().unwrap();
        let latest: Option<(i64, i64)> = conn
            .query_row(
                "SELECT track_id, played_at FROM playback_history \
                 WHERE user_id = ?1 ORDER BY played_at DESC, id DESC LIMIT 1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (track_id, played_at) = match latest {
            Some(latest) => latest,
            None => return Ok(None),
        };

        let track = conn.query_row(
            &format!("{} WHERE t.id = ?1", TRACK_DETAILS_SELECT),
            params![track_id],
            parse_track_details,
        )?;
        Ok(Some(NowPlaying { track, played_at }))
    }

    fn record_download(&self, user_id: i64, track_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO download_history (user_id, track_id) VALUES (?1, ?2)",
            params![user_id, track_id],
        )?;
        Ok(())
    }

    fn recent_downloads(&self, user_id: i64, limit: usize) -> Result<Vec<DownloadEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT dh.track_id, t.title, dh.downloaded_at \
             FROM download_history dh \
             JOIN tracks t ON t.id = dh.track_id \
             WHERE dh.user_id = ?1 \
             ORDER BY dh.downloaded_at DESC, dh.id DESC LIMIT ?2",
        )?;
        let downloads = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(DownloadEntry {
                    track_id: row.get(0)?,
                    title: row.get(1)?,
                    downloaded_at: row.get(2)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(downloads)
    }

    fn record_activity(&self, user_id: i64, activity: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO user_activity (user_id, activity) VALUES (?1, ?2)",
            params![user_id, activity],
        )?;
        Ok(())
    }

    fn recent_activity(&self, user_id: i64, limit: usize) -> Result<Vec<ActivityEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, activity, created FROM user_activity \
             WHERE user_id = ?1 ORDER BY created DESC, id DESC LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(ActivityEntry {
                    id: row.get(0)?,
                    activity: row.get(1)?,
                    created: row.get(2)?,
                })
            })?
            .collect::<Result<_, _>>()?;
        Ok(entries)
    }

    fn user_summary(&self, user_id: i64) -> Result<UserSummary> {
        let conn = self.conn.lock().unwrap();
        let summary = conn.query_row(
            "SELECT \
                 (SELECT COUNT(*) FROM liked_tracks WHERE user_id = ?1), \
                 (SELECT COUNT(*) FROM playlists WHERE user_id = ?1), \
                 (SELECT COUNT(*) FROM playback_history WHERE user_id = ?1), \
                 (SELECT COUNT(*) FROM tracks)",
            params![user_id],
            |row| {
                Ok(UserSummary {
                    liked_tracks: row.get(0)?,
                    playlists: row.get(1)?,
                    playbacks: row.get(2)?,
                    catalog_tracks: row.get(3)?,
                })
            },
        )?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::accounts::{AccountStore, UserCreation};
    use crate::store::catalog::{CatalogStore, CatalogWrite};
    use crate::user::UserRole;

    struct Fixture {
        store: SqliteLibraryStore,
        user_id: i64,
        admin_id: i64,
        track_ids: Vec<i64>,
    }

    fn fixture() -> Fixture {
        let store = SqliteLibraryStore::in_memory().unwrap();

        let user_id = create_user(&store, "user@test.com", UserRole::Regular);
        let admin_id = create_user(&store, "admin@test.com", UserRole::Admin);

        let artist = match store
            .create_artist(&NewArtist {
                name: "Band".to_string(),
                biography: None,
            })
            .unwrap()
        {
            CatalogWrite::Done(artist) => artist,
            other => panic!("unexpected outcome: {:?}", other),
        };
        let genre = match store
            .create_genre(&NewGenre {
                name: "Jazz".to_string(),
                description: None,
            })
            .unwrap()
        {
            CatalogWrite::Done(genre) => genre,
            other => panic!("unexpected outcome: {:?}", other),
        };
        let album = match store
            .create_album(&NewAlbum {
                artist_id: artist.id,
                genre_id: genre.id,
                title: "Album".to_string(),
                release_year: None,
            })
            .unwrap()
        {
            CatalogWrite::Done(album) => album,
            other => panic!("unexpected outcome: {:?}", other),
        };

        let track_ids = (0..3)
            .map(|n| {
                match store
                    .create_track(&NewTrack {
                        album_id: album.id,
                        artist_id: artist.id,
                        genre_id: genre.id,
                        title: format!("Track {}", n + 1),
                        duration: 180,
                        file_path: None,
                    })
                    .unwrap()
                {
                    CatalogWrite::Done(track) => track.id,
                    other => panic!("unexpected outcome: {:?}", other),
                }
            })
            .collect();

        Fixture {
            store,
            user_id,
            admin_id,
            track_ids,
        }
    }

    fn create_user(store: &SqliteLibraryStore, email: &str, role: UserRole) -> i64 {
        match store
            .create_user(&NewUser {
                name: "Someone".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                role,
                subscription_plan: None,
            })
            .unwrap()
        {
            UserCreation::Created(user) => user.id,
            UserCreation::DuplicateEmail => panic!("unexpected duplicate email"),
        }
    }

    fn positions(store: &SqliteLibraryStore, playlist_id: i64) -> Vec<(i64, i64)> {
        store
            .playlist_tracks(playlist_id)
            .unwrap()
            .into_iter()
            .map(|entry| (entry.track_id, entry.position))
            .collect()
    }

    #[test]
    fn like_is_idempotent() {
        let f = fixture();

        assert!(f.store.like_track(f.user_id, f.track_ids[0]).unwrap());
        assert!(!f.store.like_track(f.user_id, f.track_ids[0]).unwrap());
        assert_eq!(f.store.liked_tracks(f.user_id).unwrap().len(), 1);

        assert!(f.store.unlike_track(f.user_id, f.track_ids[0]).unwrap());
        assert!(!f.store.unlike_track(f.user_id, f.track_ids[0]).unwrap());
        assert!(f.store.liked_tracks(f.user_id).unwrap().is_empty());
    }

    #[test]
    fn liked_tracks_detailed_carries_names() {
        let f = fixture();
        f.store.like_track(f.user_id, f.track_ids[1]).unwrap();

        let likes = f.store.liked_tracks_detailed(f.user_id).unwrap();
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].track.title, "Track 2");
        assert_eq!(likes[0].track.artist_name, "Band");
        assert_eq!(likes[0].track.album_title, "Album");
        assert_eq!(likes[0].track.genre_name, "Jazz");
    }

    #[test]
    fn playlist_positions_are_appended_in_order() {
        let f = fixture();
        let playlist = f.store.create_playlist(f.user_id, "Mix").unwrap();

        for track_id in &f.track_ids {
            assert_eq!(
                f.store.add_track_to_playlist(playlist.id, *track_id).unwrap(),
                PlaylistAddOutcome::Added
            );
        }
        assert_eq!(
            f.store
                .add_track_to_playlist(playlist.id, f.track_ids[0])
                .unwrap(),
            PlaylistAddOutcome::Duplicate
        );

        assert_eq!(
            positions(&f.store, playlist.id),
            vec![
                (f.track_ids[0], 1),
                (f.track_ids[1], 2),
                (f.track_ids[2], 3)
            ]
        );
    }

    #[test]
    fn batch_add_rejects_unknown_tracks_atomically() {
        let f = fixture();
        let playlist = f.store.create_playlist(f.user_id, "Mix").unwrap();

        let outcome = f
            .store
            .add_tracks_to_playlist(playlist.id, &[f.track_ids[0], 999])
            .unwrap();
        assert_eq!(outcome, BatchAddOutcome::UnknownTracks);
        assert!(positions(&f.store, playlist.id).is_empty());

        let outcome = f
            .store
            .add_tracks_to_playlist(playlist.id, &[f.track_ids[0], f.track_ids[2]])
            .unwrap();
        assert_eq!(outcome, BatchAddOutcome::Added(2));
        assert_eq!(
            positions(&f.store, playlist.id),
            vec![(f.track_ids[0], 1), (f.track_ids[2], 2)]
        );
    }

    #[test]
    fn create_playlist_with_tracks_validates_all() {
        let f = fixture();

        assert!(f
            .store
            .create_playlist_with_tracks(f.user_id, "Bad", &[f.track_ids[0], 999])
            .unwrap()
            .is_none());
        assert!(f.store.user_playlists(f.user_id).unwrap().is_empty());

        let playlist = f
            .store
            .create_playlist_with_tracks(f.user_id, "Good", &f.track_ids)
            .unwrap()
            .unwrap();
        assert_eq!(positions(&f.store, playlist.id).len(), 3);
    }

    #[test]
    fn removing_a_track_renumbers_contiguously() {
        let f = fixture();
        let playlist = f
            .store
            .create_playlist_with_tracks(f.user_id, "Mix", &f.track_ids)
            .unwrap()
            .unwrap();

        assert!(f
            .store
            .remove_track_from_playlist(playlist.id, f.track_ids[1])
            .unwrap());
        assert_eq!(
            positions(&f.store, playlist.id),
            vec![(f.track_ids[0], 1), (f.track_ids[2], 2)]
        );

        assert!(!f
            .store
            .remove_track_from_playlist(playlist.id, f.track_ids[1])
            .unwrap());
    }

    #[test]
    fn reorder_requires_exact_track_set() {
        let f = fixture();
        let playlist = f
            .store
            .create_playlist_with_tracks(f.user_id, "Mix", &f.track_ids)
            .unwrap()
            .unwrap();

        let subset = f
            .store
            .reorder_playlist(playlist.id, &[f.track_ids[0], f.track_ids[1]])
            .unwrap();
        assert_eq!(subset, ReorderOutcome::TrackSetMismatch);
        // Unchanged on rejection.
        assert_eq!(
            positions(&f.store, playlist.id),
            vec![
                (f.track_ids[0], 1),
                (f.track_ids[1], 2),
                (f.track_ids[2], 3)
            ]
        );

        let reordered = f
            .store
            .reorder_playlist(
                playlist.id,
                &[f.track_ids[2], f.track_ids[0], f.track_ids[1]],
            )
            .unwrap();
        assert_eq!(reordered, ReorderOutcome::Reordered);
        assert_eq!(
            positions(&f.store, playlist.id),
            vec![
                (f.track_ids[2], 1),
                (f.track_ids[0], 2),
                (f.track_ids[1], 3)
            ]
        );
    }

    #[test]
    fn reorder_rejects_duplicate_ids() {
        let f = fixture();
        let playlist = f
            .store
            .create_playlist_with_tracks(f.user_id, "Mix", &[f.track_ids[0], f.track_ids[1]])
            .unwrap()
            .unwrap();

        let outcome = f
            .store
            .reorder_playlist(playlist.id, &[f.track_ids[0], f.track_ids[0]])
            .unwrap();
        assert_eq!(outcome, ReorderOutcome::TrackSetMismatch);
    }

    #[test]
    fn public_playlists_are_admin_owned_only() {
        let f = fixture();
        f.store.create_playlist(f.user_id, "Private").unwrap();
        let public = f
            .store
            .create_playlist_with_tracks(f.admin_id, "Staff Picks", &f.track_ids)
            .unwrap()
            .unwrap();

        let listed = f.store.public_playlists().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, public.id);
        assert_eq!(listed[0].name, "Staff Picks");
        assert_eq!(listed[0].tracks.len(), 3);
    }

    #[test]
    fn fork_copies_tracks_and_positions() {
        let f = fixture();
        let public = f
            .store
            .create_playlist_with_tracks(f.admin_id, "Staff Picks", &f.track_ids)
            .unwrap()
            .unwrap();
        f.store
            .reorder_playlist(
                public.id,
                &[f.track_ids[2], f.track_ids[1], f.track_ids[0]],
            )
            .unwrap();

        let copy = f
            .store
            .fork_public_playlist(public.id, f.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(copy.user_id, f.user_id);
        assert_eq!(copy.name, "Staff Picks");
        assert_eq!(
            positions(&f.store, copy.id),
            vec![
                (f.track_ids[2], 1),
                (f.track_ids[1], 2),
                (f.track_ids[0], 3)
            ]
        );

        // Forking a regular user's playlist is refused.
        let private = f.store.create_playlist(f.user_id, "Private").unwrap();
        assert!(f
            .store
            .fork_public_playlist(private.id, f.admin_id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn now_playing_tracks_latest_playback() {
        let f = fixture();
        assert!(f.store.now_playing(f.user_id).unwrap().is_none());

        f.store.record_playback(f.user_id, f.track_ids[0]).unwrap();
        f.store.record_playback(f.user_id, f.track_ids[2]).unwrap();

        let playing = f.store.now_playing(f.user_id).unwrap().unwrap();
        assert_eq!(playing.track.id, f.track_ids[2]);
    }

    #[test]
    fn downloads_are_listed_newest_first_and_capped() {
        let f = fixture();
        for track_id in &f.track_ids {
            f.store.record_download(f.user_id, *track_id).unwrap();
        }

        let downloads = f.store.recent_downloads(f.user_id, 2).unwrap();
        assert_eq!(downloads.len(), 2);
        assert_eq!(downloads[0].track_id, f.track_ids[2]);
    }

    #[test]
    fn activity_feed_is_capped() {
        let f = fixture();
        for n in 0..5 {
            f.store
                .record_activity(f.user_id, &format!("did thing {}", n))
                .unwrap();
        }

        let entries = f.store.recent_activity(f.user_id, 3).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].activity, "did thing 4");
    }

    #[test]
    fn summary_counts_user_rows() {
        let f = fixture();
        f.store.like_track(f.user_id, f.track_ids[0]).unwrap();
        f.store.create_playlist(f.user_id, "Mix").unwrap();
        f.store.record_playback(f.user_id, f.track_ids[0]).unwrap();
        f.store.record_playback(f.user_id, f.track_ids[1]).unwrap();

        let summary = f.store.user_summary(f.user_id).unwrap();
        assert_eq!(summary.liked_tracks, 1);
        assert_eq!(summary.playlists, 1);
        assert_eq!(summary.playbacks, 2);
        assert_eq!(summary.catalog_tracks, 3);
    }
}
