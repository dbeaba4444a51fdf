//! Canonical relational schema, snake_case throughout.
//!
//! Catalog-entity references (tracks -> albums/artists/genres and the
//! per-track rows in likes/playlists/history) deliberately use NO ACTION:
//! the store removes dependents itself, in order, inside a transaction.
//! User-owned rows cascade with the user.

use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnDelete, Schema, SqlType, Table, DEFAULT_TIMESTAMP,
};
use crate::sqlite_column;

const USERS_FK: ForeignKey = ForeignKey {
    foreign_table: "users",
    foreign_column: "id",
    on_delete: ForeignKeyOnDelete::Cascade,
};

const ARTISTS_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "id",
    on_delete: ForeignKeyOnDelete::NoAction,
};

const GENRES_FK: ForeignKey = ForeignKey {
    foreign_table: "genres",
    foreign_column: "id",
    on_delete: ForeignKeyOnDelete::NoAction,
};

const ALBUMS_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "id",
    on_delete: ForeignKeyOnDelete::NoAction,
};

const TRACKS_FK: ForeignKey = ForeignKey {
    foreign_table: "tracks",
    foreign_column: "id",
    on_delete: ForeignKeyOnDelete::NoAction,
};

const PLAYLISTS_FK: ForeignKey = ForeignKey {
    foreign_table: "playlists",
    foreign_column: "id",
    on_delete: ForeignKeyOnDelete::Cascade,
};

pub const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("password_hash", &SqlType::Text, non_null = true),
        sqlite_column!("role", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("last_login", &SqlType::Integer),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const SUBSCRIPTIONS_TABLE: Table = Table {
    name: "subscriptions",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            is_unique = true,
            foreign_key = Some(&USERS_FK)
        ),
        sqlite_column!("plan", &SqlType::Text, non_null = true),
        sqlite_column!("start_date", &SqlType::Integer, non_null = true),
        sqlite_column!("end_date", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "is_active",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("biography", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("description", &SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTISTS_FK)
        ),
        sqlite_column!(
            "genre_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&GENRES_FK)
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("release_year", &SqlType::Integer),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_albums_artist_id", "artist_id")],
    unique_constraints: &[],
};

pub const TRACKS_TABLE: Table = Table {
    name: "tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "album_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ALBUMS_FK)
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ARTISTS_FK)
        ),
        sqlite_column!(
            "genre_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&GENRES_FK)
        ),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("duration", &SqlType::Integer, non_null = true),
        sqlite_column!("file_path", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_tracks_album_id", "album_id"),
        ("idx_tracks_genre_id", "genre_id"),
    ],
    unique_constraints: &[],
};

pub const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USERS_FK)
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_playlists_user_id", "user_id")],
    unique_constraints: &[],
};

pub const PLAYLIST_TRACKS_TABLE: Table = Table {
    name: "playlist_tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "playlist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PLAYLISTS_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACKS_FK)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "added",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_playlist_tracks_playlist_id", "playlist_id")],
    unique_constraints: &[&["playlist_id", "track_id"]],
};

pub const LIKED_TRACKS_TABLE: Table = Table {
    name: "liked_tracks",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USERS_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACKS_FK)
        ),
        sqlite_column!(
            "liked_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_liked_tracks_user_id", "user_id")],
    unique_constraints: &[&["user_id", "track_id"]],
};

pub const PLAYBACK_HISTORY_TABLE: Table = Table {
    name: "playback_history",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USERS_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACKS_FK)
        ),
        sqlite_column!(
            "played_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_playback_history_user_id", "user_id")],
    unique_constraints: &[],
};

pub const DOWNLOAD_HISTORY_TABLE: Table = Table {
    name: "download_history",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USERS_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACKS_FK)
        ),
        sqlite_column!(
            "downloaded_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_download_history_user_id", "user_id")],
    unique_constraints: &[],
};

pub const USER_ACTIVITY_TABLE: Table = Table {
    name: "user_activity",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&USERS_FK)
        ),
        sqlite_column!("activity", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_user_activity_user_id", "user_id")],
    unique_constraints: &[],
};

pub const LIBRARY_SCHEMA: Schema = Schema {
    tables: &[
        USERS_TABLE,
        SUBSCRIPTIONS_TABLE,
        ARTISTS_TABLE,
        GENRES_TABLE,
        ALBUMS_TABLE,
        TRACKS_TABLE,
        PLAYLISTS_TABLE,
        PLAYLIST_TRACKS_TABLE,
        LIKED_TRACKS_TABLE,
        PLAYBACK_HISTORY_TABLE,
        DOWNLOAD_HISTORY_TABLE,
        USER_ACTIVITY_TABLE,
    ],
};

/// The tables holding per-track user rows that must be cleared before a
/// track can go away. Closed list: cascade helpers iterate this, never
/// caller-supplied names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackRefTable {
    PlaylistTracks,
    LikedTracks,
    DownloadHistory,
    PlaybackHistory,
}

impl TrackRefTable {
    pub const ALL: [TrackRefTable; 4] = [
        TrackRefTable::PlaylistTracks,
        TrackRefTable::LikedTracks,
        TrackRefTable::DownloadHistory,
        TrackRefTable::PlaybackHistory,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            TrackRefTable::PlaylistTracks => "playlist_tracks",
            TrackRefTable::LikedTracks => "liked_tracks",
            TrackRefTable::DownloadHistory => "download_history",
            TrackRefTable::PlaybackHistory => "playback_history",
        }
    }
}
