use serde::{Deserialize, Serialize};

use crate::user::UserRole;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created: i64,
    pub last_login: Option<i64>,
}

/// A user row together with its stored password hash. Only the login and
/// change-password paths see this.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub subscription_plan: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub plan: String,
    pub start_date: i64,
    pub end_date: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub biography: Option<String>,
    pub created: i64,
}

#[derive(Debug, Clone)]
pub struct NewArtist {
    pub name: String,
    pub biography: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewGenre {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Album {
    pub id: i64,
    pub artist_id: i64,
    pub genre_id: i64,
    pub title: String,
    pub release_year: Option<i64>,
    pub created: i64,
}

/// Album row joined with artist and genre names for browse listings.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumDetails {
    pub id: i64,
    pub title: String,
    pub release_year: Option<i64>,
    pub artist_id: i64,
    pub artist_name: String,
    pub genre_id: i64,
    pub genre_name: String,
    pub created: i64,
}

#[derive(Debug, Clone)]
pub struct NewAlbum {
    pub artist_id: i64,
    pub genre_id: i64,
    pub title: String,
    pub release_year: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub id: i64,
    pub album_id: i64,
    pub artist_id: i64,
    pub genre_id: i64,
    pub title: String,
    pub duration: i64,
    pub file_path: Option<String>,
    pub created: i64,
}

/// Fully denormalized track row: Track x Album x Artist x Genre.
#[derive(Debug, Clone, Serialize)]
pub struct TrackDetails {
    pub id: i64,
    pub title: String,
    pub duration: i64,
    pub file_path: Option<String>,
    pub album_id: i64,
    pub album_title: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub genre_id: i64,
    pub genre_name: String,
}

#[derive(Debug, Clone)]
pub struct NewTrack {
    pub album_id: i64,
    pub artist_id: i64,
    pub genre_id: i64,
    pub title: String,
    pub duration: i64,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Playlist {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistTrackEntry {
    pub track_id: i64,
    pub title: String,
    pub duration: i64,
    pub position: i64,
    pub added: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistWithTracks {
    pub id: i64,
    pub name: String,
    pub created: i64,
    pub tracks: Vec<PlaylistTrackEntry>,
}

/// An admin-owned playlist as exposed to everyone.
#[derive(Debug, Clone, Serialize)]
pub struct PublicPlaylist {
    pub id: i64,
    pub name: String,
    pub owner_name: String,
    pub tracks: Vec<PlaylistTrackEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikedTrack {
    pub track_id: i64,
    pub liked_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LikedTrackDetails {
    pub track: TrackDetails,
    pub liked_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NowPlaying {
    pub track: TrackDetails,
    pub played_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadEntry {
    pub track_id: i64,
    pub title: String,
    pub downloaded_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub activity: String,
    pub created: i64,
}

/// One line of the admin recent-activity feed, already formatted for display.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogActivityItem {
    pub description: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogSummary {
    pub users: i64,
    pub artists: i64,
    pub albums: i64,
    pub tracks: i64,
    pub playlists: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub liked_tracks: i64,
    pub playlists: i64,
    pub playbacks: i64,
    pub catalog_tracks: i64,
}
