//! Catalog administration: CRUD over artists/genres/albums/tracks, the
//! dashboard feeds, and the admin's own (public) playlists.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::models::*;
use crate::store::{CatalogWrite, GenreDeletion};

use super::auth_routes::validate_name;
use super::error::{ApiError, ApiResult};
use super::session::AdminSession;
use super::state::{GuardedCatalogStore, GuardedLibraryStore, ServerState};
use super::user_routes::{
    add_playlist_track_for, batch_add_playlist_tracks_for, change_password_for,
    create_playlist_for, delete_playlist_for, remove_playlist_track_for, rename_playlist_for,
    reorder_playlist_for, ChangePasswordBody, CreatePlaylistBody, RenamePlaylistBody,
    TrackIdBody, TrackIdsBody,
};

const CATALOG_ACTIVITY_LIMIT: usize = 10;

fn catalog_write<T>(outcome: CatalogWrite<T>, entity: &str) -> ApiResult<T> {
    match outcome {
        CatalogWrite::Done(value) => Ok(value),
        CatalogWrite::NotFound => Err(ApiError::NotFound(format!("{} not found", entity))),
        CatalogWrite::Duplicate(what) => Err(ApiError::Conflict(format!("duplicate {}", what))),
        CatalogWrite::MissingRelation(what) => {
            Err(ApiError::Validation(format!("unknown {}", what)))
        }
    }
}

// =============================================================================
// Catalog CRUD
// =============================================================================

#[derive(Deserialize, Debug)]
struct ArtistBody {
    name: String,
    biography: Option<String>,
}

impl ArtistBody {
    fn into_new_artist(self) -> ApiResult<NewArtist> {
        Ok(NewArtist {
            name: validate_name(&self.name)?,
            biography: self.biography,
        })
    }
}

async fn post_artist(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Json(body): Json<ArtistBody>,
) -> ApiResult<(StatusCode, Json<Artist>)> {
    let artist = catalog_write(catalog.create_artist(&body.into_new_artist()?)?, "artist")?;
    Ok((StatusCode::CREATED, Json(artist)))
}

async fn put_artist(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
    Json(body): Json<ArtistBody>,
) -> ApiResult<Json<Artist>> {
    let artist = catalog_write(catalog.update_artist(id, &body.into_new_artist()?)?, "artist")?;
    Ok(Json(artist))
}

async fn delete_artist(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !catalog.delete_artist(id)? {
        return Err(ApiError::NotFound("artist not found".to_string()));
    }
    info!("Deleted artist {} and its albums and tracks", id);
    Ok(StatusCode::OK)
}

#[derive(Deserialize, Debug)]
struct GenreBody {
    name: String,
    description: Option<String>,
}

async fn post_genre(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Json(body): Json<GenreBody>,
) -> ApiResult<(StatusCode, Json<Genre>)> {
    let new_genre = NewGenre {
        name: validate_name(&body.name)?,
        description: body.description,
    };
    let genre = catalog_write(catalog.create_genre(&new_genre)?, "genre")?;
    Ok((StatusCode::CREATED, Json(genre)))
}

async fn delete_genre(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    match catalog.delete_genre(id)? {
        GenreDeletion::Deleted => Ok(StatusCode::OK),
        GenreDeletion::NotFound => Err(ApiError::NotFound("genre not found".to_string())),
        GenreDeletion::InUse(count) => Err(ApiError::Conflict(format!(
            "genre is referenced by {} catalog entries",
            count
        ))),
    }
}

#[derive(Deserialize, Debug)]
struct AlbumBody {
    artist_id: i64,
    genre_id: i64,
    title: String,
    release_year: Option<i64>,
}

impl AlbumBody {
    fn into_new_album(self) -> ApiResult<NewAlbum> {
        Ok(NewAlbum {
            artist_id: self.artist_id,
            genre_id: self.genre_id,
            title: validate_name(&self.title)?,
            release_year: self.release_year,
        })
    }
}

async fn post_album(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Json(body): Json<AlbumBody>,
) -> ApiResult<(StatusCode, Json<Album>)> {
    let album = catalog_write(catalog.create_album(&body.into_new_album()?)?, "album")?;
    Ok((StatusCode::CREATED, Json(album)))
}

async fn put_album(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
    Json(body): Json<AlbumBody>,
) -> ApiResult<Json<Album>> {
    let album = catalog_write(catalog.update_album(id, &body.into_new_album()?)?, "album")?;
    Ok(Json(album))
}

async fn delete_album(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !catalog.delete_album(id)? {
        return Err(ApiError::NotFound("album not found".to_string()));
    }
    Ok(StatusCode::OK)
}

#[derive(Deserialize, Debug)]
struct TrackBody {
    album_id: i64,
    artist_id: i64,
    genre_id: i64,
    title: String,
    duration: i64,
    file_path: Option<String>,
}

impl TrackBody {
    fn into_new_track(self) -> ApiResult<NewTrack> {
        if self.duration <= 0 {
            return Err(ApiError::Validation(
                "duration must be positive".to_string(),
            ));
        }
        Ok(NewTrack {
            album_id: self.album_id,
            artist_id: self.artist_id,
            genre_id: self.genre_id,
            title: validate_name(&self.title)?,
            duration: self.duration,
            file_path: self.file_path,
        })
    }
}

async fn post_track(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Json(body): Json<TrackBody>,
) -> ApiResult<(StatusCode, Json<Track>)> {
    let track = catalog_write(catalog.create_track(&body.into_new_track()?)?, "track")?;
    Ok((StatusCode::CREATED, Json(track)))
}

async fn put_track(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
    Json(body): Json<TrackBody>,
) -> ApiResult<Json<Track>> {
    let track = catalog_write(catalog.update_track(id, &body.into_new_track()?)?, "track")?;
    Ok(Json(track))
}

#[derive(Serialize)]
struct DeletedTrackResponse {
    message: String,
}

async fn delete_track(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeletedTrackResponse>> {
    let title = catalog
        .delete_track(id)?
        .ok_or_else(|| ApiError::NotFound("track not found".to_string()))?;
    Ok(Json(DeletedTrackResponse {
        message: format!("Deleted track \"{}\"", title),
    }))
}

// =============================================================================
// Dashboard
// =============================================================================

async fn get_summary(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
) -> ApiResult<Json<CatalogSummary>> {
    Ok(Json(catalog.catalog_summary()?))
}

async fn get_recent_activity(
    _session: AdminSession,
    State(catalog): State<GuardedCatalogStore>,
) -> ApiResult<Json<Vec<CatalogActivityItem>>> {
    Ok(Json(
        catalog.recent_catalog_activity(CATALOG_ACTIVITY_LIMIT)?,
    ))
}

async fn change_password(
    AdminSession(session): AdminSession,
    State(state): State<ServerState>,
    Json(body): Json<ChangePasswordBody>,
) -> ApiResult<StatusCode> {
    change_password_for(&state, session.user_id, &body)?;
    Ok(StatusCode::OK)
}

// =============================================================================
// Admin playlists (exposed to everyone as the public ones)
// =============================================================================

async fn post_playlist(
    AdminSession(session): AdminSession,
    State(state): State<ServerState>,
    Json(body): Json<CreatePlaylistBody>,
) -> ApiResult<(StatusCode, Json<Playlist>)> {
    let playlist = create_playlist_for(&state, session.user_id, &body)?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

async fn get_playlists(
    AdminSession(session): AdminSession,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Vec<PlaylistWithTracks>>> {
    Ok(Json(library.user_playlists(session.user_id)?))
}

async fn put_playlist(
    AdminSession(session): AdminSession,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<RenamePlaylistBody>,
) -> ApiResult<Json<Playlist>> {
    Ok(Json(rename_playlist_for(&state, session.user_id, id, &body)?))
}

async fn delete_playlist(
    AdminSession(session): AdminSession,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    delete_playlist_for(&state, session.user_id, id)?;
    Ok(StatusCode::OK)
}

async fn post_playlist_track(
    AdminSession(session): AdminSession,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<TrackIdBody>,
) -> ApiResult<StatusCode> {
    add_playlist_track_for(&state, session.user_id, id, body.track_id)?;
    Ok(StatusCode::CREATED)
}

#[derive(Serialize)]
struct BatchAddResponse {
    added: usize,
}

async fn post_playlist_tracks_batch(
    AdminSession(session): AdminSession,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<TrackIdsBody>,
) -> ApiResult<Json<BatchAddResponse>> {
    let added = batch_add_playlist_tracks_for(&state, session.user_id, id, &body.track_ids)?;
    Ok(Json(BatchAddResponse { added }))
}

async fn delete_playlist_track(
    AdminSession(session): AdminSession,
    State(state): State<ServerState>,
    Path((id, track_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    remove_playlist_track_for(&state, session.user_id, id, track_id)?;
    Ok(StatusCode::OK)
}

async fn put_playlist_reorder(
    AdminSession(session): AdminSession,
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(body): Json<TrackIdsBody>,
) -> ApiResult<StatusCode> {
    reorder_playlist_for(&state, session.user_id, id, &body.track_ids)?;
    Ok(StatusCode::OK)
}

pub(super) fn make_admin_routes(state: ServerState) -> Router {
    Router::new()
        .route("/artists", post(post_artist))
        .route("/artists/{id}", put(put_artist).delete(delete_artist))
        .route("/genres", post(post_genre))
        .route("/genres/{id}", delete(delete_genre))
        .route("/albums", post(post_album))
        .route("/albums/{id}", put(put_album).delete(delete_album))
        .route("/tracks", post(post_track))
        .route("/tracks/{id}", put(put_track).delete(delete_track))
        .route("/summary", get(get_summary))
        .route("/recent-activity", get(get_recent_activity))
        .route("/change-password", post(change_password))
        .route("/playlists", get(get_playlists).post(post_playlist))
        .route(
            "/playlists/{id}",
            put(put_playlist).delete(delete_playlist),
        )
        .route("/playlists/{id}/tracks", post(post_playlist_track))
        .route(
            "/playlists/{id}/tracks/batch",
            post(post_playlist_tracks_batch),
        )
        .route(
            "/playlists/{id}/tracks/{track_id}",
            delete(delete_playlist_track),
        )
        .route("/playlists/{id}/reorder", put(put_playlist_reorder))
        .with_state(state)
}
