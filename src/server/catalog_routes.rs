//! Unauthenticated catalog browsing.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::store::models::{AlbumDetails, Artist, Genre, PublicPlaylist, TrackDetails};

use super::error::{ApiError, ApiResult};
use super::state::{GuardedCatalogStore, GuardedLibraryStore, ServerState};

async fn list_artists(
    State(catalog): State<GuardedCatalogStore>,
) -> ApiResult<Json<Vec<Artist>>> {
    Ok(Json(catalog.list_artists()?))
}

async fn list_genres(State(catalog): State<GuardedCatalogStore>) -> ApiResult<Json<Vec<Genre>>> {
    Ok(Json(catalog.list_genres()?))
}

async fn list_albums(
    State(catalog): State<GuardedCatalogStore>,
) -> ApiResult<Json<Vec<AlbumDetails>>> {
    Ok(Json(catalog.list_albums()?))
}

async fn list_tracks(
    State(catalog): State<GuardedCatalogStore>,
) -> ApiResult<Json<Vec<TrackDetails>>> {
    Ok(Json(catalog.list_tracks()?))
}

async fn get_track(
    State(catalog): State<GuardedCatalogStore>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TrackDetails>> {
    catalog
        .get_track_details(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("track not found".to_string()))
}

async fn list_public_playlists(
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Vec<PublicPlaylist>>> {
    Ok(Json(library.public_playlists()?))
}

pub(super) fn make_public_routes(state: ServerState) -> Router {
    Router::new()
        .route("/artists", get(list_artists))
        .route("/genres", get(list_genres))
        .route("/albums", get(list_albums))
        .route("/tracks", get(list_tracks))
        .route("/tracks/{id}", get(get_track))
        .route("/public-playlists", get(list_public_playlists))
        .with_state(state)
}
