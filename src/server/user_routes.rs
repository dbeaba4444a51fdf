//! Authenticated per-user endpoints: profile, subscription, likes,
//! playlists, playback, downloads and the activity feed.
//!
//! Playlist mutations live in `_for` helpers taking an explicit user id so
//! the admin router can mount the same semantics scoped to the admin's own
//! library.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::models::*;
use crate::store::{BatchAddOutcome, PlaylistAddOutcome, ProfileUpdate, ReorderOutcome};
use crate::user::{hash_password, verify_password};

use super::auth_routes::{validate_email, validate_name, validate_password};
use super::error::{ApiError, ApiResult};
use super::session::Session;
use super::state::{GuardedAccountStore, GuardedLibraryStore, ServerState};

const ACTIVITY_FEED_LIMIT: usize = 10;
const DOWNLOADS_FEED_LIMIT: usize = 20;

/// Best-effort activity logging: runs after the primary mutation, failures
/// are logged and swallowed so they never fail the request.
pub(super) fn log_activity(library: &GuardedLibraryStore, user_id: i64, activity: &str) {
    if let Err(err) = library.record_activity(user_id, activity) {
        warn!(
            "Failed to record activity for user {}: {:#}",
            user_id, err
        );
    }
}

fn require_track(state: &ServerState, track_id: i64) -> ApiResult<Track> {
    state
        .catalog
        .get_track(track_id)?
        .ok_or_else(|| ApiError::NotFound("track not found".to_string()))
}

/// A playlist someone else owns must look exactly like one that does not
/// exist, so both cases share a single 403 response.
fn require_owned_playlist(
    state: &ServerState,
    playlist_id: i64,
    user_id: i64,
) -> ApiResult<Playlist> {
    match state.library.get_playlist(playlist_id)? {
        Some(playlist) if playlist.user_id == user_id => Ok(playlist),
        _ => Err(ApiError::Forbidden(
            "playlist not found or not yours".to_string(),
        )),
    }
}

// =============================================================================
// Request bodies shared with the admin router
// =============================================================================

#[derive(Deserialize, Debug)]
pub(super) struct CreatePlaylistBody {
    pub name: String,
    #[serde(default)]
    pub track_ids: Option<Vec<i64>>,
}

#[derive(Deserialize, Debug)]
pub(super) struct RenamePlaylistBody {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub(super) struct TrackIdBody {
    pub track_id: i64,
}

#[derive(Deserialize, Debug)]
pub(super) struct TrackIdsBody {
    pub track_ids: Vec<i64>,
}

#[derive(Deserialize, Debug)]
pub(super) struct ChangePasswordBody {
    pub old_password: String,
    pub new_password: String,
}

// =============================================================================
// Cores reused by admin_routes
// =============================================================================

pub(super) fn create_playlist_for(
    state: &ServerState,
    user_id: i64,
    body: &CreatePlaylistBody,
) -> ApiResult<Playlist> {
    let name = validate_name(&body.name)
        .map_err(|_| ApiError::Validation("playlist name must not be empty".to_string()))?;

    let playlist = match &body.track_ids {
        Some(track_ids) if !track_ids.is_empty() => state
            .library
            .create_playlist_with_tracks(user_id, &name, track_ids)?
            .ok_or_else(|| ApiError::Validation("unknown track id".to_string()))?,
        _ => state.library.create_playlist(user_id, &name)?,
    };

    log_activity(
        &state.library,
        user_id,
        &format!("Created playlist \"{}\"", playlist.name),
    );
    Ok(playlist)
}

pub(super) fn rename_playlist_for(
    state: &ServerState,
    user_id: i64,
    playlist_id: i64,
    body: &RenamePlaylistBody,
) -> ApiResult<Playlist> {
    require_owned_playlist(state, playlist_id, user_id)?;
    let name = validate_name(&body.name)
        .map_err(|_| ApiError::Validation("playlist name must not be empty".to_string()))?;
    state.library.rename_playlist(playlist_id, &name)?;
    state
        .library
        .get_playlist(playlist_id)?
        .ok_or_else(|| ApiError::NotFound("playlist not found".to_string()))
}

pub(super) fn delete_playlist_for(
    state: &ServerState,
    user_id: i64,
    playlist_id: i64,
) -> ApiResult<()> {
    let playlist = require_owned_playlist(state, playlist_id, user_id)?;
    state.library.delete_playlist(playlist_id)?;
    log_activity(
        &state.library,
        user_id,
        &format!("Deleted playlist \"{}\"", playlist.name),
    );
    Ok(())
}

pub(super) fn add_playlist_track_for(
    state: &ServerState,
    user_id: i64,
    playlist_id: i64,
    track_id: i64,
) -> ApiResult<()> {
    let playlist = require_owned_playlist(state, playlist_id, user_id)?;
    let track = require_track(state, track_id)?;

    match state.library.add_track_to_playlist(playlist_id, track_id)? {
        PlaylistAddOutcome::Added => {
            log_activity(
                &state.library,
                user_id,
                &format!("Added \"{}\" to playlist \"{}\"", track.title, playlist.name),
            );
            Ok(())
        }
        PlaylistAddOutcome::Duplicate => Err(ApiError::Conflict(
            "track already on playlist".to_string(),
        )),
    }
}

pub(super) fn batch_add_playlist_tracks_for(
    state: &ServerState,
    user_id: i64,
    playlist_id: i64,
    track_ids: &[i64],
) -> ApiResult<usize> {
    require_owned_playlist(state, playlist_id, user_id)?;
    if track_ids.is_empty() {
        return Err(ApiError::Validation("track_ids must not be empty".to_string()));
    }
    match state
        .library
        .add_tracks_to_playlist(playlist_id, track_ids)?
    {
        BatchAddOutcome::Added(count) => Ok(count),
        BatchAddOutcome::UnknownTracks => {
            Err(ApiError::Validation("unknown track id".to_string()))
        }
    }
}

pub(super) fn remove_playlist_track_for(
    state: &ServerState,
    user_id: i64,
    playlist_id: i64,
    track_id: i64,
) -> ApiResult<()> {
    require_owned_playlist(state, playlist_id, user_id)?;
    state
        .library
        .remove_track_from_playlist(playlist_id, track_id)?;
    Ok(())
}

pub(super) fn reorder_playlist_for(
    state: &ServerState,
    user_id: i64,
    playlist_id: i64,
    track_ids: &[i64],
) -> ApiResult<()> {
    require_owned_playlist(state, playlist_id, user_id)?;
    match state.library.reorder_playlist(playlist_id, track_ids)? {
        ReorderOutcome::Reordered => Ok(()),
        ReorderOutcome::TrackSetMismatch => Err(ApiError::Validation(
            "track ids do not match playlist contents".to_string(),
        )),
    }
}

pub(super) fn change_password_for(
    state: &ServerState,
    user_id: i64,
    body: &ChangePasswordBody,
) -> ApiResult<()> {
    validate_password(&body.new_password)?;
    let current_hash = state
        .accounts
        .get_password_hash(user_id)?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;
    if !verify_password(&body.old_password, &current_hash)? {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }
    let new_hash = hash_password(&body.new_password)?;
    state.accounts.set_password_hash(user_id, &new_hash)?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

async fn get_summary(
    session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<UserSummary>> {
    Ok(Json(library.user_summary(session.user_id)?))
}

async fn get_recent_activity(
    session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    Ok(Json(
        library.recent_activity(session.user_id, ACTIVITY_FEED_LIMIT)?,
    ))
}

#[derive(Deserialize, Debug)]
struct ActivityBody {
    activity: String,
}

async fn post_recent_activity(
    session: Session,
    State(library): State<GuardedLibraryStore>,
    Json(body): Json<ActivityBody>,
) -> ApiResult<StatusCode> {
    let activity = body.activity.trim();
    if activity.is_empty() {
        return Err(ApiError::Validation("activity must not be empty".to_string()));
    }
    library.record_activity(session.user_id, activity)?;
    Ok(StatusCode::CREATED)
}

async fn get_profile(
    session: Session,
    State(accounts): State<GuardedAccountStore>,
) -> ApiResult<Json<User>> {
    accounts
        .get_user(session.user_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))
}

#[derive(Deserialize, Debug)]
struct ProfileBody {
    name: String,
    email: String,
}

async fn put_profile(
    session: Session,
    State(accounts): State<GuardedAccountStore>,
    Json(body): Json<ProfileBody>,
) -> ApiResult<Json<User>> {
    let name = validate_name(&body.name)?;
    let email = validate_email(&body.email)?;
    match accounts.update_profile(session.user_id, &name, &email)? {
        ProfileUpdate::Updated(user) => Ok(Json(user)),
        ProfileUpdate::EmailTaken => {
            Err(ApiError::Conflict("email already registered".to_string()))
        }
        ProfileUpdate::NotFound => Err(ApiError::NotFound("user not found".to_string())),
    }
}

async fn change_password(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<ChangePasswordBody>,
) -> ApiResult<StatusCode> {
    change_password_for(&state, session.user_id, &body)?;
    Ok(StatusCode::OK)
}

/// What the subscription endpoint reports; users without a row are on the
/// implicit free plan.
#[derive(Serialize)]
struct SubscriptionView {
    plan: String,
    start_date: Option<i64>,
    end_date: Option<i64>,
    is_active: bool,
}

impl From<Subscription> for SubscriptionView {
    fn from(subscription: Subscription) -> Self {
        SubscriptionView {
            plan: subscription.plan,
            start_date: Some(subscription.start_date),
            end_date: Some(subscription.end_date),
            is_active: subscription.is_active,
        }
    }
}

async fn get_subscription(
    session: Session,
    State(accounts): State<GuardedAccountStore>,
) -> ApiResult<Json<SubscriptionView>> {
    let view = match accounts.get_subscription(session.user_id)? {
        Some(subscription) => subscription.into(),
        None => SubscriptionView {
            plan: "Free".to_string(),
            start_date: None,
            end_date: None,
            is_active: false,
        },
    };
    Ok(Json(view))
}

#[derive(Deserialize, Debug)]
struct SubscriptionBody {
    plan: String,
}

async fn put_subscription(
    session: Session,
    State(accounts): State<GuardedAccountStore>,
    Json(body): Json<SubscriptionBody>,
) -> ApiResult<Json<SubscriptionView>> {
    let plan = body.plan.trim();
    if plan.is_empty() {
        return Err(ApiError::Validation("plan must not be empty".to_string()));
    }
    let subscription = accounts.set_subscription(session.user_id, plan)?;
    Ok(Json(subscription.into()))
}

async fn post_like(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<TrackIdBody>,
) -> ApiResult<StatusCode> {
    let track = require_track(&state, body.track_id)?;
    let newly_liked = state.library.like_track(session.user_id, body.track_id)?;
    if newly_liked {
        log_activity(
            &state.library,
            session.user_id,
            &format!("Liked \"{}\"", track.title),
        );
        Ok(StatusCode::CREATED)
    } else {
        Ok(StatusCode::OK)
    }
}

async fn delete_like(
    session: Session,
    State(library): State<GuardedLibraryStore>,
    Path(track_id): Path<i64>,
) -> ApiResult<StatusCode> {
    library.unlike_track(session.user_id, track_id)?;
    Ok(StatusCode::OK)
}

async fn get_likes(
    session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Vec<LikedTrack>>> {
    Ok(Json(library.liked_tracks(session.user_id)?))
}

async fn get_likes_detailed(
    session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Vec<LikedTrackDetails>>> {
    Ok(Json(library.liked_tracks_detailed(session.user_id)?))
}

async fn post_playlist(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<CreatePlaylistBody>,
) -> ApiResult<(StatusCode, Json<Playlist>)> {
    let playlist = create_playlist_for(&state, session.user_id, &body)?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

async fn get_playlists(
    session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Vec<PlaylistWithTracks>>> {
    Ok(Json(library.user_playlists(session.user_id)?))
}

async fn put_playlist(
    session: Session,
    State(state): State<ServerState>,
    Path(playlist_id): Path<i64>,
    Json(body): Json<RenamePlaylistBody>,
) -> ApiResult<Json<Playlist>> {
    Ok(Json(rename_playlist_for(
        &state,
        session.user_id,
        playlist_id,
        &body,
    )?))
}

async fn delete_playlist(
    session: Session,
    State(state): State<ServerState>,
    Path(playlist_id): Path<i64>,
) -> ApiResult<StatusCode> {
    delete_playlist_for(&state, session.user_id, playlist_id)?;
    Ok(StatusCode::OK)
}

async fn get_playlist_tracks(
    session: Session,
    State(state): State<ServerState>,
    Path(playlist_id): Path<i64>,
) -> ApiResult<Json<Vec<PlaylistTrackEntry>>> {
    require_owned_playlist(&state, playlist_id, session.user_id)?;
    Ok(Json(state.library.playlist_tracks(playlist_id)?))
}

async fn post_playlist_track(
    session: Session,
    State(state): State<ServerState>,
    Path(playlist_id): Path<i64>,
    Json(body): Json<TrackIdBody>,
) -> ApiResult<StatusCode> {
    add_playlist_track_for(&state, session.user_id, playlist_id, body.track_id)?;
    Ok(StatusCode::CREATED)
}

#[derive(Serialize)]
struct BatchAddResponse {
    added: usize,
}

async fn post_playlist_tracks_batch(
    session: Session,
    State(state): State<ServerState>,
    Path(playlist_id): Path<i64>,
    Json(body): Json<TrackIdsBody>,
) -> ApiResult<Json<BatchAddResponse>> {
    let added =
        batch_add_playlist_tracks_for(&state, session.user_id, playlist_id, &body.track_ids)?;
    Ok(Json(BatchAddResponse { added }))
}

async fn delete_playlist_track(
    session: Session,
    State(state): State<ServerState>,
    Path((playlist_id, track_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    remove_playlist_track_for(&state, session.user_id, playlist_id, track_id)?;
    Ok(StatusCode::OK)
}

async fn put_playlist_reorder(
    session: Session,
    State(state): State<ServerState>,
    Path(playlist_id): Path<i64>,
    Json(body): Json<TrackIdsBody>,
) -> ApiResult<StatusCode> {
    reorder_playlist_for(&state, session.user_id, playlist_id, &body.track_ids)?;
    Ok(StatusCode::OK)
}

async fn post_save_public_playlist(
    session: Session,
    State(state): State<ServerState>,
    Path(playlist_id): Path<i64>,
) -> ApiResult<(StatusCode, Json<Playlist>)> {
    let playlist = state
        .library
        .fork_public_playlist(playlist_id, session.user_id)?
        .ok_or_else(|| ApiError::NotFound("public playlist not found".to_string()))?;
    log_activity(
        &state.library,
        session.user_id,
        &format!("Saved playlist \"{}\"", playlist.name),
    );
    Ok((StatusCode::CREATED, Json(playlist)))
}

async fn get_now_playing(
    session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Option<NowPlaying>>> {
    Ok(Json(library.now_playing(session.user_id)?))
}

async fn post_playback(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<TrackIdBody>,
) -> ApiResult<StatusCode> {
    require_track(&state, body.track_id)?;
    state.library.record_playback(session.user_id, body.track_id)?;
    Ok(StatusCode::CREATED)
}

async fn post_download(
    session: Session,
    State(state): State<ServerState>,
    Json(body): Json<TrackIdBody>,
) -> ApiResult<StatusCode> {
    let track = require_track(&state, body.track_id)?;
    state.library.record_download(session.user_id, body.track_id)?;
    log_activity(
        &state.library,
        session.user_id,
        &format!("Downloaded \"{}\"", track.title),
    );
    Ok(StatusCode::CREATED)
}

async fn get_downloads(
    session: Session,
    State(library): State<GuardedLibraryStore>,
) -> ApiResult<Json<Vec<DownloadEntry>>> {
    Ok(Json(
        library.recent_downloads(session.user_id, DOWNLOADS_FEED_LIMIT)?,
    ))
}

pub(super) fn make_user_routes(state: ServerState) -> Router {
    let authed = Router::new()
        .route("/summary", get(get_summary))
        .route(
            "/recent-activity",
            get(get_recent_activity).post(post_recent_activity),
        )
        .route("/profile", get(get_profile).put(put_profile))
        .route("/change-password", post(change_password))
        .route(
            "/subscription",
            get(get_subscription).put(put_subscription),
        )
        .route("/likes", get(get_likes).post(post_like))
        .route("/likes/detailed", get(get_likes_detailed))
        .route("/likes/{track_id}", delete(delete_like))
        .route("/playlists", get(get_playlists).post(post_playlist))
        .route(
            "/playlists/{id}",
            put(put_playlist).delete(delete_playlist),
        )
        .route(
            "/playlists/{id}/tracks",
            get(get_playlist_tracks).post(post_playlist_track),
        )
        .route(
            "/playlists/{id}/tracks/batch",
            post(post_playlist_tracks_batch),
        )
        .route(
            "/playlists/{id}/tracks/{track_id}",
            delete(delete_playlist_track),
        )
        .route("/playlists/{id}/reorder", put(put_playlist_reorder))
        .route(
            "/public-playlists/{id}/save",
            post(post_save_public_playlist),
        )
        .route("/now-playing", get(get_now_playing))
        .route("/playback", post(post_playback))
        .route("/downloads", get(get_downloads).post(post_download))
        .with_state(state.clone());

    authed.merge(super::catalog_routes::make_public_routes(state))
}
