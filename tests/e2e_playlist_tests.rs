mod common;

use common::{TestClient, TestServer};
use serde_json::{json, Value};

async fn create_playlist(client: &TestClient, name: &str, track_ids: &[i64]) -> i64 {
    let body = if track_ids.is_empty() {
        json!({ "name": name })
    } else {
        json!({ "name": name, "track_ids": track_ids })
    };
    let response = client.post_json("/api/user/playlists", &body).await;
    assert_eq!(response.status(), 201);
    let playlist: Value = response.json().await.unwrap();
    playlist["id"].as_i64().unwrap()
}

async fn playlist_track_ids(client: &TestClient, playlist_id: i64) -> Vec<i64> {
    let response = client
        .get(&format!("/api/user/playlists/{}/tracks", playlist_id))
        .await;
    assert_eq!(response.status(), 200);
    let tracks: Vec<Value> = response.json().await.unwrap();
    // Positions must always be contiguous from 1.
    for (i, track) in tracks.iter().enumerate() {
        assert_eq!(track["position"].as_i64().unwrap(), (i + 1) as i64);
    }
    tracks
        .iter()
        .map(|track| track["track_id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_create_playlist_with_tracks_preserves_order() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server.base_url).await;
    let tracks = &server.seeded.track_ids;

    let reversed: Vec<i64> = tracks.iter().rev().copied().collect();
    let playlist_id = create_playlist(&client, "Backwards", &reversed).await;

    assert_eq!(playlist_track_ids(&client, playlist_id).await, reversed);
}

#[tokio::test]
async fn test_create_playlist_rejects_unknown_tracks() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server.base_url).await;

    let response = client
        .post_json(
            "/api/user/playlists",
            &json!({ "name": "Broken", "track_ids": [server.seeded.track_ids[0], 999_999] }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "unknown track id");

    // Nothing was created.
    let response = client.get("/api/user/playlists").await;
    let playlists: Vec<Value> = response.json().await.unwrap();
    assert!(playlists.is_empty());
}

#[tokio::test]
async fn test_rename_and_delete_playlist() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server.base_url).await;

    let playlist_id = create_playlist(&client, "Old Name", &[]).await;

    let response = client
        .put_json(
            &format!("/api/user/playlists/{}", playlist_id),
            &json!({ "name": "New Name" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let playlist: Value = response.json().await.unwrap();
    assert_eq!(playlist["name"], "New Name");

    let response = client
        .delete(&format!("/api/user/playlists/{}", playlist_id))
        .await;
    assert_eq!(response.status(), 200);

    let response = client
        .delete(&format!("/api/user/playlists/{}", playlist_id))
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_foreign_and_unknown_playlists_are_indistinguishable() {
    let server = TestServer::spawn().await;
    let admin = TestClient::authenticated_admin(&server.base_url).await;
    let user = TestClient::authenticated(&server.base_url).await;

    let response = admin
        .post_json("/api/admin/playlists", &json!({ "name": "Admin Picks" }))
        .await;
    assert_eq!(response.status(), 201);
    let playlist: Value = response.json().await.unwrap();
    let admin_playlist_id = playlist["id"].as_i64().unwrap();

    // Someone else's playlist and a nonexistent one get the same answer.
    let response = user
        .put_json(
            &format!("/api/user/playlists/{}", admin_playlist_id),
            &json!({ "name": "Hijacked" }),
        )
        .await;
    assert_eq!(response.status(), 403);
    let foreign: Value = response.json().await.unwrap();

    let response = user
        .put_json("/api/user/playlists/999999", &json!({ "name": "Ghost" }))
        .await;
    assert_eq!(response.status(), 403);
    let unknown: Value = response.json().await.unwrap();
    assert_eq!(foreign, unknown);
    assert_eq!(unknown["message"], "playlist not found or not yours");
}

#[tokio::test]
async fn test_adding_same_track_twice_conflicts() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server.base_url).await;
    let track_id = server.seeded.track_ids[0];

    let playlist_id = create_playlist(&client, "Singles", &[]).await;

    let response = client
        .post_json(
            &format!("/api/user/playlists/{}/tracks", playlist_id),
            &json!({ "track_id": track_id }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = client
        .post_json(
            &format!("/api/user/playlists/{}/tracks", playlist_id),
            &json!({ "track_id": track_id }),
        )
        .await;
    assert_eq!(response.status(), 409);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "track already on playlist");
}

#[tokio::test]
async fn test_batch_add_is_atomic() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server.base_url).await;
    let tracks = &server.seeded.track_ids;

    let playlist_id = create_playlist(&client, "Batched", &[tracks[0]]).await;

    let response = client
        .post_json(
            &format!("/api/user/playlists/{}/tracks/batch", playlist_id),
            &json!({ "track_ids": [tracks[1], 999_999] }),
        )
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(playlist_track_ids(&client, playlist_id).await, vec![tracks[0]]);

    // Duplicates of tracks already on the playlist are skipped, not errors.
    let response = client
        .post_json(
            &format!("/api/user/playlists/{}/tracks/batch", playlist_id),
            &json!({ "track_ids": [tracks[0], tracks[1], tracks[2]] }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["added"], 2);
    assert_eq!(
        playlist_track_ids(&client, playlist_id).await,
        vec![tracks[0], tracks[1], tracks[2]]
    );

    let response = client
        .post_json(
            &format!("/api/user/playlists/{}/tracks/batch", playlist_id),
            &json!({ "track_ids": [] }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_removing_a_track_renumbers_the_rest() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server.base_url).await;
    let tracks = &server.seeded.track_ids;

    let playlist_id = create_playlist(&client, "Shrinking", tracks).await;

    let response = client
        .delete(&format!(
            "/api/user/playlists/{}/tracks/{}",
            playlist_id, tracks[1]
        ))
        .await;
    assert_eq!(response.status(), 200);

    // playlist_track_ids asserts contiguous positions from 1.
    assert_eq!(
        playlist_track_ids(&client, playlist_id).await,
        vec![tracks[0], tracks[2]]
    );
}

#[tokio::test]
async fn test_reorder_requires_exact_track_set() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated(&server.base_url).await;
    let tracks = &server.seeded.track_ids;

    let playlist_id = create_playlist(&client, "Shuffled", tracks).await;

    let response = client
        .put_json(
            &format!("/api/user/playlists/{}/reorder", playlist_id),
            &json!({ "track_ids": [tracks[2], tracks[0], tracks[1]] }),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        playlist_track_ids(&client, playlist_id).await,
        vec![tracks[2], tracks[0], tracks[1]]
    );

    // A subset is not a permutation; the order must be left alone.
    let response = client
        .put_json(
            &format!("/api/user/playlists/{}/reorder", playlist_id),
            &json!({ "track_ids": [tracks[0], tracks[1]] }),
        )
        .await;
    assert_eq!(response.status(), 400);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "track ids do not match playlist contents");
    assert_eq!(
        playlist_track_ids(&client, playlist_id).await,
        vec![tracks[2], tracks[0], tracks[1]]
    );
}

#[tokio::test]
async fn test_public_playlists_are_admin_owned_and_browsable() {
    let server = TestServer::spawn().await;
    let admin = TestClient::authenticated_admin(&server.base_url).await;
    let user = TestClient::authenticated(&server.base_url).await;
    let tracks = &server.seeded.track_ids;

    let response = admin
        .post_json(
            "/api/admin/playlists",
            &json!({ "name": "Staff Picks", "track_ids": [tracks[0], tracks[1]] }),
        )
        .await;
    assert_eq!(response.status(), 201);

    // A regular user's playlist never shows up here.
    create_playlist(&user, "Private Mix", tracks).await;

    let anonymous = TestClient::new(&server.base_url);
    let response = anonymous.get("/api/user/public-playlists").await;
    assert_eq!(response.status(), 200);

    let playlists: Vec<Value> = response.json().await.unwrap();
    assert_eq!(playlists.len(), 1);
    assert_eq!(playlists[0]["name"], "Staff Picks");
    assert_eq!(playlists[0]["tracks"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_saving_a_public_playlist_copies_it() {
    let server = TestServer::spawn().await;
    let admin = TestClient::authenticated_admin(&server.base_url).await;
    let user = TestClient::authenticated(&server.base_url).await;
    let tracks = &server.seeded.track_ids;

    let response = admin
        .post_json(
            "/api/admin/playlists",
            &json!({ "name": "Staff Picks", "track_ids": [tracks[1], tracks[0]] }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let public: Value = response.json().await.unwrap();
    let public_id = public["id"].as_i64().unwrap();

    let response = user
        .post(&format!("/api/user/public-playlists/{}/save", public_id))
        .await;
    assert_eq!(response.status(), 201);
    let copy: Value = response.json().await.unwrap();
    let copy_id = copy["id"].as_i64().unwrap();
    assert_ne!(copy_id, public_id);
    assert_eq!(copy["name"], "Staff Picks");

    assert_eq!(
        playlist_track_ids(&user, copy_id).await,
        vec![tracks[1], tracks[0]]
    );

    // A regular user's playlist cannot be saved this way.
    let private_id = create_playlist(&user, "Private Mix", &[]).await;
    let other = TestClient::authenticated_admin(&server.base_url).await;
    let response = other
        .post(&format!("/api/user/public-playlists/{}/save", private_id))
        .await;
    assert_eq!(response.status(), 404);
    let error: Value = response.json().await.unwrap();
    assert_eq!(error["message"], "public playlist not found");
}
