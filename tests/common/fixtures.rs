//! Seeded database state for end-to-end tests

use super::constants::*;
use mlms_server::store::models::{NewAlbum, NewArtist, NewGenre, NewTrack, NewUser};
use mlms_server::store::{AccountStore, CatalogStore, CatalogWrite, UserCreation};
use mlms_server::user::{hash_password, UserRole};
use mlms_server::SqliteLibraryStore;

/// Ids of the rows every test server starts with: one regular user, one
/// admin, and a small catalog (one artist/genre/album, three tracks).
#[derive(Debug, Clone)]
pub struct SeededData {
    pub user_id: i64,
    pub admin_id: i64,
    pub artist_id: i64,
    pub genre_id: i64,
    pub album_id: i64,
    pub track_ids: Vec<i64>,
}

fn seed_user(store: &SqliteLibraryStore, name: &str, email: &str, pass: &str, role: UserRole) -> i64 {
    let outcome = store
        .create_user(&NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: hash_password(pass).expect("Failed to hash test password"),
            role,
            subscription_plan: None,
        })
        .expect("Failed to seed user");
    match outcome {
        UserCreation::Created(user) => user.id,
        UserCreation::DuplicateEmail => panic!("Duplicate seed email {}", email),
    }
}

fn done<T: std::fmt::Debug>(outcome: CatalogWrite<T>) -> T {
    match outcome {
        CatalogWrite::Done(value) => value,
        other => panic!("Unexpected seed outcome: {:?}", other),
    }
}

pub fn seed(store: &SqliteLibraryStore) -> SeededData {
    let user_id = seed_user(
        store,
        TEST_USER_NAME,
        TEST_USER_EMAIL,
        TEST_USER_PASS,
        UserRole::Regular,
    );
    let admin_id = seed_user(store, ADMIN_NAME, ADMIN_EMAIL, ADMIN_PASS, UserRole::Admin);

    let artist = done(
        store
            .create_artist(&NewArtist {
                name: ARTIST_NAME.to_string(),
                biography: Some("Formed for testing purposes.".to_string()),
            })
            .expect("Failed to seed artist"),
    );
    let genre = done(
        store
            .create_genre(&NewGenre {
                name: GENRE_NAME.to_string(),
                description: None,
            })
            .expect("Failed to seed genre"),
    );
    let album = done(
        store
            .create_album(&NewAlbum {
                artist_id: artist.id,
                genre_id: genre.id,
                title: ALBUM_TITLE.to_string(),
                release_year: Some(2020),
            })
            .expect("Failed to seed album"),
    );

    let track_ids = TRACK_TITLES
        .iter()
        .map(|title| {
            done(
                store
                    .create_track(&NewTrack {
                        album_id: album.id,
                        artist_id: artist.id,
                        genre_id: genre.id,
                        title: title.to_string(),
                        duration: 200,
                        file_path: None,
                    })
                    .expect("Failed to seed track"),
            )
            .id
        })
        .collect();

    SeededData {
        user_id,
        admin_id,
        artist_id: artist.id,
        genre_id: genre.id,
        album_id: album.id,
        track_ids,
    }
}
