//! Shared constants for end-to-end tests
//!
//! When test data changes (credentials, seeded catalog names), update only
//! this file.

// ============================================================================
// Test user credentials
// ============================================================================

pub const TEST_USER_NAME: &str = "Test Listener";
pub const TEST_USER_EMAIL: &str = "listener@test.com";
pub const TEST_USER_PASS: &str = "testpass123";

pub const ADMIN_NAME: &str = "Test Admin";
pub const ADMIN_EMAIL: &str = "admin@test.com";
pub const ADMIN_PASS: &str = "adminpass123";

/// Signing secret shared between the spawned server and tests that need to
/// mint their own tokens.
pub const TEST_JWT_SECRET: &str = "e2e-test-secret";

// ============================================================================
// Seeded catalog
// ============================================================================

pub const ARTIST_NAME: &str = "The Test Band";
pub const GENRE_NAME: &str = "Rock";
pub const ALBUM_TITLE: &str = "First Album";
pub const TRACK_TITLES: [&str; 3] = ["Opening Track", "Middle Track", "Closing Track"];

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5_000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;
pub const REQUEST_TIMEOUT_SECS: u64 = 5;
