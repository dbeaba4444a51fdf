//! HTTP client for end-to-end tests
//!
//! Thin wrapper around reqwest that remembers the base URL and attaches the
//! bearer token when one is set.

use super::constants::*;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl TestClient {
    /// Unauthenticated client.
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");
        Self {
            client,
            base_url: base_url.to_string(),
            token: None,
        }
    }

    /// Client logged in as the seeded regular user.
    pub async fn authenticated(base_url: &str) -> Self {
        let mut client = Self::new(base_url);
        client.login(TEST_USER_EMAIL, TEST_USER_PASS).await;
        client
    }

    /// Client logged in as the seeded admin.
    pub async fn authenticated_admin(base_url: &str) -> Self {
        let mut client = Self::new(base_url);
        client.login(ADMIN_EMAIL, ADMIN_PASS).await;
        client
    }

    /// Logs in and stores the session token. Panics if the credentials are
    /// rejected.
    pub async fn login(&mut self, email: &str, password: &str) {
        let response = self
            .post_json(
                "/api/auth/login",
                &serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(
            response.status(),
            200,
            "Login failed for {}",
            email
        );
        let body: Value = response.json().await.expect("Login response was not JSON");
        let token = body["token"]
            .as_str()
            .expect("Login response had no token")
            .to_string();
        self.token = Some(token);
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.with_auth(self.client.get(format!("{}{}", self.base_url, path)))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> reqwest::Response {
        self.with_auth(self.client.post(format!("{}{}", self.base_url, path)))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn post(&self, path: &str) -> reqwest::Response {
        self.with_auth(self.client.post(format!("{}{}", self.base_url, path)))
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn put_json<B: Serialize>(&self, path: &str, body: &B) -> reqwest::Response {
        self.with_auth(self.client.put(format!("{}{}", self.base_url, path)))
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.with_auth(self.client.delete(format!("{}{}", self.base_url, path)))
            .send()
            .await
            .expect("DELETE request failed")
    }
}
