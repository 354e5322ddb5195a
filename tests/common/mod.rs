use reqwest::Client;
use serde_json::{json, Value};

pub const BASE_URL: &str = "http://localhost:8000";

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Build a URL for an API endpoint.
pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

/// Create a game and return the response body.
pub async fn create_game(client: &Client, color: &str, difficulty: u8) -> Value {
    let resp = client
        .post(url("/api/games"))
        .json(&json!({ "color": color, "difficulty": difficulty }))
        .send()
        .await
        .expect("Failed to send create game request");
    assert_eq!(resp.status(), 200, "create game failed");
    resp.json().await.expect("Invalid create game body")
}
