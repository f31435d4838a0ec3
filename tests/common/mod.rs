//! Integration test common infrastructure.
//!
//! Provides utilities for spawning hub instances, creating WebSocket test
//! clients, and minting credentials for the seeded users.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
pub use server::TestServer;

use serde::Serialize;

/// Shared secret every test server is configured with.
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

#[derive(Serialize)]
struct Claims {
    sub: String,
    exp: i64,
}

/// Mint a valid bearer token for a seeded user.
pub fn make_token(user_id: &str) -> String {
    let exp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64
        + 3600;
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Claims {
            sub: user_id.to_string(),
            exp,
        },
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("token encoding")
}

/// Mint a token that expired long before the validation leeway.
#[allow(dead_code)]
pub fn make_expired_token(user_id: &str) -> String {
    let exp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64
        - 7200;
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Claims {
            sub: user_id.to_string(),
            exp,
        },
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("token encoding")
}

/// Pick an ephemeral port by binding and releasing it.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("Failed to get addr").port();
    drop(listener);
    port
}
