//! Test server management.
//!
//! Spawns and manages canvasd instances for integration testing, with a
//! seeded identity database.
//!
//! Seeded users: `u-alice` (Alice), `u-bob` (Bob), `u-carol` (Carol).
//! Seeded spaces:
//! - `design-room`: private, owned by alice, bob on the member list
//! - `vault`: private, owned by carol, no members

#![allow(dead_code)]

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// A test server instance.
pub struct TestServer {
    child: Child,
    port: u16,
    data_dir: TempDir,
}

impl TestServer {
    /// Spawn a test server on the given port with the default 30s heartbeat.
    pub async fn spawn(port: u16) -> anyhow::Result<Self> {
        Self::spawn_with_heartbeat(port, 30).await
    }

    /// Spawn a test server with a custom heartbeat period.
    pub async fn spawn_with_heartbeat(port: u16, heartbeat_secs: u64) -> anyhow::Result<Self> {
        let data_dir = TempDir::new()?;
        let db_path = data_dir.path().join("hub.db");

        seed_database(&db_path).await?;

        let config_path = data_dir.path().join("config.toml");
        let config_content = format!(
            r#"
[server]
listen = "127.0.0.1:{port}"
metrics_port = 0
heartbeat_interval_secs = {heartbeat_secs}

[auth]
token_secret = "{secret}"

[database]
path = "{db}"
"#,
            port = port,
            heartbeat_secs = heartbeat_secs,
            secret = super::TEST_SECRET,
            db = db_path.display(),
        );
        std::fs::write(&config_path, config_content)?;

        // Build path to the canvasd binary (in workspace target dir)
        let cargo_manifest_dir = env!("CARGO_MANIFEST_DIR");
        let binary_path = PathBuf::from(cargo_manifest_dir).join("target/debug/canvasd");

        let child = Command::new(&binary_path)
            .arg(config_path.to_str().expect("utf-8 config path"))
            .spawn()?;

        let server = Self {
            child,
            port,
            data_dir,
        };

        server.wait_until_ready().await?;
        Ok(server)
    }

    /// The port the server listens on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// WebSocket url of the hub endpoint.
    pub fn url(&self) -> String {
        format!("ws://127.0.0.1:{}/", self.port)
    }

    /// Connect a new test client to this server.
    pub async fn connect(&self) -> anyhow::Result<super::TestClient> {
        super::TestClient::connect(&self.url()).await
    }

    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        let addr = format!("127.0.0.1:{}", self.port);
        for _ in 0..100 {
            if tokio::net::TcpStream::connect(&addr).await.is_ok() {
                return Ok(());
            }
            sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not start listening on {}", addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Create the schema and seed identities before the server starts.
async fn seed_database(path: &std::path::Path) -> anyhow::Result<()> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id      TEXT PRIMARY KEY,
            name    TEXT NOT NULL,
            email   TEXT NOT NULL,
            picture TEXT
        )",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS spaces (
            id        TEXT PRIMARY KEY,
            name      TEXT NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 0,
            owner_id  TEXT NOT NULL
        )",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS space_members (
            space_id TEXT NOT NULL,
            user_id  TEXT NOT NULL,
            PRIMARY KEY (space_id, user_id)
        )",
    )
    .execute(&pool)
    .await?;

    for (id, name, email, picture) in [
        ("u-alice", "Alice", "alice@example.com", Some("https://cdn.example.com/alice.png")),
        ("u-bob", "Bob", "bob@example.com", None),
        ("u-carol", "Carol", "carol@example.com", None),
    ] {
        sqlx::query("INSERT INTO users (id, name, email, picture) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(email)
            .bind(picture)
            .execute(&pool)
            .await?;
    }

    sqlx::query("INSERT INTO spaces (id, name, is_public, owner_id) VALUES (?, ?, ?, ?)")
        .bind("design-room")
        .bind("Design Room")
        .bind(false)
        .bind("u-alice")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO spaces (id, name, is_public, owner_id) VALUES (?, ?, ?, ?)")
        .bind("vault")
        .bind("Vault")
        .bind(false)
        .bind("u-carol")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO space_members (space_id, user_id) VALUES (?, ?)")
        .bind("design-room")
        .bind("u-bob")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
