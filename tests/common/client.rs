//! Test WebSocket client.
//!
//! Sends [`ClientFrame`]s and asserts on received [`ServerFrame`]s.

#![allow(dead_code)]

use canvas_proto::{ClientFrame, ServerFrame};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// A test client speaking the hub protocol.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
        Ok(Self { ws })
    }

    /// Send a frame.
    pub async fn send(&mut self, frame: &ClientFrame) -> anyhow::Result<()> {
        let json = serde_json::to_string(frame)?;
        self.ws.send(WsMessage::Text(json)).await?;
        Ok(())
    }

    /// Send a raw text payload (for malformed-input tests).
    pub async fn send_raw(&mut self, text: &str) -> anyhow::Result<()> {
        self.ws.send(WsMessage::Text(text.to_string())).await?;
        Ok(())
    }

    /// Receive a single frame, skipping transport-level ping/pong.
    pub async fn recv(&mut self) -> anyhow::Result<ServerFrame> {
        self.recv_timeout(Duration::from_secs(15)).await
    }

    /// Receive a frame with a timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<ServerFrame> {
        let deadline = tokio::time::Instant::now() + dur;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let message = timeout(remaining, self.ws.next())
                .await
                .map_err(|_| anyhow::anyhow!("timed out waiting for a frame"))?;
            match message {
                Some(Ok(WsMessage::Text(text))) => {
                    return serde_json::from_str(&text)
                        .map_err(|e| anyhow::anyhow!("unparseable frame {text:?}: {e}"));
                }
                Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
                Some(Ok(WsMessage::Close(_))) | None => {
                    anyhow::bail!("connection closed while waiting for a frame")
                }
                Some(Ok(other)) => anyhow::bail!("unexpected message: {other:?}"),
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Assert that no frame arrives within the window.
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        match self.recv_timeout(dur).await {
            Ok(frame) => anyhow::bail!("expected silence, got {frame:?}"),
            Err(_) => Ok(()),
        }
    }

    /// Receive frames until the predicate matches, returning everything seen.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<ServerFrame>>
    where
        F: FnMut(&ServerFrame) -> bool,
    {
        let mut frames = Vec::new();
        loop {
            let frame = self.recv().await?;
            let done = predicate(&frame);
            frames.push(frame);
            if done {
                break;
            }
        }
        Ok(frames)
    }

    /// Authenticate as a seeded user; returns the assigned color.
    pub async fn authenticate(&mut self, user_id: &str) -> anyhow::Result<String> {
        self.send(&ClientFrame::Auth {
            token: super::make_token(user_id),
        })
        .await?;
        match self.recv().await? {
            ServerFrame::AuthSuccess {
                user_id: id,
                user_color,
                ..
            } => {
                anyhow::ensure!(id == user_id, "authenticated as unexpected user {id}");
                Ok(user_color)
            }
            other => anyhow::bail!("expected auth:success, got {other:?}"),
        }
    }

    /// Join a space and drain the confirmation and peer list.
    /// Returns the `users:list` contents.
    pub async fn join(&mut self, space_id: &str) -> anyhow::Result<Vec<canvas_proto::PeerInfo>> {
        self.send(&ClientFrame::SpaceJoin {
            space_id: space_id.to_string(),
        })
        .await?;
        match self.recv().await? {
            ServerFrame::SpaceJoined { space_id: id, .. } => {
                anyhow::ensure!(id == space_id, "joined unexpected space {id}");
            }
            other => anyhow::bail!("expected space:joined, got {other:?}"),
        }
        match self.recv().await? {
            ServerFrame::UsersList { users } => Ok(users),
            other => anyhow::bail!("expected users:list, got {other:?}"),
        }
    }

    /// Close the transport.
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
