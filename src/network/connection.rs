//! Connection - handles an individual client session.
//!
//! Each Connection runs in its own tokio task driving a single
//! `tokio::select!` loop over three sources:
//!
//! - the WebSocket stream (inbound frames, pong receipts, close)
//! - the session's outbound queue (broadcast frames, probes, forced close)
//! - the server shutdown signal
//!
//! Inbound frames are processed strictly in arrival order; outbound writes
//! all go through the one queue, so sequences emitted by the state machine
//! reach the client in emission order.
//!
//! The task ends when the socket closes, the queue's senders are dropped
//! (the disconnect path), or shutdown is signaled. Either way the exit runs
//! the same cleanup as a clean disconnect.

use crate::error::HandlerError;
use crate::handlers::{Context, Registry, SessionState};
use crate::metrics;
use crate::state::{Hub, Outbound, encode_frame};
use canvas_proto::ClientFrame;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info};
use uuid::Uuid;

/// A client connection handler.
pub struct Connection {
    session_id: Uuid,
    addr: SocketAddr,
    hub: Arc<Hub>,
    registry: Arc<Registry>,
}

impl Connection {
    pub fn new(session_id: Uuid, addr: SocketAddr, hub: Arc<Hub>, registry: Arc<Registry>) -> Self {
        Self {
            session_id,
            addr,
            hub,
            registry,
        }
    }

    /// Perform the WebSocket upgrade and run the session loop to completion.
    pub async fn run(self, stream: TcpStream) -> anyhow::Result<()> {
        let ws = tokio_tungstenite::accept_async(stream).await?;
        self.run_session(ws).await;
        Ok(())
    }

    async fn run_session(self, mut ws: WebSocketStream<TcpStream>) {
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outbound>(self.hub.outbound_queue);
        self.hub.register_session(self.session_id, outbound_tx.clone());

        let mut state = SessionState::default();
        let mut shutdown_rx = self.hub.lifecycle.shutdown_tx.subscribe();

        info!(session = %self.session_id, addr = %self.addr, "Connection open");

        loop {
            tokio::select! {
                inbound = ws.next() => match inbound {
                    Some(Ok(WsMessage::Text(text))) => {
                        metrics::FRAMES_RECEIVED.inc();
                        match serde_json::from_str::<ClientFrame>(&text) {
                            Ok(frame) => {
                                let mut ctx = Context {
                                    session_id: self.session_id,
                                    hub: &self.hub,
                                    state: &mut state,
                                    remote_addr: self.addr,
                                    outbound: &outbound_tx,
                                };
                                self.registry.dispatch(&mut ctx, &frame).await;
                            }
                            Err(e) => {
                                let error = HandlerError::Malformed(e.to_string());
                                debug!(session = %self.session_id, error = %error, "Malformed frame");
                                metrics::record_frame_error("unknown", error.error_code());
                                if let Some(reply) = error.to_error_frame()
                                    && let Some(json) = encode_frame(&reply)
                                {
                                    let _ = outbound_tx.try_send(Outbound::Frame(json));
                                }
                            }
                        }
                    }
                    Some(Ok(WsMessage::Pong(_))) => {
                        self.hub.mark_alive(self.session_id);
                    }
                    // Pings are answered by the transport layer itself
                    Some(Ok(WsMessage::Ping(_))) => {}
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Binary and raw frames are not part of the protocol
                        debug!(session = %self.session_id, "Ignoring non-text frame");
                    }
                    Some(Err(e)) => {
                        debug!(session = %self.session_id, error = %e, "WebSocket error");
                        break;
                    }
                },

                outbound = outbound_rx.recv() => match outbound {
                    Some(Outbound::Frame(json)) => {
                        if ws.send(WsMessage::Text((*json).clone())).await.is_err() {
                            break;
                        }
                        metrics::FRAMES_SENT.inc();
                    }
                    Some(Outbound::Ping) => {
                        if ws.send(WsMessage::Ping(Vec::new())).await.is_err() {
                            break;
                        }
                    }
                    // Senders dropped or forced close: either way we are done
                    Some(Outbound::Close) | None => {
                        let _ = ws.send(WsMessage::Close(None)).await;
                        break;
                    }
                },

                _ = shutdown_rx.recv() => {
                    info!(session = %self.session_id, "Shutdown signal received - closing connection");
                    let _ = ws.send(WsMessage::Close(None)).await;
                    break;
                }
            }
        }

        // Same path as a clean disconnect; a no-op when the liveness monitor
        // or a replacement auth already tore this session down.
        self.hub
            .disconnect_session(self.session_id, "connection closed");

        info!(session = %self.session_id, addr = %self.addr, "Connection closed");
    }
}
