//! Transport-agnostic WebSocket sink owned by a progress actor.
//!
//! The axum adapter wraps the real socket's send half in this trait; actor
//! tests use the channel-backed double below. The actor only ever holds one
//! of these at a time.

use async_trait::async_trait;
use thiserror::Error;

/// Close code for a normal closure (including supersession).
pub const CLOSE_NORMAL: u16 = 1000;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SocketError {
    /// The peer is gone; the actor drops the socket on this.
    #[error("socket closed")]
    Closed,
}

/// Send half of a progress WebSocket.
#[async_trait]
pub trait ProgressSocket: Send {
    async fn send_text(&mut self, text: String) -> Result<(), SocketError>;

    /// Best-effort close frame; errors are ignored (the peer may already
    /// be gone).
    async fn close(&mut self, code: u16, reason: &str);
}

/// Test doubles for the socket trait, shared with downstream crates' tests.
pub mod testing {
    use super::{ProgressSocket, SocketError};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    /// What a test client observed on its socket.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum SocketEvent {
        Text(String),
        Closed { code: u16, reason: String },
    }

    /// Channel-backed socket double. The receiver side plays the client.
    pub struct ChannelSocket {
        tx: mpsc::UnboundedSender<SocketEvent>,
        open: bool,
    }

    impl ChannelSocket {
        pub fn pair() -> (Self, mpsc::UnboundedReceiver<SocketEvent>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Self { tx, open: true }, rx)
        }
    }

    #[async_trait]
    impl ProgressSocket for ChannelSocket {
        async fn send_text(&mut self, text: String) -> Result<(), SocketError> {
            if !self.open || self.tx.send(SocketEvent::Text(text)).is_err() {
                return Err(SocketError::Closed);
            }
            Ok(())
        }

        async fn close(&mut self, code: u16, reason: &str) {
            let _ = self.tx.send(SocketEvent::Closed { code, reason: reason.to_string() });
            self.open = false;
        }
    }

    /// Drain every already-delivered event from a client receiver.
    pub fn drain(rx: &mut mpsc::UnboundedReceiver<SocketEvent>) -> Vec<SocketEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Convenience: parse every text frame in `events` as JSON.
    pub fn json_frames(events: &[SocketEvent]) -> Vec<serde_json::Value> {
        events
            .iter()
            .filter_map(|event| match event {
                SocketEvent::Text(text) => serde_json::from_str(text).ok(),
                SocketEvent::Closed { .. } => None,
            })
            .collect()
    }
}
