//! Dashboard bridge: fans position updates out to WebSocket listeners.
//!
//! Frames go through a `broadcast` channel; every listener task holds its own
//! receiver, so a slow or broken listener never holds up the others.

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::telemetry::Telemetry;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One dashboard update: `{"tempo": t, "deslocamento": x}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashboardFrame {
    pub tempo: f64,
    pub deslocamento: f64,
}

impl DashboardFrame {
    pub fn from_telemetry(sample: &Telemetry) -> Self {
        Self { tempo: sample.tick as f64, deslocamento: sample.position }
    }

    /// Parse a position payload seen on the broker.
    ///
    /// Accepts a bare number (stamped with `tick`) or the legacy
    /// `Tempo: <t>, Deslocamento: <x>` line, which carries its own time.
    pub fn parse_payload(topic: &str, payload: &str, tick: u64) -> Result<Self> {
        let text = payload.trim();
        if let Ok(x) = text.parse::<f64>() {
            return finite(topic, payload, tick as f64, x);
        }

        let mut fields = text.split(',');
        let (Some(t), Some(x), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(Error::malformed(topic, payload, "expected a number or 'Tempo: t, Deslocamento: x'"));
        };
        let tempo = labelled(topic, payload, t, "tempo")?;
        let deslocamento = labelled(topic, payload, x, "deslocamento")?;
        finite(topic, payload, tempo, deslocamento)
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({ "tempo": self.tempo, "deslocamento": self.deslocamento }).to_string()
    }
}

fn labelled(topic: &str, payload: &str, field: &str, label: &str) -> Result<f64> {
    let (name, value) = field
        .split_once(':')
        .ok_or_else(|| Error::malformed(topic, payload, format!("missing '{label}:'")))?;
    if !name.trim().eq_ignore_ascii_case(label) {
        return Err(Error::malformed(topic, payload, format!("expected '{label}', got '{}'", name.trim())));
    }
    value
        .trim()
        .parse()
        .map_err(|_| Error::malformed(topic, payload, format!("{label} is not a number")))
}

fn finite(topic: &str, payload: &str, tempo: f64, deslocamento: f64) -> Result<DashboardFrame> {
    if tempo.is_finite() && deslocamento.is_finite() {
        Ok(DashboardFrame { tempo, deslocamento })
    } else {
        Err(Error::malformed(topic, payload, "non-finite value"))
    }
}

// ---------------------------------------------------------------------------
// Fan-out hub
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Bridge {
    tx: broadcast::Sender<DashboardFrame>,
}

impl Bridge {
    /// `capacity` frames are buffered per listener before it starts skipping.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Sender half, for handing to the telemetry publisher.
    pub fn sender(&self) -> broadcast::Sender<DashboardFrame> {
        self.tx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardFrame> {
        self.tx.subscribe()
    }

    /// Returns the number of listeners that will see the frame.
    pub fn publish(&self, frame: DashboardFrame) -> usize {
        self.tx.send(frame).unwrap_or(0)
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

// ---------------------------------------------------------------------------
// Listener side
// ---------------------------------------------------------------------------

/// Where a listener's frames go. Returns false once the peer is gone.
pub trait FrameSink: Send {
    fn send_text(&mut self, text: String) -> impl Future<Output = bool> + Send;
}

impl FrameSink for SplitSink<WebSocket, Message> {
    fn send_text(&mut self, text: String) -> impl Future<Output = bool> + Send {
        async move { self.send(Message::Text(text)).await.is_ok() }
    }
}

/// Push every frame from `rx` into `sink` until the sink fails or the bridge
/// is dropped. Lagging skips the missed frames.
pub async fn forward_frames<S: FrameSink>(mut sink: S, mut rx: broadcast::Receiver<DashboardFrame>) {
    loop {
        match rx.recv().await {
            Ok(frame) => {
                if !sink.send_text(frame.to_json()).await {
                    debug!("dashboard listener send failed");
                    return;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!(skipped = n, "dashboard listener lagging")
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP / WebSocket server
// ---------------------------------------------------------------------------

pub fn router(bridge: Bridge) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(bridge)
}

async fn health() -> &'static str {
    "ok"
}

async fn ws_handler(ws: WebSocketUpgrade, State(bridge): State<Bridge>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_listener(socket, bridge))
}

async fn handle_listener(socket: WebSocket, bridge: Bridge) {
    let (sink, mut stream) = socket.split();
    let forward = forward_frames(sink, bridge.subscribe());
    tokio::pin!(forward);
    info!(listeners = bridge.listener_count(), "dashboard listener connected");

    loop {
        tokio::select! {
            _ = &mut forward => break,
            msg = stream.next() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                _ => {} // listener input is ignored
            },
        }
    }

    debug!("dashboard listener disconnected");
}

/// Serve the dashboard on `bind` until `shutdown` flips to true.
pub async fn serve(bind: SocketAddr, bridge: Bridge, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("dashboard listening on ws://{bind}/ws");

    axum::serve(listener, router(bridge))
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            debug!("dashboard shutting down");
        })
        .await?;
    Ok(())
}
