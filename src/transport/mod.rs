//! Realtime Transport Layer
//!
//! Owns the one persistent bidirectional connection to the chat backend.
//! A background task holds the WebSocket stream; the [`ChatTransport`]
//! handle talks to it over a command channel, so the connection is an
//! explicitly constructed, injectable object with an `connect`/`teardown`
//! lifecycle rather than process-wide state.
//!
//! Inbound frames are decoded into [`ServerEvent`] and fanned out over a
//! `tokio::sync::broadcast` channel: any number of synchronizers can
//! subscribe concurrently, and dropping a receiver detaches only that
//! subscriber. Connection status (`true`/`false`) is published on a
//! `watch` channel.
//!
//! Delivery contract: `emit` is fire-and-forget. While disconnected the
//! event is dropped and the optional ack reports the failure; nothing is
//! queued beyond one in-flight connect attempt. Reconnection uses bounded
//! exponential backoff (see [`backoff`]) and stops after the attempt
//! ceiling until an explicit `connect()`.
//!
//! Messages that reach the server while this client is disconnected are
//! not back-filled on reconnect; the server nudges a full list refresh via
//! `refetchConversation` instead.

pub mod backoff;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::shared::config::ChatConfig;
use crate::shared::error::ChatError;
use crate::shared::event::{ClientEvent, ServerEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity of the server-event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the handle-to-task command channel
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Commands sent from the public handle to the background connection task
enum TransportCmd {
    Connect,
    Disconnect,
    Emit {
        event: ClientEvent,
        ack: Option<oneshot::Sender<Result<(), ChatError>>>,
    },
    Shutdown,
}

/// Handle to the realtime connection.
///
/// Cloning shares the same underlying connection; the background task shuts
/// down when [`ChatTransport::teardown`] is called or every handle is
/// dropped. Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct ChatTransport {
    cmd_tx: mpsc::Sender<TransportCmd>,
    events_tx: broadcast::Sender<ServerEvent>,
    status_rx: watch::Receiver<bool>,
}

impl ChatTransport {
    /// Create the connection manager. No socket is opened until
    /// [`ChatTransport::connect`] is called.
    pub fn new(config: ChatConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(false);
        let events = events_tx.clone();
        tokio::spawn(async move {
            connection_task(cmd_rx, config, events, status_tx).await;
        });
        Self {
            cmd_tx,
            events_tx,
            status_rx,
        }
    }

    /// Open the connection. Idempotent: a no-op while already connected.
    /// During backoff this forces an immediate retry.
    pub async fn connect(&self) {
        let _ = self.cmd_tx.send(TransportCmd::Connect).await;
    }

    /// Close the connection and cancel any pending reconnect.
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(TransportCmd::Disconnect).await;
    }

    /// Fire-and-forget emit. While disconnected the event is dropped.
    pub async fn emit(&self, event: ClientEvent) {
        self.send_emit(event, None).await;
    }

    /// Emit with a delivery-failure ack: the returned channel resolves
    /// `Ok(())` once the frame was written to the socket, or the error
    /// that prevented delivery.
    pub async fn emit_with_ack(
        &self,
        event: ClientEvent,
    ) -> oneshot::Receiver<Result<(), ChatError>> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send_emit(event, Some(ack_tx)).await;
        ack_rx
    }

    async fn send_emit(
        &self,
        event: ClientEvent,
        ack: Option<oneshot::Sender<Result<(), ChatError>>>,
    ) {
        if let Err(mpsc::error::SendError(cmd)) =
            self.cmd_tx.send(TransportCmd::Emit { event, ack }).await
        {
            tracing::warn!("[transport] emit dropped: connection task is gone");
            if let TransportCmd::Emit { ack: Some(ack), .. } = cmd {
                let _ = ack.send(Err(ChatError::transport("connection task terminated")));
            }
        }
    }

    /// Subscribe to inbound server events. Each receiver sees every event;
    /// dropping it detaches only that subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events_tx.subscribe()
    }

    /// Observe connection status (`true` = connected).
    pub fn status(&self) -> watch::Receiver<bool> {
        self.status_rx.clone()
    }

    /// Whether the socket is currently open.
    pub fn is_connected(&self) -> bool {
        *self.status_rx.borrow()
    }

    /// Tear the connection down for good, ending the background task.
    /// Tied to the user session lifecycle.
    pub async fn teardown(&self) {
        let _ = self.cmd_tx.send(TransportCmd::Shutdown).await;
    }
}

/// Open the WebSocket, attaching the session credential.
async fn establish(config: &ChatConfig) -> Result<WsStream, ChatError> {
    let mut request = config
        .socket_url()
        .into_client_request()
        .map_err(|e| ChatError::transport(format!("invalid socket URL: {}", e)))?;
    if let Some(token) = config.token() {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ChatError::transport(format!("invalid auth token: {}", e)))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }
    let (stream, _response) = connect_async(request)
        .await
        .map_err(|e| ChatError::transport(format!("connect failed: {}", e)))?;
    Ok(stream)
}

/// The background task owning the WebSocket stream.
///
/// Lifecycle: idle until a `Connect` command, then an event loop
/// multiplexing inbound frames and commands. On unexpected close it enters
/// bounded-backoff reconnection; after the attempt ceiling it returns to
/// idle until the next explicit `Connect`.
async fn connection_task(
    mut cmd_rx: mpsc::Receiver<TransportCmd>,
    config: ChatConfig,
    events_tx: broadcast::Sender<ServerEvent>,
    status_tx: watch::Sender<bool>,
) {
    let mut ws: Option<WsStream> = None;
    let mut reconnecting = false;
    let mut attempt: u32 = 0;

    loop {
        if let Some(stream) = ws.as_mut() {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(TransportCmd::Connect) => {
                        // Already connected; idempotent no-op.
                    }
                    Some(TransportCmd::Disconnect) => {
                        let _ = stream.close(None).await;
                        ws = None;
                        reconnecting = false;
                        attempt = 0;
                        let _ = status_tx.send(false);
                        tracing::info!("[transport] disconnected");
                    }
                    Some(TransportCmd::Emit { event, ack }) => {
                        match serde_json::to_string(&event) {
                            Ok(frame) => match stream.send(Message::Text(frame)).await {
                                Ok(()) => {
                                    if let Some(ack) = ack {
                                        let _ = ack.send(Ok(()));
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("[transport] send failed: {}", e);
                                    if let Some(ack) = ack {
                                        let _ = ack.send(Err(ChatError::transport(e.to_string())));
                                    }
                                    ws = None;
                                    reconnecting = true;
                                    attempt = 0;
                                    let _ = status_tx.send(false);
                                }
                            },
                            Err(e) => {
                                if let Some(ack) = ack {
                                    let _ = ack.send(Err(e.into()));
                                }
                            }
                        }
                    }
                    Some(TransportCmd::Shutdown) | None => {
                        let _ = stream.close(None).await;
                        let _ = status_tx.send(false);
                        return;
                    }
                },
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(event) => {
                                // An error here only means no subscribers right now.
                                let _ = events_tx.send(event);
                            }
                            Err(e) => {
                                tracing::debug!("[transport] ignoring unrecognized frame: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = stream.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::warn!("[transport] connection closed by server");
                        ws = None;
                        reconnecting = true;
                        attempt = 0;
                        let _ = status_tx.send(false);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("[transport] socket error: {}", e);
                        ws = None;
                        reconnecting = true;
                        attempt = 0;
                        let _ = status_tx.send(false);
                    }
                }
            }
        } else if reconnecting {
            attempt += 1;
            let Some(delay) = backoff::reconnect_delay(attempt) else {
                tracing::warn!(
                    "[transport] giving up after {} reconnect attempts",
                    backoff::MAX_ATTEMPTS
                );
                reconnecting = false;
                attempt = 0;
                continue;
            };
            tracing::info!(
                "[transport] reconnecting in {}ms (attempt {})",
                delay.as_millis(),
                attempt
            );

            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);
            let mut cancelled = false;
            let mut shutdown = false;
            loop {
                tokio::select! {
                    _ = &mut sleep => break,
                    cmd = cmd_rx.recv() => match cmd {
                        Some(TransportCmd::Connect) => break, // retry now
                        Some(TransportCmd::Disconnect) => {
                            cancelled = true;
                            break;
                        }
                        Some(TransportCmd::Emit { ack, .. }) => {
                            tracing::debug!("[transport] emit dropped while reconnecting");
                            if let Some(ack) = ack {
                                let _ = ack.send(Err(ChatError::NotConnected));
                            }
                        }
                        Some(TransportCmd::Shutdown) | None => {
                            shutdown = true;
                            break;
                        }
                    }
                }
            }
            if shutdown {
                return;
            }
            if cancelled {
                reconnecting = false;
                attempt = 0;
                continue;
            }

            match establish(&config).await {
                Ok(stream) => {
                    ws = Some(stream);
                    reconnecting = false;
                    attempt = 0;
                    let _ = status_tx.send(true);
                    tracing::info!("[transport] reconnected");
                }
                Err(e) => {
                    tracing::warn!("[transport] reconnect attempt {} failed: {}", attempt, e);
                }
            }
        } else {
            // Idle: no socket, no retry armed.
            match cmd_rx.recv().await {
                Some(TransportCmd::Connect) => match establish(&config).await {
                    Ok(stream) => {
                        ws = Some(stream);
                        attempt = 0;
                        let _ = status_tx.send(true);
                        tracing::info!("[transport] connected");
                    }
                    Err(e) => {
                        tracing::warn!("[transport] connect failed: {}", e);
                        reconnecting = true;
                        attempt = 0;
                    }
                },
                Some(TransportCmd::Disconnect) => {}
                Some(TransportCmd::Emit { ack, .. }) => {
                    tracing::debug!("[transport] emit dropped while disconnected");
                    if let Some(ack) = ack {
                        let _ = ack.send(Err(ChatError::NotConnected));
                    }
                }
                Some(TransportCmd::Shutdown) | None => return,
            }
        }
    }
}
