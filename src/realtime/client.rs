//! Realtime notification client and its connection event loop.
//!
//! One [`RealtimeClient`] owns one logical connection to the notification
//! server. Each successful dial spawns a tokio event-loop task that handles:
//!
//! - Incoming messages (state transitions + listener dispatch, in arrival
//!   order)
//! - Outgoing messages from the thin senders (`join_room`, ...)
//! - The heartbeat interval (pings while Ready)
//!
//! # Reconnection
//!
//! An unclean transport loss schedules a retry on an exponential backoff
//! (see [`ReconnectPolicy`]). Every scheduled piece of work carries the
//! generation number it was created under; [`RealtimeClient::disconnect`]
//! bumps the generation and aborts the pending timer, so a timer that
//! already fired finds itself superseded and does nothing. That closes the
//! race between a fired reconnect and a concurrent manual disconnect.

// ============================================================================
// Imports
// ============================================================================

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, to_string};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, trace, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::identifiers::{ConnectionId, RoomId, UserId};
use crate::protocol::{ClientMessage, ParsedMessage, ServerMessage};

use super::backoff::ReconnectPolicy;
use super::credentials::{KeyValueStorage, StoredCredentials};
use super::endpoint::{Endpoint, PageOrigin};
use super::listeners::{ListenerCallback, ListenerRegistry};
use super::state::ConnectionState;

// ============================================================================
// Constants
// ============================================================================

/// Default heartbeat interval while Ready.
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Listener channel for exhausted reconnect attempts.
pub const CONNECTION_FAILED_EVENT: &str = "connection_failed";

/// Listener channel for unrecognized inbound message types.
pub const UNKNOWN_MESSAGE_EVENT: &str = "unknown_message";

// ============================================================================
// Types
// ============================================================================

/// The concrete transport stream produced by `connect_async`.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Authentication verdict callback.
///
/// Invoked with `true` on auth success, `false` on rejection. Rejection is
/// surfaced exactly once per occurrence; the client never retries with the
/// same credentials on its own.
pub type AuthHandler = Arc<dyn Fn(bool) + Send + Sync>;

/// Internal commands for the event loop.
enum LoopCommand {
    /// Serialize and send a message.
    Send(ClientMessage),
    /// Close the transport with a normal close code.
    Shutdown,
}

// ============================================================================
// RealtimeClientBuilder
// ============================================================================

/// Builder for [`RealtimeClient`].
///
/// # Example
///
/// ```
/// use pledgeboard_client::realtime::{PageOrigin, RealtimeClient};
///
/// # fn main() -> pledgeboard_client::Result<()> {
/// let origin = PageOrigin::parse("https://pledgeboard.example")?;
/// let client = RealtimeClient::builder()
///     .page_origin(&origin)
///     .build()?;
/// assert!(client.state().to_string().contains("disconnected"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RealtimeClientBuilder {
    endpoint: Option<Endpoint>,
    heartbeat_interval: Duration,
    policy: ReconnectPolicy,
}

impl Default for RealtimeClientBuilder {
    fn default() -> Self {
        Self {
            endpoint: None,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            policy: ReconnectPolicy::default(),
        }
    }
}

impl RealtimeClientBuilder {
    /// Derives the endpoint from the hosting page's origin.
    #[must_use]
    pub fn page_origin(mut self, origin: &PageOrigin) -> Self {
        self.endpoint = Some(Endpoint::from_origin(origin));
        self
    }

    /// Sets an explicit endpoint (tests, staging).
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Overrides the heartbeat interval.
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Overrides the reconnect policy.
    #[must_use]
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no endpoint was configured.
    pub fn build(self) -> Result<RealtimeClient> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::config("endpoint not configured; set page_origin or endpoint"))?;

        Ok(RealtimeClient {
            inner: Arc::new(ClientInner {
                uuid: Uuid::new_v4(),
                endpoint,
                heartbeat_interval: self.heartbeat_interval,
                policy: self.policy,
                listeners: ListenerRegistry::new(),
                auth_handler: Mutex::new(None),
                state: Mutex::new(ConnectionState::Disconnected),
                attempts: AtomicU32::new(0),
                generation: AtomicU64::new(0),
                credentials: Mutex::new(None),
                connection_id: Mutex::new(None),
                command_tx: Mutex::new(None),
                reconnect_task: Mutex::new(None),
            }),
        })
    }
}

// ============================================================================
// ClientInner
// ============================================================================

/// Shared client state (API handle + event loop + scheduled tasks).
struct ClientInner {
    /// Instance id carried in log events.
    uuid: Uuid,
    /// Resolved notification endpoint.
    endpoint: Endpoint,
    /// Heartbeat interval while Ready.
    heartbeat_interval: Duration,
    /// Reconnect schedule.
    policy: ReconnectPolicy,
    /// Per-event listener sets.
    listeners: ListenerRegistry,
    /// Authentication verdict callback.
    auth_handler: Mutex<Option<AuthHandler>>,
    /// Lifecycle state.
    state: Mutex<ConnectionState>,
    /// Reconnect attempts made since the last Ready (or manual connect).
    attempts: AtomicU32,
    /// Generation counter; bumped by disconnect to supersede scheduled work.
    generation: AtomicU64,
    /// Credentials captured for reconnect reuse.
    credentials: Mutex<Option<StoredCredentials>>,
    /// Server-assigned connection id from the welcome message.
    connection_id: Mutex<Option<ConnectionId>>,
    /// Sender into the live event loop, present while a transport is open.
    command_tx: Mutex<Option<mpsc::UnboundedSender<LoopCommand>>>,
    /// Pending reconnect timer.
    reconnect_task: Mutex<Option<JoinHandle<()>>>,
}

impl ClientInner {
    /// Returns `true` if `generation` has not been superseded.
    #[inline]
    fn is_current(inner: &Arc<Self>, generation: u64) -> bool {
        inner.generation.load(Ordering::SeqCst) == generation
    }

    /// Transitions the lifecycle state.
    fn set_state(inner: &Arc<Self>, state: ConnectionState) {
        let mut guard = inner.state.lock();
        if *guard != state {
            trace!(client = %inner.uuid, from = %*guard, to = %state, "state transition");
            *guard = state;
        }
    }

    /// Dials the endpoint, performs the auth send, and spawns the event loop.
    async fn establish(inner: &Arc<Self>, generation: u64) -> Result<()> {
        if !Self::is_current(inner, generation) {
            return Ok(());
        }
        let credentials = inner
            .credentials
            .lock()
            .clone()
            .ok_or_else(|| Error::config("connect requires stored credentials"))?;

        Self::set_state(inner, ConnectionState::Connecting);
        debug!(client = %inner.uuid, endpoint = %inner.endpoint, "connecting");

        let (mut ws_stream, _response) = connect_async(inner.endpoint.as_str()).await?;

        if !Self::is_current(inner, generation) {
            let _ = ws_stream.close(None).await;
            return Ok(());
        }
        Self::set_state(inner, ConnectionState::AwaitingAuth);

        let auth = ClientMessage::Auth {
            user_id: credentials.user_id,
            token: credentials.token,
        };
        ws_stream.send(Message::Text(to_string(&auth)?.into())).await?;
        trace!(client = %inner.uuid, "auth message sent");

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        *inner.command_tx.lock() = Some(command_tx);
        tokio::spawn(Self::run_event_loop(
            Arc::clone(inner),
            generation,
            ws_stream,
            command_rx,
        ));

        Ok(())
    }

    /// Event loop that handles transport I/O for one connection generation.
    async fn run_event_loop(
        inner: Arc<Self>,
        generation: u64,
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<LoopCommand>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut heartbeat = interval_at(
            Instant::now() + inner.heartbeat_interval,
            inner.heartbeat_interval,
        );
        let mut clean_shutdown = false;

        loop {
            tokio::select! {
                // Incoming messages from the server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming(&inner, generation, &text);
                        }

                        Some(Ok(Message::Close(frame))) => {
                            let normal = frame
                                .as_ref()
                                .is_some_and(|f| f.code == CloseCode::Normal);
                            if normal {
                                debug!(client = %inner.uuid, "transport closed normally");
                                clean_shutdown = true;
                            } else {
                                warn!(client = %inner.uuid, ?frame, "transport closed uncleanly");
                            }
                            break;
                        }

                        Some(Err(e)) => {
                            error!(client = %inner.uuid, error = %e, "transport error");
                            break;
                        }

                        None => {
                            warn!(client = %inner.uuid, "transport stream ended");
                            break;
                        }

                        // Binary, Ping, Pong: control traffic handled by the
                        // protocol layer underneath.
                        _ => {}
                    }
                }

                // Outgoing messages from the client API
                command = command_rx.recv() => {
                    match command {
                        Some(LoopCommand::Send(message)) => {
                            match to_string(&message) {
                                Ok(text) => {
                                    if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                                        error!(client = %inner.uuid, error = %e, "send failed");
                                        break;
                                    }
                                }
                                Err(e) => {
                                    error!(client = %inner.uuid, error = %e, "serialize failed");
                                }
                            }
                        }

                        Some(LoopCommand::Shutdown) => {
                            let frame = CloseFrame {
                                code: CloseCode::Normal,
                                reason: "client disconnect".into(),
                            };
                            let _ = ws_write.send(Message::Close(Some(frame))).await;
                            clean_shutdown = true;
                            break;
                        }

                        None => {
                            clean_shutdown = true;
                            break;
                        }
                    }
                }

                // Heartbeat keep-alive
                _ = heartbeat.tick() => {
                    if inner.state.lock().is_ready() {
                        let ping = ClientMessage::Ping {
                            timestamp: unix_timestamp_ms(),
                        };
                        match to_string(&ping) {
                            Ok(text) => {
                                if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                                    error!(client = %inner.uuid, error = %e, "heartbeat send failed");
                                    break;
                                }
                                trace!(client = %inner.uuid, "heartbeat sent");
                            }
                            Err(e) => {
                                error!(client = %inner.uuid, error = %e, "heartbeat serialize failed");
                            }
                        }
                    }
                }
            }
        }

        if clean_shutdown {
            if Self::is_current(&inner, generation) {
                *inner.command_tx.lock() = None;
                *inner.connection_id.lock() = None;
                Self::set_state(&inner, ConnectionState::Disconnected);
            }
            debug!(client = %inner.uuid, "event loop terminated");
            return;
        }
        if !Self::is_current(&inner, generation) {
            debug!(client = %inner.uuid, "event loop superseded");
            return;
        }

        // Unclean loss of the current connection: fold into the backoff path.
        *inner.command_tx.lock() = None;
        *inner.connection_id.lock() = None;
        Self::handle_connection_loss(&inner, generation);
    }

    /// Handles one inbound text frame: state transitions plus dispatch.
    fn handle_incoming(inner: &Arc<Self>, generation: u64, text: &str) {
        let message = match ServerMessage::parse_str(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(client = %inner.uuid, error = %e, "malformed inbound message discarded");
                return;
            }
        };

        match message.parsed() {
            ParsedMessage::Welcome { connection_id } => {
                debug!(client = %inner.uuid, connection_id, "welcome received");
                *inner.connection_id.lock() = Some(ConnectionId::new(connection_id));
            }

            ParsedMessage::AuthSuccess => {
                if Self::is_current(inner, generation) {
                    Self::set_state(inner, ConnectionState::Ready);
                    inner.attempts.store(0, Ordering::SeqCst);
                    debug!(client = %inner.uuid, "authenticated");
                }
                Self::notify_auth(inner, true);
            }

            parsed if parsed.is_auth_failure() => {
                warn!(client = %inner.uuid, "authentication rejected");
                Self::notify_auth(inner, false);
            }

            ParsedMessage::Pong => {
                trace!(client = %inner.uuid, "heartbeat acknowledged");
            }

            ParsedMessage::PendingNotifications { count } => {
                trace!(client = %inner.uuid, count, "pending notifications received");
            }

            ParsedMessage::Unknown { message_type } => {
                trace!(client = %inner.uuid, message_type, "unrecognized message type");
                inner.listeners.dispatch(UNKNOWN_MESSAGE_EVENT, message.payload());
                return;
            }

            // Notification, room and subscription acks, non-auth errors:
            // listener dispatch below is the whole treatment.
            _ => {}
        }

        inner.listeners.dispatch(message.message_type(), message.payload());
    }

    /// Invokes the auth handler outside any lock, isolating panics.
    fn notify_auth(inner: &Arc<Self>, verdict: bool) {
        let handler = inner.auth_handler.lock().clone();
        if let Some(handler) = handler
            && catch_unwind(AssertUnwindSafe(|| handler(verdict))).is_err()
        {
            error!(client = %inner.uuid, "auth handler panicked");
        }
    }

    /// Schedules the next reconnect attempt, or gives up after the bound.
    fn handle_connection_loss(inner: &Arc<Self>, generation: u64) {
        if !Self::is_current(inner, generation) {
            return;
        }

        let attempts_so_far = inner.attempts.load(Ordering::SeqCst);
        if inner.policy.is_exhausted(attempts_so_far) {
            warn!(
                client = %inner.uuid,
                attempts = attempts_so_far,
                "reconnect attempts exhausted"
            );
            Self::set_state(inner, ConnectionState::Disconnected);
            inner.listeners.dispatch(
                CONNECTION_FAILED_EVENT,
                &json!({
                    "type": CONNECTION_FAILED_EVENT,
                    "attempts": attempts_so_far,
                }),
            );
            return;
        }

        let attempt = attempts_so_far + 1;
        inner.attempts.store(attempt, Ordering::SeqCst);
        let delay = inner.policy.delay_for(attempt);
        Self::set_state(inner, ConnectionState::Reconnecting { attempt });
        debug!(
            client = %inner.uuid,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "reconnect scheduled"
        );

        let task_inner = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !Self::is_current(&task_inner, generation) {
                trace!(client = %task_inner.uuid, "reconnect superseded by disconnect");
                return;
            }
            debug!(client = %task_inner.uuid, attempt, "reconnect attempt firing");
            if let Err(e) = Self::establish(&task_inner, generation).await {
                warn!(client = %task_inner.uuid, attempt, error = %e, "reconnect attempt failed");
                Self::handle_connection_loss(&task_inner, generation);
            }
        });
        *inner.reconnect_task.lock() = Some(handle);
    }
}

// ============================================================================
// RealtimeClient
// ============================================================================

/// Client for the platform's realtime notification connection.
///
/// Cheap to clone; clones share the connection, listeners, and lifecycle.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use pledgeboard_client::identifiers::UserId;
/// use pledgeboard_client::realtime::{PageOrigin, RealtimeClient};
///
/// # async fn example() -> pledgeboard_client::Result<()> {
/// let origin = PageOrigin::parse("https://pledgeboard.example")?;
/// let client = RealtimeClient::builder().page_origin(&origin).build()?;
///
/// client.add_listener("notification", Arc::new(|payload| {
///     println!("notification: {payload}");
/// }));
///
/// client.connect(UserId::new("u42")?, "session-token").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<ClientInner>,
}

impl RealtimeClient {
    /// Starts building a client.
    #[must_use]
    pub fn builder() -> RealtimeClientBuilder {
        RealtimeClientBuilder::default()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Connects and authenticates.
    ///
    /// Any existing connection is torn down first. The credentials are kept
    /// for reconnect reuse until the next `connect` or `disconnect`.
    ///
    /// On a dial failure the backoff path takes over in the background; the
    /// error is still returned so the caller knows the immediate attempt
    /// failed.
    ///
    /// # Errors
    ///
    /// Returns the transport or serialization error of the initial attempt.
    pub async fn connect(&self, user_id: UserId, token: impl Into<String>) -> Result<()> {
        self.disconnect();
        *self.inner.credentials.lock() =
            Some(StoredCredentials::new(user_id, token));
        self.inner.attempts.store(0, Ordering::SeqCst);

        let generation = self.inner.generation.load(Ordering::SeqCst);
        match ClientInner::establish(&self.inner, generation).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(client = %self.inner.uuid, error = %e, "initial connect failed");
                ClientInner::handle_connection_loss(&self.inner, generation);
                Err(e)
            }
        }
    }

    /// Page-load auto-connect from stored credentials.
    ///
    /// Reads the fixed credential keys from `primary` then `fallback`
    /// storage and connects when both are present. Returns `Ok(false)`
    /// (without connecting) when credentials are absent.
    ///
    /// # Errors
    ///
    /// Propagates [`connect`](Self::connect) errors.
    pub async fn auto_connect(
        &self,
        primary: &dyn KeyValueStorage,
        fallback: &dyn KeyValueStorage,
    ) -> Result<bool> {
        let Some(credentials) = StoredCredentials::load(primary, fallback) else {
            debug!(client = %self.inner.uuid, "no stored credentials; skipping auto-connect");
            return Ok(false);
        };
        self.connect(credentials.user_id, credentials.token).await?;
        Ok(true)
    }

    /// Disconnects and cancels all scheduled work.
    ///
    /// Supersedes any pending reconnect timer (generation bump + abort),
    /// closes the transport with a normal close code, and resets the attempt
    /// counter. Safe to call from any state, including Disconnected.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        inner.generation.fetch_add(1, Ordering::SeqCst);

        if let Some(handle) = inner.reconnect_task.lock().take() {
            handle.abort();
        }
        if let Some(tx) = inner.command_tx.lock().take() {
            let _ = tx.send(LoopCommand::Shutdown);
        }
        *inner.connection_id.lock() = None;
        inner.attempts.store(0, Ordering::SeqCst);
        *inner.state.lock() = ConnectionState::Disconnected;
        debug!(client = %inner.uuid, "disconnected");
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    /// Returns the reconnect attempts made since the last Ready.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Returns the server-assigned connection id, if connected and welcomed.
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.inner.connection_id.lock().clone()
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    /// Registers a listener for an event.
    ///
    /// Returns `false` if this exact callback was already registered.
    pub fn add_listener(&self, event: &str, callback: ListenerCallback) -> bool {
        self.inner.listeners.add(event, callback)
    }

    /// Removes a listener from an event.
    ///
    /// Returns `false` if the callback was not registered.
    pub fn remove_listener(&self, event: &str, callback: &ListenerCallback) -> bool {
        self.inner.listeners.remove(event, callback)
    }

    /// Sets the authentication verdict callback.
    pub fn set_auth_handler(&self, handler: impl Fn(bool) + Send + Sync + 'static) {
        *self.inner.auth_handler.lock() = Some(Arc::new(handler));
    }

    /// Clears the authentication verdict callback.
    pub fn clear_auth_handler(&self) {
        *self.inner.auth_handler.lock() = None;
    }

    // ========================================================================
    // Outbound helpers
    // ========================================================================

    /// Requests to join a notification room.
    ///
    /// Returns whether the send was attempted on an open transport; `false`
    /// means not connected, and `true` does not imply delivery.
    pub fn join_room(&self, room_id: RoomId) -> bool {
        self.send(ClientMessage::JoinRoom { room_id })
    }

    /// Requests to leave a notification room.
    ///
    /// Same delivery semantics as [`join_room`](Self::join_room).
    pub fn leave_room(&self, room_id: RoomId) -> bool {
        self.send(ClientMessage::LeaveRoom { room_id })
    }

    /// Subscribes to the user's notification feed.
    ///
    /// Same delivery semantics as [`join_room`](Self::join_room).
    pub fn subscribe_to_notifications(&self) -> bool {
        self.send(ClientMessage::SubscribeNotifications)
    }

    /// Queues a message onto the live event loop, if any.
    fn send(&self, message: ClientMessage) -> bool {
        let guard = self.inner.command_tx.lock();
        match guard.as_ref() {
            Some(tx) => tx.send(LoopCommand::Send(message)).is_ok(),
            None => {
                trace!(client = %self.inner.uuid, "send skipped: not connected");
                false
            }
        }
    }
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("uuid", &self.inner.uuid)
            .field("endpoint", &self.inner.endpoint)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Milliseconds since the Unix epoch, for heartbeat timestamps.
fn unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
