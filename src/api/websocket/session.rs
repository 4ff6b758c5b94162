//! Realtime session handler
//!
//! Drives one connection through
//! `Connecting -> Authenticating -> Active -> Closing -> Closed`.
//!
//! The session is generic over the two socket halves so it can run on an
//! axum `WebSocket` as well as on in-memory channels. It is the only
//! writer to its socket: registry broadcasts land in the connection's
//! queue and are forwarded from the same loop that reads inbound frames.

use std::borrow::Cow;
use std::fmt::Display;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::events::{
    event_type, parse_client_message, ClientMessage, ErrorPayload, Inbound, PongPayload,
    WelcomePayload,
};
use super::registry::{ConnectionId, ConnectionRegistry};
use crate::auth::IdentityResolver;
use crate::config::RealtimeSettings;
use crate::store::StatsProvider;
use crate::types::DateRange;

/// Close reasons are limited to 123 bytes by the protocol
const MAX_CLOSE_REASON: usize = 123;

/// Everything a session needs from the rest of the process
#[derive(Clone)]
pub struct SessionContext {
    pub registry: Arc<ConnectionRegistry>,
    pub identity: Arc<dyn IdentityResolver>,
    pub stats: Arc<dyn StatsProvider>,
    pub queue_capacity: usize,
    pub idle_timeout: Option<Duration>,
}

impl SessionContext {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        identity: Arc<dyn IdentityResolver>,
        stats: Arc<dyn StatsProvider>,
        realtime: &RealtimeSettings,
    ) -> Self {
        Self {
            registry,
            identity,
            stats,
            queue_capacity: realtime.queue_capacity,
            idle_timeout: realtime.idle_timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Active,
    Closing,
    Closed,
}

/// Why the session loop ended; selects the close frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Client closed or went away
    Normal,
    /// No inbound frame within the configured idle timeout
    IdleTimeout,
    /// Missing, invalid or expired token, or unknown user
    AuthFailed(String),
    /// Anything unexpected while the session was active
    InternalError(String),
}

impl ExitReason {
    pub fn close_code(&self) -> u16 {
        match self {
            ExitReason::Normal | ExitReason::IdleTimeout => close_code::NORMAL,
            ExitReason::AuthFailed(_) => close_code::POLICY,
            ExitReason::InternalError(_) => close_code::ERROR,
        }
    }

    /// Reason text sent to the client; internal details stay in the logs
    pub fn close_reason(&self) -> String {
        let reason = match self {
            ExitReason::Normal => "",
            ExitReason::IdleTimeout => "idle timeout",
            ExitReason::AuthFailed(reason) => reason.as_str(),
            ExitReason::InternalError(_) => "Internal server error",
        };

        let mut end = reason.len().min(MAX_CLOSE_REASON);
        while !reason.is_char_boundary(end) {
            end -= 1;
        }
        reason[..end].to_string()
    }
}

/// What woke the active loop
enum LoopEvent<E> {
    Inbound(Option<Result<Message, E>>),
    Outbound(Option<String>),
    Idle,
}

struct Session<'a, S, K> {
    ctx: &'a SessionContext,
    state: SessionState,
    registration: Option<(String, ConnectionId)>,
    inbound: S,
    outbound: K,
}

/// Run a connection from handshake to close
///
/// `token` is the bearer token supplied with the upgrade request. The
/// transport is assumed to be already upgraded. Always ends with the
/// connection unregistered and a close frame attempted.
pub async fn run_session<S, E, K>(
    ctx: &SessionContext,
    token: Option<String>,
    inbound: S,
    outbound: K,
) -> ExitReason
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    let mut session = Session {
        ctx,
        state: SessionState::Connecting,
        registration: None,
        inbound,
        outbound,
    };

    let reason = session.run(token).await;
    session.close(&reason).await;
    reason
}

impl<'a, S, E, K> Session<'a, S, K>
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = ?self.state, to = ?next, "Session state change");
        self.state = next;
    }

    async fn run(&mut self, token: Option<String>) -> ExitReason {
        self.transition(SessionState::Authenticating);

        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            return ExitReason::AuthFailed("no token provided".to_string());
        };

        let identity = match self.ctx.identity.resolve_identity(token.trim()).await {
            Ok(identity) => identity,
            Err(e) => return ExitReason::AuthFailed(e.to_string()),
        };
        let user_id = identity.user_id;

        let (handle, queue) = self.ctx.registry.open_connection(self.ctx.queue_capacity);
        let connection = handle.id();
        self.ctx.registry.register(&user_id, handle);
        self.registration = Some((user_id.clone(), connection));
        tracing::info!(user_id = %user_id, %connection, "WebSocket connected");

        self.transition(SessionState::Active);
        self.active_loop(&user_id, queue).await
    }

    async fn active_loop(&mut self, user_id: &str, mut queue: mpsc::Receiver<String>) -> ExitReason {
        let welcome = WelcomePayload::new(user_id);
        if let ControlFlow::Break(reason) = self
            .reply(user_id, event_type::CONNECTION, &welcome, &mut queue)
            .await
        {
            return reason;
        }

        let mut deadline = self.next_deadline();

        loop {
            // Queued frames go out before the next inbound frame is read
            let event = tokio::select! {
                biased;
                text = queue.recv() => LoopEvent::Outbound(text),
                frame = self.inbound.next() => LoopEvent::Inbound(frame),
                _ = idle_expired(deadline) => LoopEvent::Idle,
            };

            match event {
                LoopEvent::Inbound(None) => return ExitReason::Normal,
                LoopEvent::Inbound(Some(Err(e))) => {
                    return ExitReason::InternalError(format!("receive failed: {}", e))
                }
                LoopEvent::Inbound(Some(Ok(message))) => {
                    deadline = self.next_deadline();
                    if let ControlFlow::Break(reason) =
                        self.handle_frame(user_id, message, &mut queue).await
                    {
                        return reason;
                    }
                }
                LoopEvent::Outbound(Some(text)) => {
                    if let Err(e) = self.outbound.send(Message::Text(text)).await {
                        return ExitReason::InternalError(format!("send failed: {}", e));
                    }
                }
                LoopEvent::Outbound(None) => {
                    return ExitReason::InternalError("evicted from connection registry".to_string())
                }
                LoopEvent::Idle => return ExitReason::IdleTimeout,
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.ctx.idle_timeout.map(|timeout| Instant::now() + timeout)
    }

    async fn handle_frame(
        &mut self,
        user_id: &str,
        message: Message,
        queue: &mut mpsc::Receiver<String>,
    ) -> ControlFlow<ExitReason> {
        match message {
            Message::Text(text) => match parse_client_message(&text) {
                Inbound::Malformed(message) => {
                    let payload = ErrorPayload { message };
                    return self.reply(user_id, event_type::ERROR, &payload, queue).await;
                }
                Inbound::Ignored | Inbound::Message(ClientMessage::Unknown) => {
                    tracing::debug!(user_id, "Ignoring client message");
                }
                Inbound::Message(ClientMessage::Ping { timestamp }) => {
                    let payload = PongPayload { timestamp };
                    return self.reply(user_id, event_type::PONG, &payload, queue).await;
                }
                Inbound::Message(ClientMessage::GetStats {
                    start_date,
                    end_date,
                }) => {
                    let range = DateRange::new(start_date, end_date);
                    let stats = self.ctx.stats.aggregate_stats(user_id, range).await;
                    return match stats {
                        Ok(stats) => self.reply(user_id, event_type::STATS, &stats, queue).await,
                        Err(e) => ControlFlow::Break(ExitReason::InternalError(format!(
                            "stats query failed: {}",
                            e
                        ))),
                    };
                }
            },
            Message::Ping(data) => {
                if let Err(e) = self.outbound.send(Message::Pong(data)).await {
                    return ControlFlow::Break(ExitReason::InternalError(format!(
                        "send failed: {}",
                        e
                    )));
                }
            }
            Message::Binary(_) | Message::Pong(_) => {}
            Message::Close(_) => return ControlFlow::Break(ExitReason::Normal),
        }

        ControlFlow::Continue(())
    }

    /// Broadcast to the user's bucket, this connection included
    ///
    /// This session is the only reader of its own queue, so it keeps
    /// forwarding queued frames to the socket until the broadcast has
    /// settled. Otherwise a full queue would time out and evict itself.
    async fn reply<P>(
        &mut self,
        user_id: &str,
        event_type: &str,
        payload: &P,
        queue: &mut mpsc::Receiver<String>,
    ) -> ControlFlow<ExitReason>
    where
        P: Serialize + Sync + ?Sized,
    {
        let ctx = self.ctx;
        let delivery = ctx.registry.broadcast(user_id, event_type, payload);
        tokio::pin!(delivery);

        loop {
            tokio::select! {
                biased;
                _ = &mut delivery => return ControlFlow::Continue(()),
                Some(text) = queue.recv() => {
                    if let Err(e) = self.outbound.send(Message::Text(text)).await {
                        return ControlFlow::Break(ExitReason::InternalError(format!(
                            "send failed: {}",
                            e
                        )));
                    }
                }
            }
        }
    }

    async fn close(&mut self, reason: &ExitReason) {
        self.transition(SessionState::Closing);

        if let Some((user_id, connection)) = self.registration.take() {
            self.ctx.registry.unregister(&user_id, connection);
            match reason {
                ExitReason::InternalError(detail) => {
                    tracing::error!(user_id = %user_id, %connection, error = %detail, "WebSocket session failed")
                }
                _ => tracing::info!(user_id = %user_id, %connection, ?reason, "WebSocket disconnected"),
            }
        } else {
            tracing::warn!(?reason, "WebSocket rejected during handshake");
        }

        let frame = CloseFrame {
            code: reason.close_code(),
            reason: Cow::Owned(reason.close_reason()),
        };
        if let Err(e) = self.outbound.send(Message::Close(Some(frame))).await {
            tracing::debug!(error = %e, "Close frame not delivered");
        }
        if let Err(e) = self.outbound.close().await {
            tracing::debug!(error = %e, "Socket close failed");
        }

        self.transition(SessionState::Closed);
    }
}

async fn idle_expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
