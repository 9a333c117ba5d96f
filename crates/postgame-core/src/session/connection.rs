//! Per-connection message loop.
//!
//! A [`ConnectionHandler`] drives one client connection through
//! `Connecting -> Open -> Closing -> Closed`:
//!
//! - [`ConnectionHandler::open`] registers the session (`Connecting -> Open`).
//! - [`ConnectionHandler::serve`] runs the message cycle until the transport
//!   goes away or the session is closed, then releases the session exactly
//!   once (`Open -> Closing -> Closed`).
//!
//! The handler is transport-agnostic: inbound frames arrive as a
//! `Stream<Item = Result<String, TransportError>>` and replies leave through
//! a `Sink<String, Error = TransportError>`.
//!
//! Messages on one session are processed strictly one at a time. The
//! generation call runs on its own task; while it is in flight the handler
//! keeps watching the transport so a disconnect is noticed immediately.
//! Frames that arrive meanwhile are queued and processed afterwards, in order.
//! The queue is bounded; a client that overruns it is disconnected.
//! If the connection closes mid-cycle, the generation task is left to finish
//! on its own and its result is dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, info, warn};

use postgame_types::chat::{ConnectionState, Role, SessionId};
use postgame_types::error::{SessionError, TransportError};
use postgame_types::llm::GenerationFailure;

use crate::chat::prompt::PromptAssembler;
use crate::llm::client::GenerationClient;

use super::registry::{SessionHandle, SessionRegistry};

/// Default number of prior turns included in each prompt.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Default number of frames queued while a reply is being generated.
pub const DEFAULT_MAX_PENDING_MESSAGES: usize = 16;

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The client closed the transport (close frame or end of stream).
    ClientClosed,
    /// The transport failed while receiving or sending.
    TransportFailed(TransportError),
    /// The session was removed or superseded from outside this connection.
    SessionClosed,
    /// Registration was refused; the session never opened.
    Rejected(SessionError),
    /// More frames arrived during one generation than the queue allows.
    Overloaded,
}

/// What happened over the lifetime of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSummary {
    pub session_id: SessionId,
    /// Inbound messages answered with exactly one outbound frame each.
    pub messages_answered: usize,
    pub reason: CloseReason,
    pub final_state: ConnectionState,
}

/// Tracks and validates the connection's lifecycle state.
#[derive(Debug)]
struct Lifecycle {
    session_id: SessionId,
    state: ConnectionState,
}

impl Lifecycle {
    fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            state: ConnectionState::Connecting,
        }
    }

    fn advance(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        if !self.state.can_transition_to(next) {
            warn!(
                session_id = %self.session_id,
                from = %self.state,
                to = %next,
                "Ignoring illegal connection state transition"
            );
            return;
        }
        self.state = next;
    }
}

/// A session that has completed `Connecting -> Open`.
#[derive(Debug)]
pub struct OpenConnection {
    session: SessionHandle,
    lifecycle: Lifecycle,
}

impl OpenConnection {
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.lifecycle.state
    }
}

/// Drives connections against a shared registry, persona, and backend.
#[derive(Clone)]
pub struct ConnectionHandler {
    registry: SessionRegistry,
    assembler: PromptAssembler,
    client: Arc<GenerationClient>,
    history_window: usize,
    max_pending: usize,
}

impl ConnectionHandler {
    pub fn new(
        registry: SessionRegistry,
        assembler: PromptAssembler,
        client: Arc<GenerationClient>,
    ) -> Self {
        Self {
            registry,
            assembler,
            client,
            history_window: DEFAULT_HISTORY_WINDOW,
            max_pending: DEFAULT_MAX_PENDING_MESSAGES,
        }
    }

    /// Override how many prior turns each prompt includes.
    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    /// Override how many frames may queue up behind an in-flight reply.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Register `id` once the transport handshake has completed.
    pub fn open(&self, id: SessionId) -> Result<OpenConnection, SessionError> {
        let mut lifecycle = Lifecycle::new(id.clone());
        let session = self.registry.create(id)?;
        lifecycle.advance(ConnectionState::Open);
        info!(session_id = %session.id(), epoch = session.epoch(), "New connection");
        Ok(OpenConnection { session, lifecycle })
    }

    /// Open `id` and serve it until the connection ends.
    ///
    /// If registration is refused, `outbound` is closed and the summary
    /// carries [`CloseReason::Rejected`].
    pub async fn run<I, O>(&self, id: SessionId, inbound: I, mut outbound: O) -> ConnectionSummary
    where
        I: Stream<Item = Result<String, TransportError>> + Unpin,
        O: Sink<String, Error = TransportError> + Unpin,
    {
        match self.open(id.clone()) {
            Ok(conn) => self.serve(conn, inbound, outbound).await,
            Err(err) => {
                warn!(session_id = %id, error = %err, "Refusing connection");
                let _ = outbound.close().await;
                ConnectionSummary {
                    session_id: id,
                    messages_answered: 0,
                    reason: CloseReason::Rejected(err),
                    final_state: ConnectionState::Closed,
                }
            }
        }
    }

    /// Run the message cycle for an open connection until it closes.
    pub async fn serve<I, O>(
        &self,
        conn: OpenConnection,
        mut inbound: I,
        mut outbound: O,
    ) -> ConnectionSummary
    where
        I: Stream<Item = Result<String, TransportError>> + Unpin,
        O: Sink<String, Error = TransportError> + Unpin,
    {
        let OpenConnection {
            session,
            mut lifecycle,
        } = conn;
        let mut pending: VecDeque<String> = VecDeque::new();
        let mut answered = 0usize;

        let reason = loop {
            let message = match pending.pop_front() {
                Some(message) => message,
                None => {
                    tokio::select! {
                        biased;
                        _ = session.closed() => break CloseReason::SessionClosed,
                        frame = inbound.next() => match classify(frame) {
                            Ok(text) => text,
                            Err(reason) => break reason,
                        },
                    }
                }
            };

            let reply = match self.cycle(&session, message, &mut inbound, &mut pending).await {
                Ok(reply) => reply,
                Err(reason) => break reason,
            };

            if let Err(err) = outbound.send(reply).await {
                debug!(session_id = %session.id(), error = %err, "Send failed");
                break CloseReason::TransportFailed(err);
            }
            answered += 1;
            lifecycle.advance(ConnectionState::Open);
        };

        lifecycle.advance(ConnectionState::Closing);
        let removed = self.registry.release(&session);
        let _ = outbound.close().await;
        lifecycle.advance(ConnectionState::Closed);

        info!(
            session_id = %session.id(),
            messages = answered,
            turns = session.turn_count(),
            removed,
            reason = ?reason,
            "Disconnected"
        );

        ConnectionSummary {
            session_id: session.id().clone(),
            messages_answered: answered,
            reason,
            final_state: lifecycle.state,
        }
    }

    /// One message cycle: record the question, generate, record the answer.
    ///
    /// Returns the reply text to send, or why the connection must close.
    async fn cycle<I>(
        &self,
        session: &SessionHandle,
        message: String,
        inbound: &mut I,
        pending: &mut VecDeque<String>,
    ) -> Result<String, CloseReason>
    where
        I: Stream<Item = Result<String, TransportError>> + Unpin,
    {
        let window = session.record_question(&message, self.history_window);
        let prompt = self.assembler.build(&window, &message);
        debug!(
            session_id = %session.id(),
            window = window.len(),
            prompt_bytes = prompt.len(),
            "Prompt assembled"
        );

        let client = Arc::clone(&self.client);
        let mut generation = tokio::spawn(async move { client.respond(&prompt).await });

        let reply = loop {
            tokio::select! {
                biased;
                _ = session.closed() => return Err(CloseReason::SessionClosed),
                joined = &mut generation => {
                    break match joined {
                        Ok(reply) => reply,
                        Err(err) => {
                            warn!(session_id = %session.id(), error = %err, "Generation task failed");
                            self.client.fallback(GenerationFailure::Backend)
                        }
                    };
                }
                frame = inbound.next() => match classify(frame) {
                    Ok(_) if pending.len() >= self.max_pending => {
                        warn!(
                            session_id = %session.id(),
                            queued = pending.len(),
                            "Too many messages during generation, closing"
                        );
                        return Err(CloseReason::Overloaded);
                    }
                    Ok(text) => pending.push_back(text),
                    Err(reason) => return Err(reason),
                },
            }
        };

        if session.is_closed() {
            return Err(CloseReason::SessionClosed);
        }

        debug!(
            session_id = %session.id(),
            fallback = reply.is_fallback(),
            "Reply ready"
        );
        session.append(Role::Assistant, reply.text.clone());
        Ok(reply.text)
    }
}

/// Map one inbound poll result to a message or a close reason.
fn classify(frame: Option<Result<String, TransportError>>) -> Result<String, CloseReason> {
    match frame {
        Some(Ok(text)) => Ok(text),
        None | Some(Err(TransportError::Closed)) => Err(CloseReason::ClientClosed),
        Some(Err(err)) => Err(CloseReason::TransportFailed(err)),
    }
}
