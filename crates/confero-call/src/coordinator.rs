// SPDX-FileCopyrightText: 2026 Confero Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-view FSM that manages the lifecycle of a single call session.
//!
//! States: Idle -> OutgoingRinging/IncomingRinging -> Active -> Ended.
//! Ended is terminal; the coordinator resets to Idle only by being torn
//! down and recreated with the view.
//!
//! Any provider error during initiate/accept transitions directly to
//! `Ended` with an error reason; the coordinator is never left stuck
//! ringing. Loss of the media connection surfaces as a remote `Ended`
//! event; the coordinator does not itself detect media timeouts.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use confero_core::error::ConferoError;
use confero_core::event::{CallEvent, CallEventKind, CallKind};
use confero_core::traits::{CallSignaling, RejectReason};
use confero_core::types::{CallSessionId, UserId};

/// Why a session reached `Ended`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// Either side hung up an established call, or we cancelled our own
    /// outgoing ring.
    HungUp,
    /// The remote peer rejected our outgoing call.
    RemoteRejected,
    /// The remote peer cancelled before we answered.
    RemoteCancelled,
    /// The operator rejected the incoming call.
    LocalRejected,
    /// A provider failure forced the session closed.
    Error(String),
}

/// States in the call session FSM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallState {
    /// No session; the only state that admits a new call.
    Idle,
    /// We initiated and the peer has not answered yet.
    OutgoingRinging,
    /// The peer initiated and we have not answered yet.
    IncomingRinging,
    /// Media session established.
    Active,
    /// Terminal until the coordinator is recreated.
    Ended(EndReason),
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallState::Idle => write!(f, "idle"),
            CallState::OutgoingRinging => write!(f, "outgoing-ringing"),
            CallState::IncomingRinging => write!(f, "incoming-ringing"),
            CallState::Active => write!(f, "active"),
            CallState::Ended(reason) => write!(f, "ended ({reason:?})"),
        }
    }
}

/// The session currently ringing or active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentCall {
    pub session: CallSessionId,
    pub peer: UserId,
    pub kind: CallKind,
}

struct Machine {
    state: CallState,
    call: Option<CurrentCall>,
}

/// Coordinates one call session against the signaling provider.
///
/// Cheap to clone; clones share state. Discard the coordinator with the
/// view to reset to `Idle`.
#[derive(Clone)]
pub struct CallCoordinator {
    signaling: Arc<dyn CallSignaling>,
    machine: Arc<Mutex<Machine>>,
    watch_tx: Arc<watch::Sender<CallState>>,
}

impl CallCoordinator {
    pub fn new(signaling: Arc<dyn CallSignaling>) -> Self {
        let (watch_tx, _) = watch::channel(CallState::Idle);
        Self {
            signaling,
            machine: Arc::new(Mutex::new(Machine { state: CallState::Idle, call: None })),
            watch_tx: Arc::new(watch_tx),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> CallState {
        self.machine.lock().await.state.clone()
    }

    /// The ringing or active session, if any.
    pub async fn current_call(&self) -> Option<CurrentCall> {
        self.machine.lock().await.call.clone()
    }

    /// Observable state stream for the presentation layer.
    pub fn watch(&self) -> watch::Receiver<CallState> {
        self.watch_tx.subscribe()
    }

    fn transition(&self, machine: &mut Machine, next: CallState) {
        debug!(from = %machine.state, to = %next, "call state transition");
        machine.state = next.clone();
        if matches!(next, CallState::Ended(_)) {
            machine.call = None;
        }
        let _ = self.watch_tx.send(next);
    }

    /// Starts an outgoing call. Only valid from `Idle`.
    pub async fn initiate(&self, peer: &UserId, kind: CallKind) -> Result<(), ConferoError> {
        let mut machine = self.machine.lock().await;
        if machine.state != CallState::Idle {
            return Err(ConferoError::Signaling {
                message: format!("cannot initiate while {}", machine.state),
                source: None,
            });
        }

        self.transition(&mut machine, CallState::OutgoingRinging);

        match self.signaling.initiate(peer, kind).await {
            Ok(session) => {
                info!(session = %session, peer = %peer, "outgoing call ringing");
                machine.call = Some(CurrentCall { session, peer: peer.clone(), kind });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "initiate failed, closing session");
                self.transition(&mut machine, CallState::Ended(EndReason::Error(e.to_string())));
                Err(e)
            }
        }
    }

    /// Accepts the incoming call. Only valid from `IncomingRinging`.
    pub async fn accept(&self) -> Result<(), ConferoError> {
        let mut machine = self.machine.lock().await;
        if machine.state != CallState::IncomingRinging {
            return Err(ConferoError::Signaling {
                message: format!("cannot accept while {}", machine.state),
                source: None,
            });
        }
        let session = machine.call.as_ref().map(|c| c.session.clone()).ok_or_else(|| {
            ConferoError::Internal("incoming-ringing without a session".into())
        })?;

        match self.signaling.accept(&session).await {
            Ok(()) => {
                info!(session = %session, "call active");
                self.transition(&mut machine, CallState::Active);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "accept failed, closing session");
                self.transition(&mut machine, CallState::Ended(EndReason::Error(e.to_string())));
                Err(e)
            }
        }
    }

    /// Rejects the incoming call. Only valid from `IncomingRinging`.
    pub async fn reject(&self) -> Result<(), ConferoError> {
        let mut machine = self.machine.lock().await;
        if machine.state != CallState::IncomingRinging {
            return Err(ConferoError::Signaling {
                message: format!("cannot reject while {}", machine.state),
                source: None,
            });
        }
        let session = machine.call.as_ref().map(|c| c.session.clone()).ok_or_else(|| {
            ConferoError::Internal("incoming-ringing without a session".into())
        })?;

        let result = self.signaling.reject(&session, RejectReason::Declined).await;
        // The session closes locally whether or not the provider heard us.
        let reason = match &result {
            Ok(()) => EndReason::LocalRejected,
            Err(e) => EndReason::Error(e.to_string()),
        };
        self.transition(&mut machine, CallState::Ended(reason));
        result
    }

    /// Ends a ringing or active session.
    pub async fn hang_up(&self) -> Result<(), ConferoError> {
        let mut machine = self.machine.lock().await;
        let session = match (&machine.state, &machine.call) {
            (CallState::OutgoingRinging | CallState::Active, Some(call)) => call.session.clone(),
            _ => {
                return Err(ConferoError::Signaling {
                    message: format!("cannot hang up while {}", machine.state),
                    source: None,
                });
            }
        };

        let result = self.signaling.hang_up(&session).await;
        let reason = match &result {
            Ok(()) => EndReason::HungUp,
            Err(e) => EndReason::Error(e.to_string()),
        };
        self.transition(&mut machine, CallState::Ended(reason));
        result
    }

    /// Applies a remote call event from the push transport.
    ///
    /// Every (state, event) pair has a defined outcome; nothing is
    /// silently dropped while ringing.
    pub async fn on_event(&self, event: &CallEvent) {
        let mut machine = self.machine.lock().await;

        let current_session = machine.call.as_ref().map(|c| c.session.clone());
        let for_current = current_session.as_ref() == Some(&event.session_id);

        match (&machine.state, event.kind) {
            (CallState::Idle, CallEventKind::Incoming) => {
                info!(session = %event.session_id, peer = %event.peer_id, "incoming call ringing");
                machine.call = Some(CurrentCall {
                    session: event.session_id.clone(),
                    peer: event.peer_id.clone(),
                    kind: event.call_type,
                });
                self.transition(&mut machine, CallState::IncomingRinging);
            }

            // Busy policy: a second incoming call while one is in
            // progress is explicitly refused, not ignored.
            (
                CallState::OutgoingRinging | CallState::IncomingRinging | CallState::Active,
                CallEventKind::Incoming,
            ) => {
                if for_current {
                    debug!(session = %event.session_id, "duplicate incoming signal for current session");
                    return;
                }
                info!(session = %event.session_id, "busy, auto-rejecting second incoming call");
                let signaling = Arc::clone(&self.signaling);
                let session = event.session_id.clone();
                tokio::spawn(async move {
                    if let Err(e) = signaling.reject(&session, RejectReason::Busy).await {
                        warn!(session = %session, error = %e, "busy reject failed");
                    }
                });
            }

            (CallState::OutgoingRinging, CallEventKind::Accepted) => {
                if !for_current {
                    warn!(session = %event.session_id, "accepted signal for unknown session");
                    return;
                }
                info!(session = %event.session_id, "call active");
                self.transition(&mut machine, CallState::Active);
            }

            (CallState::OutgoingRinging, CallEventKind::Rejected) => {
                if !for_current {
                    warn!(session = %event.session_id, "rejected signal for unknown session");
                    return;
                }
                info!(session = %event.session_id, "peer rejected call");
                self.transition(&mut machine, CallState::Ended(EndReason::RemoteRejected));
            }

            (CallState::OutgoingRinging, CallEventKind::Cancelled) => {
                if !for_current {
                    warn!(session = %event.session_id, "cancelled signal for unknown session");
                    return;
                }
                self.transition(&mut machine, CallState::Ended(EndReason::RemoteCancelled));
            }

            (CallState::IncomingRinging, CallEventKind::Cancelled) => {
                if !for_current {
                    warn!(session = %event.session_id, "cancelled signal for unknown session");
                    return;
                }
                info!(session = %event.session_id, "caller cancelled before answer");
                self.transition(&mut machine, CallState::Ended(EndReason::RemoteCancelled));
            }

            (
                CallState::OutgoingRinging | CallState::IncomingRinging | CallState::Active,
                CallEventKind::Ended,
            ) => {
                if !for_current {
                    warn!(session = %event.session_id, "ended signal for unknown session");
                    return;
                }
                info!(session = %event.session_id, "call ended by remote");
                self.transition(&mut machine, CallState::Ended(EndReason::HungUp));
            }

            (CallState::IncomingRinging, CallEventKind::Accepted | CallEventKind::Rejected) => {
                // Answering is ours to do; a remote accept/reject for the
                // session we are ringing on is a protocol violation.
                warn!(
                    session = %event.session_id,
                    kind = %event.kind,
                    "unexpected signal while incoming-ringing, keeping state"
                );
            }

            (CallState::Active, CallEventKind::Accepted) => {
                debug!(session = %event.session_id, "duplicate accepted signal");
            }

            (CallState::Active, CallEventKind::Rejected | CallEventKind::Cancelled) => {
                warn!(
                    session = %event.session_id,
                    kind = %event.kind,
                    "unexpected signal for established call, keeping state"
                );
            }

            (CallState::Idle | CallState::Ended(_), _) => {
                debug!(
                    session = %event.session_id,
                    kind = %event.kind,
                    state = %machine.state,
                    "stale call signal dropped"
                );
            }
        }
    }
}
