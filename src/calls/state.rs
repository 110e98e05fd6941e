//! Call negotiation state machine.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::peer::PeerId;

/// Current state of the negotiation.
///
/// At most one call exists per process. Whenever the state is not
/// [`CallState::Idle`] it carries the one peer the call is with, and
/// events naming any other peer leave the machine untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CallState {
    /// No call in progress.
    #[default]
    Idle,
    /// Local side initiated a call, awaiting response.
    Calling(PeerId),
    /// The peer initiated a call, awaiting local pick-up.
    Called(PeerId),
    /// Both sides agreed to connect; media negotiation in progress or done.
    Connected(PeerId),
}

impl CallState {
    /// The peer this call is with, if any.
    pub fn peer(&self) -> Option<PeerId> {
        match self {
            Self::Calling(peer) | Self::Called(peer) | Self::Connected(peer) => Some(*peer),
            Self::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// Inputs to the negotiation machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// Local user wants to call the peer.
    LocalCallRequest(PeerId),
    /// The channel reports the peer is calling us.
    RemoteCallNotification(PeerId),
    /// Local user accepted the call.
    LocalPickUp(PeerId),
    /// The peer accepted the call.
    RemotePickUp(PeerId),
    /// A session-description offer from the peer reached the media layer.
    RemoteOfferArrived(PeerId),
    /// Either side terminated the call.
    HangUp(PeerId),
    /// The set of reachable peers changed.
    PresenceChanged(HashSet<PeerId>),
}

/// Protocol commands produced by a transition, executed in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PushCallRequest(PeerId),
    PushPickUp(PeerId),
    PushHangUp(PeerId),
    PushOffer(PeerId),
    PushAnswer(PeerId),
}

/// The negotiation machine: current state plus the local identity used
/// as the tie-break.
#[derive(Debug, Clone)]
pub struct CallMachine {
    state: CallState,
    local: PeerId,
}

impl CallMachine {
    pub fn new(local: PeerId) -> Self {
        Self {
            state: CallState::Idle,
            local,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn local(&self) -> PeerId {
        self.local
    }

    /// The peer of the call in progress, if any.
    pub fn peer(&self) -> Option<PeerId> {
        self.state.peer()
    }

    /// Feed one event through the machine, returning the commands to
    /// execute in order.
    pub fn process(&mut self, event: CallEvent) -> Vec<Command> {
        let (next, commands) = transition(self.state, self.local, event);
        self.state = next;
        commands
    }
}

/// Pure transition function. Total: every `(state, event)` pair has a
/// defined result, falling back to the identity transition with no
/// commands.
///
/// When both peers call each other inside the same race window, each
/// side converges on `Connected` using only its own id and the peer's:
/// the smaller id becomes the offerer, the larger id the answerer. The
/// same order gates `RemoteOfferArrived`, so exactly one side ever
/// answers and no competing offer is produced.
pub fn transition(state: CallState, local: PeerId, event: CallEvent) -> (CallState, Vec<Command>) {
    use CallEvent::*;
    use CallState::*;
    use Command::*;

    match (state, event) {
        (Idle, LocalCallRequest(peer)) => (Calling(peer), vec![PushCallRequest(peer)]),
        (Idle, RemoteCallNotification(peer)) => (Called(peer), vec![]),

        // Simultaneous call: we were calling the peer while the peer
        // was calling us.
        (Calling(current), RemoteCallNotification(peer)) if current == peer && local < peer => {
            (Connected(peer), vec![PushPickUp(peer), PushOffer(peer)])
        }
        (Calling(current), RemoteCallNotification(peer)) if current == peer => {
            (Connected(peer), vec![PushPickUp(peer)])
        }

        // The peer picked up our call.
        (Calling(current), LocalPickUp(peer) | RemotePickUp(peer))
            if current == peer && local < peer =>
        {
            (Connected(peer), vec![PushOffer(peer)])
        }
        (Calling(current), LocalPickUp(peer) | RemotePickUp(peer)) if current == peer => {
            (Connected(peer), vec![])
        }

        // We picked up the peer's call.
        (Called(current), LocalPickUp(peer) | RemotePickUp(peer))
            if current == peer && local < peer =>
        {
            (Connected(peer), vec![PushPickUp(peer), PushOffer(peer)])
        }
        (Called(current), LocalPickUp(peer) | RemotePickUp(peer)) if current == peer => {
            (Connected(peer), vec![PushPickUp(peer)])
        }

        // The offer we were expecting; only the larger id answers.
        (Connected(current), RemoteOfferArrived(peer)) if current == peer && local > peer => {
            (Connected(peer), vec![PushAnswer(peer)])
        }

        (Calling(current) | Called(current) | Connected(current), HangUp(peer))
            if current == peer =>
        {
            (Idle, vec![PushHangUp(peer)])
        }

        // The peer became unreachable. Local cleanup only: there is
        // nobody to deliver a hang-up to.
        (Calling(current) | Called(current) | Connected(current), PresenceChanged(online))
            if !online.contains(&current) =>
        {
            (Idle, vec![])
        }

        (state, _) => (state, vec![]),
    }
}
