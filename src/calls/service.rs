//! Call service orchestrating the negotiation machine.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};

use super::channel::{PushOutcome, SignalChannel};
use super::media::{MediaEvent, MediaSession};
use super::signaling::{MatePayload, PeerMessage, SdpType, SignalEnvelope, SignalKind};
use super::state::{CallEvent, CallMachine, CallState, Command};
use super::telephony::TelephonyBridge;
use crate::types::peer::PeerId;

/// Configuration for the call service.
#[derive(Debug, Clone)]
pub struct CallServiceConfig {
    /// Capacity of the inbound event queue.
    pub queue_capacity: usize,
}

impl Default for CallServiceConfig {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}

/// Direction of the call in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallDirection {
    Outgoing,
    Incoming,
}

/// Observable session state, published after every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallSnapshot {
    pub state: CallState,
    pub direction: Option<CallDirection>,
    /// When the current state was entered.
    pub since: DateTime<Utc>,
}

/// Inputs accepted by the service queue.
#[derive(Debug)]
enum ServiceInput {
    UserStartedCall(PeerId),
    UserAnsweredCall(PeerId),
    UserEndedCall(PeerId),
    ChannelEvent { name: String, payload: Value },
    Media(MediaEvent),
    PresenceSync(HashSet<PeerId>),
}

/// Cloneable handle feeding the service queue.
///
/// Every method enqueues exactly one input; the service processes
/// inputs strictly one at a time, in arrival order.
#[derive(Clone)]
pub struct CallServiceHandle {
    input_tx: mpsc::Sender<ServiceInput>,
    snapshot_rx: watch::Receiver<CallSnapshot>,
}

impl CallServiceHandle {
    /// The user asked to call the peer.
    pub async fn user_started_call(&self, peer: PeerId) {
        self.send(ServiceInput::UserStartedCall(peer)).await;
    }

    /// The user answered the ringing call.
    pub async fn user_answered_call(&self, peer: PeerId) {
        self.send(ServiceInput::UserAnsweredCall(peer)).await;
    }

    /// The user ended (or declined) the call.
    pub async fn user_ended_call(&self, peer: PeerId) {
        self.send(ServiceInput::UserEndedCall(peer)).await;
    }

    /// A named event arrived on the channel.
    pub async fn channel_event(&self, name: &str, payload: Value) {
        self.send(ServiceInput::ChannelEvent {
            name: name.to_string(),
            payload,
        })
        .await;
    }

    /// A callback arrived from the media engine.
    pub async fn media_event(&self, event: MediaEvent) {
        self.send(ServiceInput::Media(event)).await;
    }

    /// The channel reported a fresh set of reachable peers.
    pub async fn presence_sync(&self, online: HashSet<PeerId>) {
        self.send(ServiceInput::PresenceSync(online)).await;
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> CallSnapshot {
        *self.snapshot_rx.borrow()
    }

    /// Watch snapshots as they are published.
    pub fn watch_snapshot(&self) -> watch::Receiver<CallSnapshot> {
        self.snapshot_rx.clone()
    }

    async fn send(&self, input: ServiceInput) {
        if self.input_tx.send(input).await.is_err() {
            warn!("call service is gone, dropping input");
        }
    }
}

/// Bridges the pure negotiation machine to the channel, media and
/// telephony collaborators.
///
/// The service is the sole owner and writer of the call state. All
/// inbound events funnel through one queue and are processed in
/// arrival order; operations with external latency (publishing,
/// producing descriptions) run in spawned tasks that act only on the
/// peer id they captured, never on the machine.
pub struct CallService {
    machine: CallMachine,
    direction: Option<CallDirection>,
    input_rx: mpsc::Receiver<ServiceInput>,
    snapshot_tx: watch::Sender<CallSnapshot>,
    channel: Arc<dyn SignalChannel>,
    media: Arc<dyn MediaSession>,
    telephony: Arc<dyn TelephonyBridge>,
}

impl CallService {
    pub fn new(
        local: PeerId,
        config: CallServiceConfig,
        channel: Arc<dyn SignalChannel>,
        media: Arc<dyn MediaSession>,
        telephony: Arc<dyn TelephonyBridge>,
    ) -> (Self, CallServiceHandle) {
        let (input_tx, input_rx) = mpsc::channel(config.queue_capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(CallSnapshot {
            state: CallState::Idle,
            direction: None,
            since: Utc::now(),
        });

        let service = Self {
            machine: CallMachine::new(local),
            direction: None,
            input_rx,
            snapshot_tx,
            channel,
            media,
            telephony,
        };
        let handle = CallServiceHandle {
            input_tx,
            snapshot_rx,
        };
        (service, handle)
    }

    /// Run the event loop until every handle is dropped.
    ///
    /// Consumes the service, so it runs exactly once per process.
    pub async fn run(mut self) {
        info!("call service started (local id {})", self.machine.local());
        while let Some(input) = self.input_rx.recv().await {
            self.process(input);
        }
        info!("call service stopped");
    }

    fn process(&mut self, input: ServiceInput) {
        match input {
            ServiceInput::UserStartedCall(peer) => {
                self.request_start(peer);
                self.dispatch(CallEvent::LocalCallRequest(peer));
            }
            ServiceInput::UserAnsweredCall(peer) => self.dispatch(CallEvent::LocalPickUp(peer)),
            ServiceInput::UserEndedCall(peer) => self.dispatch(CallEvent::HangUp(peer)),
            ServiceInput::ChannelEvent { name, payload } => {
                self.process_channel_event(&name, payload)
            }
            ServiceInput::Media(event) => self.process_media_event(event),
            ServiceInput::PresenceSync(online) => self.dispatch(CallEvent::PresenceChanged(online)),
        }
    }

    /// Ask the system to open its outgoing-call flow. The outcome is
    /// logged; the negotiation proceeds regardless.
    fn request_start(&self, peer: PeerId) {
        let telephony = self.telephony.clone();
        tokio::spawn(async move {
            if let Err(e) = telephony.request_start_call(peer).await {
                warn!("failed to request start of call with {peer}: {e}");
            }
        });
    }

    fn process_channel_event(&mut self, name: &str, payload: Value) {
        let Some(kind) = SignalKind::from_tag(name) else {
            debug!("ignoring unknown channel event {name:?}");
            return;
        };

        match kind {
            SignalKind::Call => self.dispatch_control(payload, CallEvent::RemoteCallNotification),
            SignalKind::PickUp => self.dispatch_control(payload, CallEvent::RemotePickUp),
            SignalKind::HangUp => self.dispatch_control(payload, CallEvent::HangUp),
            SignalKind::PeerMessage => self.process_peer_message(payload),
        }
    }

    fn dispatch_control(&mut self, payload: Value, event: fn(PeerId) -> CallEvent) {
        match serde_json::from_value::<MatePayload>(payload) {
            Ok(control) => self.dispatch(event(control.mate)),
            Err(e) => warn!("dropping malformed control payload: {e}"),
        }
    }

    fn process_peer_message(&mut self, payload: Value) {
        let envelope = match serde_json::from_value::<SignalEnvelope>(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("dropping malformed peer-message envelope: {e}");
                return;
            }
        };
        let message = match PeerMessage::decode(&envelope.body) {
            Ok(message) => message,
            Err(e) => {
                warn!("dropping undecodable peer-message from {}: {e}", envelope.mate);
                return;
            }
        };

        // Signaling payloads only matter for the call in progress.
        let Some(peer) = self.machine.peer() else {
            debug!(
                "ignoring peer-message from {} with no call in progress",
                envelope.mate
            );
            return;
        };
        if peer != envelope.mate {
            debug!(
                "ignoring peer-message from {} while in a call with {peer}",
                envelope.mate
            );
            return;
        }

        match message {
            PeerMessage::Sdp(description) => {
                let is_offer = description.kind == SdpType::Offer;
                let media = self.media.clone();
                tokio::spawn(async move {
                    if let Err(e) = media.set_remote_description(description).await {
                        warn!("failed to apply remote description from {peer}: {e}");
                    }
                });
                if is_offer {
                    self.dispatch(CallEvent::RemoteOfferArrived(peer));
                }
            }
            // Candidates bypass the machine entirely.
            PeerMessage::Candidate(candidate) => self.media.add_remote_candidate(candidate),
        }
    }

    fn process_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::LocalCandidateDiscovered(candidate) => {
                let Some(peer) = self.machine.peer() else {
                    debug!("dropping local candidate, no call in progress");
                    return;
                };
                self.push_peer_message(peer, PeerMessage::Candidate(candidate));
            }
            MediaEvent::ConnectionStateChanged(state) => {
                debug!("media connection state changed: {state:?}");
            }
        }
    }

    /// Feed one event through the machine, report the state diff to
    /// telephony, then execute the produced commands in order.
    fn dispatch(&mut self, event: CallEvent) {
        let before = self.machine.state();
        let commands = self.machine.process(event);
        let after = self.machine.state();

        if after != before {
            self.note_transition(before, after);
        }
        for command in commands {
            self.execute(command);
        }
    }

    fn note_transition(&mut self, before: CallState, after: CallState) {
        debug!("call state {before:?} -> {after:?}");

        self.direction = match after {
            CallState::Calling(_) => Some(CallDirection::Outgoing),
            CallState::Called(_) => Some(CallDirection::Incoming),
            CallState::Connected(_) => self.direction,
            CallState::Idle => None,
        };

        // Publish before any side effect becomes observable; all
        // receivers may be gone, snapshots are best-effort.
        let _ = self.snapshot_tx.send(CallSnapshot {
            state: after,
            direction: self.direction,
            since: Utc::now(),
        });

        match (before, after) {
            (_, CallState::Calling(peer)) => {
                let telephony = self.telephony.clone();
                tokio::spawn(async move {
                    telephony.report_outgoing_call_started(peer).await;
                });
            }
            (_, CallState::Called(peer)) => {
                let telephony = self.telephony.clone();
                tokio::spawn(async move {
                    if let Err(e) = telephony.report_incoming_call(peer).await {
                        warn!("failed to report incoming call from {peer}: {e}");
                    }
                });
            }
            (
                CallState::Calling(peer) | CallState::Called(peer) | CallState::Connected(peer),
                CallState::Idle,
            ) => {
                let telephony = self.telephony.clone();
                tokio::spawn(async move {
                    if let Err(e) = telephony.request_end_call(peer).await {
                        warn!("failed to end call with {peer}: {e}");
                    }
                });
            }
            _ => {}
        }
    }

    fn execute(&mut self, command: Command) {
        debug!("executing {command:?}");
        match command {
            Command::PushCallRequest(peer) => self.push_control(SignalKind::Call, peer),
            Command::PushPickUp(peer) => self.push_control(SignalKind::PickUp, peer),
            Command::PushHangUp(peer) => self.push_hang_up(peer),
            Command::PushOffer(peer) => self.push_description(peer, SdpType::Offer),
            Command::PushAnswer(peer) => self.push_description(peer, SdpType::Answer),
        }
    }

    fn push_control(&self, kind: SignalKind, peer: PeerId) {
        let channel = self.channel.clone();
        tokio::spawn(async move {
            let outcome = channel.push(kind.tag_name(), json!({ "mate": peer })).await;
            log_push_outcome(kind, peer, outcome);
        });
    }

    fn push_hang_up(&self, peer: PeerId) {
        let channel = self.channel.clone();
        let media = self.media.clone();
        tokio::spawn(async move {
            let outcome = channel
                .push(SignalKind::HangUp.tag_name(), json!({ "mate": peer }))
                .await;
            log_push_outcome(SignalKind::HangUp, peer, outcome);
            // The call is over however the push went.
            media.close();
        });
    }

    /// Ask the media engine for a description, then forward it to the
    /// peer. The task keeps its own peer id: by the time production
    /// finishes the machine may already be in another call.
    fn push_description(&self, peer: PeerId, kind: SdpType) {
        let channel = self.channel.clone();
        let media = self.media.clone();
        tokio::spawn(async move {
            let produced = match kind {
                SdpType::Offer => media.produce_offer().await,
                SdpType::Answer => media.produce_answer().await,
            };
            match produced {
                Ok(description) => {
                    send_peer_message(channel, peer, PeerMessage::Sdp(description)).await;
                }
                Err(e) => warn!("failed to produce {kind:?} for {peer}: {e}"),
            }
        });
    }

    fn push_peer_message(&self, peer: PeerId, message: PeerMessage) {
        let channel = self.channel.clone();
        tokio::spawn(async move {
            send_peer_message(channel, peer, message).await;
        });
    }
}

async fn send_peer_message(channel: Arc<dyn SignalChannel>, peer: PeerId, message: PeerMessage) {
    let payload = json!({ "mate": peer, "body": message.encode() });
    let outcome = channel.push(SignalKind::PeerMessage.tag_name(), payload).await;
    log_push_outcome(SignalKind::PeerMessage, peer, outcome);
}

fn log_push_outcome(kind: SignalKind, peer: PeerId, outcome: PushOutcome) {
    match outcome.into_result() {
        Ok(()) => debug!("pushed {kind} to {peer}"),
        Err(e) => warn!("failed to push {kind} to {peer}: {e}"),
    }
}
