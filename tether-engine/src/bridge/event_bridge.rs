use crate::bridge::Event;
use crate::executor::CommandOutcome;
use crate::transport::{TransportEvent, TransportHandler};
use std::sync::{Arc, Mutex, PoisonError};
use tether_core::{PeerId, TrackRef};
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

/// Items travelling on the engine's single ordered stream.
#[derive(Debug)]
pub enum Bridged {
    Event(Event),

    /// The connection for this peer is gone; no further events of it follow.
    Detached(PeerId),

    /// A command succeeded. Applied to state even while not listening.
    Completed(CommandOutcome),

    /// Acknowledged once everything queued before it has been applied.
    Flush(oneshot::Sender<()>),
}

type Sink = Arc<Mutex<Option<mpsc::UnboundedSender<Bridged>>>>;

/// Fan-in point between transport callbacks, the executor and the engine task.
#[derive(Clone)]
pub struct EventBridge {
    tx: mpsc::UnboundedSender<Bridged>,
}

impl EventBridge {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Bridged>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, event: Event) {
        if self.tx.send(Bridged::Event(event)).is_err() {
            trace!("Event stream closed, event dropped");
        }
    }

    pub(crate) fn detached(&self, peer_id: PeerId) {
        let _ = self.tx.send(Bridged::Detached(peer_id));
    }

    pub(crate) fn completed(&self, outcome: CommandOutcome) {
        let _ = self.tx.send(Bridged::Completed(outcome));
    }

    /// Returns false when the engine task is gone.
    pub(crate) fn flush(&self, ack: oneshot::Sender<()>) -> bool {
        self.tx.send(Bridged::Flush(ack)).is_ok()
    }

    /// Creates the handler a new connection reports through, bound to `peer_id`.
    ///
    /// Events leave the handler in the order the transport invoked it. Once the
    /// returned [`Listener`] is detached the handler goes silent.
    pub fn listener(&self, peer_id: PeerId) -> (TransportHandler, Listener) {
        let sink: Sink = Arc::new(Mutex::new(Some(self.tx.clone())));

        let handler_sink = sink.clone();
        let handler_peer = peer_id.clone();
        let handler: TransportHandler = Arc::new(move |event: TransportEvent| {
            let guard = handler_sink.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(tx) = guard.as_ref() else {
                trace!("Listener for {} detached, dropping {:?}", handler_peer, event);
                return;
            };
            let _ = tx.send(Bridged::Event(translate(&handler_peer, event)));
        });

        (handler, Listener { peer_id, sink })
    }
}

fn translate(peer_id: &PeerId, event: TransportEvent) -> Event {
    let peer_id = peer_id.clone();
    match event {
        TransportEvent::CandidateGenerated(candidate) => {
            Event::IceCandidateGenerated { candidate, peer_id }
        }
        TransportEvent::SignalingStateChanged(state) => {
            Event::SignalingStateChanged { state, peer_id }
        }
        TransportEvent::ConnectionStateChanged(state) => {
            Event::ConnectionStateChanged { state, peer_id }
        }
        TransportEvent::IceStateChanged(state) => Event::IceStateChanged { state, peer_id },
        TransportEvent::TrackAdded {
            id,
            stream_id,
            kind,
        } => Event::TrackAdded {
            track: TrackRef::new(peer_id, id, stream_id, kind),
        },
        TransportEvent::TrackRemoved { .. } => Event::TrackRemoved { peer_id },
    }
}

/// Owner side of a connection's handler.
pub struct Listener {
    peer_id: PeerId,
    sink: Sink,
}

impl Listener {
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// Silences the handler. Waits for an in-flight publish to finish.
    pub fn detach(&self) {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_attached(&self) -> bool {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.detach();
    }
}
