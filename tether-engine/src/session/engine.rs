use crate::bridge::{Bridged, EventBridge};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::executor::{Command, CommandExecutor, CommandOutput};
use crate::registry::ConnectionRegistry;
use crate::session::{AggregateState, Notification, Observer, Reducer};
use crate::transport::Transport;
use std::future::Future;
use std::sync::Arc;
use tether_core::{IceSignal, PeerId, SessionSignal};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace, warn};

enum Control {
    Listen(bool, oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Task that owns the aggregate state.
///
/// Consumes the bridge stream in order, feeds it through the [`Reducer`] and
/// queues the resulting notifications for the [`Observer`]. Delivery runs on
/// its own task so an observer may call back into the engine.
pub struct Engine {
    reducer: Reducer,
    notify_tx: mpsc::UnboundedSender<Notification>,
    control_rx: mpsc::Receiver<Control>,
    bridge_rx: mpsc::UnboundedReceiver<Bridged>,
    state_tx: watch::Sender<AggregateState>,
}

impl Engine {
    /// Spawns the engine task and returns the handle that drives it.
    pub fn start(
        config: EngineConfig,
        transport: Arc<dyn Transport>,
        observer: Arc<dyn Observer>,
    ) -> EngineHandle {
        let (bridge, bridge_rx) = EventBridge::new();
        let (control_tx, control_rx) = mpsc::channel(100);

        let reducer = Reducer::new(config.local_id.clone(), config.video_source.clone());
        let (state_tx, state_rx) = watch::channel(reducer.state().clone());

        let registry = ConnectionRegistry::new(transport, config.connection.clone(), bridge.clone());
        let executor = CommandExecutor::new(registry, bridge.clone(), &config);

        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        tokio::spawn(deliver(observer, notify_rx));

        let engine = Engine {
            reducer,
            notify_tx,
            control_rx,
            bridge_rx,
            state_tx,
        };
        tokio::spawn(engine.run());

        info!("Engine started for {}", config.local_id);

        EngineHandle {
            local_id: config.local_id,
            executor,
            bridge,
            control_tx,
            state_rx,
        }
    }

    async fn run(mut self) {
        debug!("Engine event loop started");

        loop {
            tokio::select! {
                control = self.control_rx.recv() => {
                    match control {
                        Some(Control::Listen(listening, ack)) => {
                            self.drain();
                            if self.reducer.set_listening(listening) {
                                info!("Listening {}", if listening { "started" } else { "stopped" });
                                self.publish_state();
                            }
                            let _ = ack.send(());
                        }
                        Some(Control::Shutdown(ack)) => {
                            self.control_rx.close();
                            self.drain();
                            let _ = ack.send(());
                            break;
                        }
                        None => {
                            info!("All engine handles dropped. Shutting down engine.");
                            break;
                        }
                    }
                }

                item = self.bridge_rx.recv() => {
                    match item {
                        Some(item) => self.handle(item),
                        None => {
                            warn!("Event stream closed unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        debug!("Engine event loop finished");
    }

    /// Applies everything already queued on the bridge.
    fn drain(&mut self) {
        while let Ok(item) = self.bridge_rx.try_recv() {
            self.handle(item);
        }
    }

    fn handle(&mut self, item: Bridged) {
        match item {
            Bridged::Event(event) => {
                if !self.reducer.state().listening {
                    trace!("Not listening, dropping {:?}", event);
                    return;
                }
                let notifications = self.reducer.apply(event);
                self.publish_state();
                for notification in notifications {
                    if self.notify_tx.send(notification).is_err() {
                        warn!("Notification delivery task is gone");
                    }
                }
            }

            Bridged::Completed(outcome) => {
                self.reducer.complete(&outcome);
                self.publish_state();
            }

            Bridged::Detached(peer_id) => {
                if self.reducer.forget(&peer_id) {
                    debug!("Peer state for {} removed", peer_id);
                    self.publish_state();
                }
            }

            Bridged::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    fn publish_state(&self) {
        let state = self.reducer.state();
        self.state_tx.send_if_modified(|current| {
            if current == state {
                return false;
            }
            *current = state.clone();
            true
        });
    }
}

/// Hands notifications to the observer one at a time, in the order the engine
/// produced them. Ends once the engine task drops its sender.
async fn deliver(observer: Arc<dyn Observer>, mut rx: mpsc::UnboundedReceiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        observer.notify(notification).await;
    }
    trace!("Notification delivery finished");
}

/// Cloneable front door to a running [`Engine`].
///
/// Every command returns only after its effect on the aggregate state has been
/// applied, so a snapshot taken afterwards reflects it. Observer notifications
/// are delivered asynchronously and may arrive after the command returns.
#[derive(Clone)]
pub struct EngineHandle {
    local_id: PeerId,
    executor: CommandExecutor,
    bridge: EventBridge,
    control_tx: mpsc::Sender<Control>,
    state_rx: watch::Receiver<AggregateState>,
}

impl EngineHandle {
    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        self.executor.registry()
    }

    pub fn is_running(&self) -> bool {
        !self.control_tx.is_closed()
    }

    pub async fn execute(&self, command: Command) -> Result<CommandOutput> {
        self.applied(self.executor.execute(command)).await
    }

    pub async fn create_connection(&self, peer_id: &PeerId) -> Result<()> {
        self.applied(self.executor.create_connection(peer_id)).await
    }

    pub async fn remove_connection(&self, peer_id: &PeerId) -> Result<()> {
        self.applied(async {
            self.executor.remove_connection(peer_id).await;
            Ok(())
        })
        .await
    }

    /// Returns the offer to forward to `peer_id`.
    pub async fn create_offer(&self, peer_id: &PeerId) -> Result<SessionSignal> {
        self.applied(self.executor.create_offer(peer_id)).await
    }

    /// Returns the answer to forward to the offer's sender.
    pub async fn set_remote_offer(&self, offer: &SessionSignal) -> Result<SessionSignal> {
        self.applied(self.executor.set_remote_offer(offer)).await
    }

    pub async fn set_remote_answer(&self, answer: &SessionSignal) -> Result<()> {
        self.applied(self.executor.set_remote_answer(answer)).await
    }

    pub async fn add_ice_candidate(&self, candidate: &IceSignal) -> Result<()> {
        self.applied(self.executor.add_ice_candidate(candidate)).await
    }

    pub async fn start_listening(&self) -> Result<()> {
        self.control(|ack| Control::Listen(true, ack)).await
    }

    pub async fn stop_listening(&self) -> Result<()> {
        self.control(|ack| Control::Listen(false, ack)).await
    }

    pub fn snapshot(&self) -> AggregateState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregateState> {
        self.state_rx.clone()
    }

    /// Closes every connection, applies what is still queued and stops the
    /// engine task. Later commands fail with [`EngineError::Stopped`].
    pub async fn shutdown(&self) -> Result<()> {
        if !self.is_running() {
            return Err(EngineError::Stopped);
        }
        self.registry().close_all().await;
        self.control(Control::Shutdown).await?;
        info!("Engine for {} shut down", self.local_id);
        Ok(())
    }

    async fn control(&self, make: impl FnOnce(oneshot::Sender<()>) -> Control) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.control_tx
            .send(make(ack_tx))
            .await
            .map_err(|_| EngineError::Stopped)?;
        ack_rx.await.map_err(|_| EngineError::Stopped)
    }

    /// Runs `op` and waits until the engine task has applied what it queued.
    async fn applied<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        if !self.is_running() {
            return Err(EngineError::Stopped);
        }
        let output = op.await;

        let (ack_tx, ack_rx) = oneshot::channel();
        if !self.bridge.flush(ack_tx) || ack_rx.await.is_err() {
            debug!("Engine stopped before the command's effects were applied");
        }
        output
    }
}
