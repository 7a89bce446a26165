use crate::bridge::{Event, EventBridge, Listener};
use crate::config::ConnectionConfig;
use crate::error::TransportError;
use crate::transport::{PeerConnection, Transport};
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use tether_core::PeerId;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

pub(crate) struct Entry {
    connection: Arc<dyn PeerConnection>,
    listener: Listener,
}

type Slot = Arc<Mutex<Option<Entry>>>;

struct RegistryInner {
    slots: DashMap<PeerId, Slot>,
    transport: Arc<dyn Transport>,
    config: ConnectionConfig,
    bridge: EventBridge,
}

impl RegistryInner {
    /// Drops the slot for `peer_id` if it is empty and nobody else holds it.
    fn reclaim(&self, peer_id: &PeerId) {
        self.slots.remove_if(peer_id, |_, slot| {
            Arc::strong_count(slot) == 1 && slot.try_lock().is_ok_and(|entry| entry.is_none())
        });
    }
}

/// Owns every peer connection, keyed by peer id.
///
/// Each id has its own async lock: operations on one id run strictly one after
/// another, different ids proceed concurrently.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: ConnectionConfig,
        bridge: EventBridge,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                slots: DashMap::new(),
                transport,
                config,
                bridge,
            }),
        }
    }

    /// Ensures a connection exists for `peer_id`. Returns false if the transport
    /// could not allocate one; no entry is left behind in that case.
    pub async fn create(&self, peer_id: &PeerId) -> bool {
        let mut lock = self.lock(peer_id).await;
        self.create_locked(&mut lock).await.is_ok()
    }

    /// Closes and forgets the connection for `peer_id`, if any.
    ///
    /// `TrackRemoved` is published for the id either way.
    pub async fn remove(&self, peer_id: &PeerId) {
        let mut lock = self.lock(peer_id).await;

        match lock.take() {
            Some(entry) => {
                entry.listener.detach();
                if let Err(e) = entry.connection.close().await {
                    warn!("Failed to close connection for {}: {}", peer_id, e);
                }
                info!("Removed connection for {}", peer_id);
            }
            None => debug!("No connection for {}, nothing to close", peer_id),
        }

        self.inner.bridge.publish(Event::TrackRemoved {
            peer_id: peer_id.clone(),
        });
        self.inner.bridge.detached(peer_id.clone());
    }

    pub async fn contains(&self, peer_id: &PeerId) -> bool {
        let Some(slot) = self.inner.slots.get(peer_id).map(|s| s.value().clone()) else {
            return false;
        };
        self.occupied(peer_id, slot).await
    }

    pub async fn peer_ids(&self) -> Vec<PeerId> {
        let slots: Vec<(PeerId, Slot)> = self
            .inner
            .slots
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let mut ids = Vec::with_capacity(slots.len());
        for (peer_id, slot) in slots {
            if self.occupied(&peer_id, slot).await {
                ids.push(peer_id);
            }
        }
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.peer_ids().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes every connection.
    pub async fn close_all(&self) {
        let ids = self.peer_ids().await;
        info!("Closing {} connection(s)", ids.len());
        join_all(ids.iter().map(|peer_id| self.remove(peer_id))).await;
    }

    /// Waits for the slot and reports whether it holds a connection. An empty
    /// slot is reclaimed once this reader lets go of it, since a lock released
    /// while the reader held the slot could not reclaim it.
    async fn occupied(&self, peer_id: &PeerId, slot: Slot) -> bool {
        let occupied = slot.lock().await.is_some();
        if !occupied {
            drop(slot);
            self.inner.reclaim(peer_id);
        }
        occupied
    }

    pub(crate) async fn lock(&self, peer_id: &PeerId) -> PeerLock<'_> {
        let slot = self
            .inner
            .slots
            .entry(peer_id.clone())
            .or_default()
            .clone();

        PeerLock {
            registry: &self.inner,
            peer_id: peer_id.clone(),
            guard: Some(slot.lock_owned().await),
        }
    }

    /// Creates the connection under an already held lock. No-op if one exists.
    pub(crate) async fn create_locked(&self, lock: &mut PeerLock<'_>) -> Result<(), TransportError> {
        if lock.connection().is_some() {
            debug!("Connection for {} already exists", lock.peer_id);
            return Ok(());
        }

        let (handler, listener) = self.inner.bridge.listener(lock.peer_id.clone());

        match self
            .inner
            .transport
            .create_connection(&self.inner.config, handler)
            .await
        {
            Ok(connection) => {
                info!("Created connection for {}", lock.peer_id);
                lock.insert(Entry {
                    connection,
                    listener,
                });
                Ok(())
            }
            Err(e) => {
                warn!("Failed to create connection for {}: {}", lock.peer_id, e);
                Err(e)
            }
        }
    }
}

/// Exclusive access to one peer's slot. Empty slots are reclaimed on drop.
pub(crate) struct PeerLock<'a> {
    registry: &'a RegistryInner,
    peer_id: PeerId,
    guard: Option<OwnedMutexGuard<Option<Entry>>>,
}

impl PeerLock<'_> {
    pub(crate) fn connection(&self) -> Option<Arc<dyn PeerConnection>> {
        self.guard
            .as_ref()
            .and_then(|entry| entry.as_ref())
            .map(|entry| entry.connection.clone())
    }

    fn insert(&mut self, entry: Entry) {
        if let Some(guard) = self.guard.as_mut() {
            **guard = Some(entry);
        }
    }

    fn take(&mut self) -> Option<Entry> {
        self.guard.as_mut().and_then(|guard| guard.take())
    }
}

impl Drop for PeerLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.registry.reclaim(&self.peer_id);
    }
}
