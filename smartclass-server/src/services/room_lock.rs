use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per room id.
///
/// Mutations of the same room are serialized; rooms never wait on each other.
/// The registry lock is only held while looking up or evicting a room entry, and an
/// entry lives only while some caller holds or waits for it.
#[derive(Default)]
pub struct RoomLocks {
    locks: SyncMutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Exclusive access to one room, released on drop.
pub struct RoomGuard<'a> {
    locks: &'a RoomLocks,
    room_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other caller holds `room_id`.
    pub async fn lock(&self, room_id: &str) -> RoomGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(room_id.to_string()).or_default().clone()
        };

        RoomGuard {
            locks: self,
            room_id: room_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of rooms currently held or waited on.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, room_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        // clones are only taken under the registry lock, so a count of one means
        // nobody holds or waits for this room
        if locks.get(room_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(room_id);
        }
    }
}

impl Drop for RoomGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.room_id);
    }
}
