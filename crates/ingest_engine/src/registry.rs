use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use ingest_core::AttachmentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailStatus {
    NotRequested,
    Pending,
    Delivered,
    Failed,
}

/// Live attachment ids and their thumbnail state.
///
/// Late callbacks look their id up here instead of holding a reference to the
/// attachment, so removing an id is always safe. Removal is checked when a thumbnail
/// is claimed for delivery; a delivery claimed before [`AttachmentRegistry::remove`]
/// still completes. Delivery callbacks run after the registry lock is released and
/// may call back into the registry.
#[derive(Debug, Default)]
pub struct AttachmentRegistry {
    entries: Mutex<HashMap<AttachmentId, ThumbnailStatus>>,
}

impl AttachmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AttachmentId, ThumbnailStatus>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(&self, id: AttachmentId) {
        self.lock().insert(id, ThumbnailStatus::NotRequested);
    }

    /// Forgets `id`. Returns `false` if it was not registered.
    pub fn remove(&self, id: AttachmentId) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn contains(&self, id: AttachmentId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn thumbnail_status(&self, id: AttachmentId) -> Option<ThumbnailStatus> {
        self.lock().get(&id).copied()
    }

    pub(crate) fn mark_pending(&self, id: AttachmentId) -> bool {
        match self.lock().get_mut(&id) {
            Some(status) => {
                *status = ThumbnailStatus::Pending;
                true
            }
            None => false,
        }
    }

    pub(crate) fn mark_failed(&self, id: AttachmentId) {
        if let Some(status) = self.lock().get_mut(&id) {
            *status = ThumbnailStatus::Failed;
        }
    }

    /// Runs `deliver` if `id` is still registered with a pending thumbnail.
    pub(crate) fn deliver_thumbnail(&self, id: AttachmentId, deliver: impl FnOnce()) -> bool {
        let claimed = match self.lock().get_mut(&id) {
            Some(status) if *status == ThumbnailStatus::Pending => {
                *status = ThumbnailStatus::Delivered;
                true
            }
            _ => false,
        };
        if claimed {
            deliver();
        }
        claimed
    }
}
