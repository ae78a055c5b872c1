//! Advisory per-media locks.

use crate::error::{ClipwiseError, Result};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Media ids with a download or split in flight.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `media_id`. Fails with `InProgress` while another guard holds it.
    pub fn acquire(&self, media_id: &str) -> Result<InFlightGuard> {
        let mut ids = self
            .ids
            .lock()
            .map_err(|_| ClipwiseError::Unknown("in-flight registry lock poisoned".into()))?;

        if !ids.insert(media_id.to_string()) {
            return Err(ClipwiseError::InProgress(media_id.to_string()));
        }

        debug!("Acquired in-flight lock for {}", media_id);
        Ok(InFlightGuard {
            ids: Arc::clone(&self.ids),
            media_id: media_id.to_string(),
        })
    }

    pub fn is_in_flight(&self, media_id: &str) -> bool {
        self.ids
            .lock()
            .map(|ids| ids.contains(media_id))
            .unwrap_or(false)
    }
}

/// Releases its media id on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    ids: Arc<Mutex<HashSet<String>>>,
    media_id: String,
}

impl InFlightGuard {
    pub fn media_id(&self) -> &str {
        &self.media_id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut ids) = self.ids.lock() {
            ids.remove(&self.media_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let registry = InFlightRegistry::new();

        let guard = registry.acquire("abc").unwrap();
        assert!(registry.is_in_flight("abc"));
        assert!(matches!(registry.acquire("abc"), Err(ClipwiseError::InProgress(_))));

        let other = registry.acquire("xyz").unwrap();
        assert_eq!(other.media_id(), "xyz");

        drop(guard);
        assert!(!registry.is_in_flight("abc"));
        assert!(registry.acquire("abc").is_ok());
    }
}
