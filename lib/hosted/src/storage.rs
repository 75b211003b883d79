//! Persistence of the signed-in session between page loads.
//!
//! The session is stored as JSON under a single key. In the browser this is
//! `localStorage`; elsewhere an in-memory slot is used.

use roofclaim_platform_access::ProviderError;
use std::sync::{Mutex, PoisonError};

/// Key/value slot holding the serialized session.
pub trait SessionStorage: Send + Sync {
    /// Returns the stored value, if any.
    fn load(&self) -> Result<Option<String>, ProviderError>;

    /// Replaces the stored value.
    fn save(&self, value: &str) -> Result<(), ProviderError>;

    /// Removes the stored value.
    fn clear(&self) -> Result<(), ProviderError>;
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    value: Mutex<Option<String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, ProviderError> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, value: &str) -> Result<(), ProviderError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ProviderError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// The browser's `localStorage`.
///
/// The storage handle is not `Send`, so it is looked up on every call.
#[cfg(feature = "browser")]
#[derive(Debug, Clone)]
pub struct LocalStorage {
    key: String,
}

#[cfg(feature = "browser")]
impl LocalStorage {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn storage() -> Result<web_sys::Storage, ProviderError> {
        let unavailable = |reason: &str| ProviderError::Storage {
            reason: reason.to_string(),
        };
        web_sys::window()
            .ok_or_else(|| unavailable("no window"))?
            .local_storage()
            .map_err(|_| unavailable("localStorage access denied"))?
            .ok_or_else(|| unavailable("localStorage unavailable"))
    }
}

#[cfg(feature = "browser")]
impl SessionStorage for LocalStorage {
    fn load(&self) -> Result<Option<String>, ProviderError> {
        Self::storage()?
            .get_item(&self.key)
            .map_err(|_| ProviderError::Storage {
                reason: format!("failed to read '{}'", self.key),
            })
    }

    fn save(&self, value: &str) -> Result<(), ProviderError> {
        Self::storage()?
            .set_item(&self.key, value)
            .map_err(|_| ProviderError::Storage {
                reason: format!("failed to write '{}'", self.key),
            })
    }

    fn clear(&self) -> Result<(), ProviderError> {
        Self::storage()?
            .remove_item(&self.key)
            .map_err(|_| ProviderError::Storage {
                reason: format!("failed to remove '{}'", self.key),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load(), Ok(None));

        storage.save("{\"user_id\":\"u1\"}").expect("save");
        assert_eq!(storage.load(), Ok(Some("{\"user_id\":\"u1\"}".to_string())));

        storage.clear().expect("clear");
        assert_eq!(storage.load(), Ok(None));
    }
}
