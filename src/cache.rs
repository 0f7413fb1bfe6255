//! Memoized service clients.
//!
//! Each [`ClientManager`](crate::client_manager::ClientManager) owns one
//! `ClientCache`, so two managers never share a client even when the same
//! plugin builds them. Entries live as long as the owning cache; there is no
//! invalidation.
//!
//! The cache needs `&mut` access to populate a slot. Sharing a manager across
//! threads requires an external lock; without one, concurrent first accesses
//! could each build the client.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque client object; typed access goes through `Arc::downcast`.
pub type ServiceHandle = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct ClientCache {
    clients: HashMap<String, ServiceHandle>,
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("clients", &self.names())
            .finish()
    }
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<ServiceHandle> {
        self.clients.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clients.contains_key(name)
    }

    /// Store `handle` unless the slot is already filled; returns the stored
    /// handle either way.
    pub fn insert_if_absent(&mut self, name: &str, handle: ServiceHandle) -> ServiceHandle {
        self.clients
            .entry(name.to_string())
            .or_insert(handle)
            .clone()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_the_stored_handle() {
        let mut cache = ClientCache::new();
        assert!(cache.get("compute").is_none());

        let stored = cache.insert_if_absent("compute", Arc::new("client-1".to_string()));
        let first = cache.get("compute").unwrap();
        let second = cache.get("compute").unwrap();

        assert!(Arc::ptr_eq(&stored, &first));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.downcast_ref::<String>().unwrap(), "client-1");
    }

    #[test]
    fn test_caches_are_independent() {
        let mut one = ClientCache::new();
        let mut two = ClientCache::new();

        let a = one.insert_if_absent("network", Arc::new(1u32));
        let b = two.insert_if_absent("network", Arc::new(1u32));

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(one.names(), vec!["network"]);
        assert!(two.contains("network"));
    }

    #[test]
    fn test_first_insert_wins() {
        let mut cache = ClientCache::new();
        let first: ServiceHandle = Arc::new(1u32);
        let second: ServiceHandle = Arc::new(2u32);

        cache.insert_if_absent("volume", first.clone());
        let stored = cache.insert_if_absent("volume", second);
        assert!(Arc::ptr_eq(&stored, &first));
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
    }
}
