//! Actor Registry
//!
//! Maps a logical name to the ordered pool of instances registered under it.
//! Structural changes take the write lock; routing takes the read lock, so
//! steady-state sends never serialize against each other.

use crate::error::{ActorError, Result};
use crate::instance::ActorHandle;
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Unique actor instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId {
    id: Uuid,
}

impl ActorId {
    /// Create new actor ID
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// Create from UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self { id }
    }

    /// Get UUID
    pub fn uuid(&self) -> Uuid {
        self.id
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.id.simple())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

/// Name → pool mapping as seen by routers
///
/// A name is present only while its pool is non-empty.
pub type Pools = HashMap<String, Vec<Arc<ActorHandle>>>;

/// Registry of live actor instances grouped into named pools
#[derive(Default)]
pub struct ActorRegistry {
    pools: RwLock<Pools>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instance to its pool, creating the pool if absent
    pub fn add(&self, handle: Arc<ActorHandle>) {
        let name = handle.name().to_string();
        let mut pools = self.pools.write();
        let pool = pools.entry(name.clone()).or_default();
        pool.push(handle);
        debug!(
            actor_name = %name,
            pool_size = pool.len(),
            "Registered actor instance"
        );
    }

    /// Remove one instance from its pool and signal it to terminate
    ///
    /// The signal is posted while the write lock is held, so no router can
    /// observe the instance between termination and removal. The pool entry
    /// is deleted when its last member leaves.
    pub fn remove(&self, name: &str, id: &ActorId) -> Result<Arc<ActorHandle>> {
        let mut pools = self.pools.write();
        let pool = pools
            .get_mut(name)
            .ok_or_else(|| ActorError::not_found(name))?;

        let index = pool
            .iter()
            .position(|handle| handle.id() == id)
            .ok_or_else(|| ActorError::instance_not_found(name, *id))?;

        let handle = pool.remove(index);
        handle.terminate();

        if pool.is_empty() {
            pools.remove(name);
            debug!(actor_name = %name, "Removed last instance; pool deleted");
        }

        Ok(handle)
    }

    /// Signal every registered instance to terminate and clear the registry
    ///
    /// Returns how many instances were signalled. Does not wait for any loop
    /// thread to stop.
    pub fn terminate_all(&self) -> usize {
        let mut pools = self.pools.write();
        let mut signalled = 0;
        for handle in pools.values().flatten() {
            handle.terminate();
            signalled += 1;
        }
        pools.clear();
        signalled
    }

    /// Shared view of all pools for routing
    pub fn read(&self) -> RwLockReadGuard<'_, Pools> {
        self.pools.read()
    }

    /// Copy of one pool, in insertion order
    pub fn snapshot(&self, name: &str) -> Option<Vec<Arc<ActorHandle>>> {
        self.pools.read().get(name).cloned()
    }

    /// Find a registered instance by identity
    pub fn find(&self, id: &ActorId) -> Option<Arc<ActorHandle>> {
        self.pools
            .read()
            .values()
            .flatten()
            .find(|handle| handle.id() == id)
            .cloned()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pools.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Total registered instances across all pools
    pub fn len(&self) -> usize {
        self.pools.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.read().is_empty()
    }
}

impl fmt::Debug for ActorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRegistry")
            .field("names", &self.names())
            .field("instances", &self.len())
            .finish()
    }
}
