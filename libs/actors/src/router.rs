//! Routing and Load Balancing
//!
//! A [`Router`] resolves a target name to one live instance using the
//! registry's pools; a [`Balancer`] picks the member of a non-empty pool.
//! Both are extension points: any policy satisfying the contracts below can
//! be plugged into an [`crate::ActorSystem`] through its builder.

use crate::error::{ActorError, Result};
use crate::instance::ActorHandle;
use crate::registry::Pools;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Resolves a name to the instance that should receive a message
pub trait Router: Send + Sync + Debug {
    /// Route `name` against the current pools
    ///
    /// Called with the registry's read lock held; must not block.
    fn route(&self, name: &str, pools: &Pools) -> Result<Arc<ActorHandle>>;
}

/// Selects one member of a pool
pub trait Balancer: Send + Sync + Debug {
    /// Choose from `pool`, which is never empty
    fn choose<'a>(&self, name: &str, pool: &'a [Arc<ActorHandle>]) -> &'a Arc<ActorHandle>;
}

/// Exact-name router; no prefix or wildcard matching
#[derive(Debug)]
pub struct FullNameRouter {
    balancer: Box<dyn Balancer>,
}

impl FullNameRouter {
    /// Router with a custom balancer
    pub fn with_balancer(balancer: Box<dyn Balancer>) -> Self {
        Self { balancer }
    }

    /// Router with the default uniform-random balancer
    pub fn random() -> Self {
        Self::with_balancer(Box::new(RandomBalancer::new()))
    }
}

impl Default for FullNameRouter {
    fn default() -> Self {
        Self::random()
    }
}

impl Router for FullNameRouter {
    fn route(&self, name: &str, pools: &Pools) -> Result<Arc<ActorHandle>> {
        match pools.get(name) {
            Some(pool) if !pool.is_empty() => Ok(Arc::clone(self.balancer.choose(name, pool))),
            _ => Err(ActorError::not_found(name)),
        }
    }
}

/// Uniform-random selection from a process-local generator
#[derive(Debug)]
pub struct RandomBalancer {
    rng: Mutex<StdRng>,
}

impl RandomBalancer {
    /// Balancer seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Balancer with reproducible selection
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomBalancer {
    fn default() -> Self {
        Self::new()
    }
}

impl Balancer for RandomBalancer {
    fn choose<'a>(&self, _name: &str, pool: &'a [Arc<ActorHandle>]) -> &'a Arc<ActorHandle> {
        let index = self.rng.lock().gen_range(0..pool.len());
        &pool[index]
    }
}

/// Deterministic rotation over pool members
///
/// One cursor is shared by every name, so rotation within a single pool is
/// exact only while that pool is the sole traffic source.
#[derive(Debug, Default)]
pub struct RoundRobinBalancer {
    cursor: AtomicUsize,
}

impl RoundRobinBalancer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Balancer for RoundRobinBalancer {
    fn choose<'a>(&self, _name: &str, pool: &'a [Arc<ActorHandle>]) -> &'a Arc<ActorHandle> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % pool.len();
        &pool[index]
    }
}
