//! Actor System Core
//!
//! The façade composing registry, router and dead-letter sink behind the
//! public operations: register, unregister, fire-and-forget send,
//! request/response send and shutdown.
//!
//! # Lock discipline
//!
//! The registry's name → pool map is the only shared mutable structure.
//! `add_actor`, `remove_actor` and `shutdown` take it exclusively; routing
//! takes it shared and releases it before any envelope is pushed or any
//! caller blocks on a response slot.

use crate::config::{BalancerKind, SystemConfig};
use crate::dead_letter::{DeadLetterSink, LoggingDeadLetterSink};
use crate::error::{ActorError, Result};
use crate::instance::{spawn_instance, ActorHandle, ActorStatus};
use crate::messages::{Envelope, MessageKind, Payload, Reply};
use crate::metrics::SystemMetrics;
use crate::registry::{ActorId, ActorRegistry};
use crate::router::{Balancer, FullNameRouter, RandomBalancer, RoundRobinBalancer, Router};

use crossbeam_channel::RecvTimeoutError;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Behavior implemented by every actor type
///
/// All three hooks run on the instance's own loop thread. `receive` is
/// called once per message, in mailbox order, never concurrently with
/// itself. A behavior that blocks indefinitely in `receive` starves its own
/// mailbox.
pub trait ActorBehavior: Send + 'static {
    /// Called once before the first message
    fn on_plugin(&mut self, _system: &ActorSystem) {}

    /// Handle one message; the reply is delivered only for `Require`
    fn receive(&mut self, system: &ActorSystem, kind: MessageKind, payload: Payload) -> Reply;

    /// Called once, best-effort, after the loop stops
    fn on_pullout(&mut self, _system: &ActorSystem) {}
}

struct SystemInner {
    system_id: String,
    registry: ActorRegistry,
    router: Box<dyn Router>,
    dead_letters: Box<dyn DeadLetterSink>,
    metrics: Arc<SystemMetrics>,
    config: SystemConfig,
}

/// Handle to an actor system
///
/// Cloning is cheap and every clone addresses the same system. There is no
/// global instance; the embedding program constructs one and passes it
/// around explicitly.
#[derive(Clone)]
pub struct ActorSystem {
    inner: Arc<SystemInner>,
}

/// Non-owning back-reference held by actor instances
///
/// Never extends the system's lifetime.
#[derive(Clone)]
pub struct WeakActorSystem {
    inner: Weak<SystemInner>,
}

impl WeakActorSystem {
    pub fn upgrade(&self) -> Option<ActorSystem> {
        self.inner.upgrade().map(|inner| ActorSystem { inner })
    }
}

impl fmt::Debug for WeakActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakActorSystem")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Default for ActorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorSystem {
    /// Create a system with the full-name router, random balancer and
    /// logging dead-letter sink
    pub fn new() -> Self {
        Self::assemble(
            SystemConfig::default(),
            Box::new(FullNameRouter::random()),
            Box::new(LoggingDeadLetterSink::new()),
        )
    }

    /// Create a system whose router follows the configured balancer
    pub fn from_config(config: SystemConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ActorSystemBuilder {
        ActorSystemBuilder::default()
    }

    fn assemble(config: SystemConfig, router: Box<dyn Router>, dead_letters: Box<dyn DeadLetterSink>) -> Self {
        let system_id = format!("system-{}", Uuid::new_v4().simple());
        info!(
            system_id = %system_id,
            router = ?router,
            dead_letters = ?dead_letters,
            "Creating new actor system"
        );

        Self {
            inner: Arc::new(SystemInner {
                system_id,
                registry: ActorRegistry::new(),
                router,
                dead_letters,
                metrics: Arc::new(SystemMetrics::default()),
                config,
            }),
        }
    }

    pub fn system_id(&self) -> &str {
        &self.inner.system_id
    }

    pub fn config(&self) -> &SystemConfig {
        &self.inner.config
    }

    /// Get system metrics
    pub fn metrics(&self) -> Arc<SystemMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn downgrade(&self) -> WeakActorSystem {
        WeakActorSystem {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Register a behavior under `name` and start its loop thread
    ///
    /// Returns as soon as the thread exists; `on_plugin` runs on that thread
    /// asynchronously. Many instances may share one name, forming a pool.
    pub fn add_actor<B>(&self, name: impl Into<String>, behavior: B) -> Result<ActorId>
    where
        B: ActorBehavior,
    {
        self.add_boxed_actor(name, Box::new(behavior))
    }

    /// Register an already boxed behavior
    pub fn add_boxed_actor(&self, name: impl Into<String>, behavior: Box<dyn ActorBehavior>) -> Result<ActorId> {
        let name = name.into();
        let handle = spawn_instance(
            &name,
            behavior,
            self.downgrade(),
            self.metrics(),
            &self.inner.config,
        )?;
        let id = *handle.id();

        self.inner.registry.add(handle);
        self.inner.metrics.record_spawned();

        info!(
            actor_id = %id,
            actor_name = %name,
            system_id = %self.inner.system_id,
            "Actor spawned"
        );
        Ok(id)
    }

    /// Unregister one instance and signal it to terminate
    ///
    /// Does not wait for the loop to stop; messages already queued ahead of
    /// the signal are still processed.
    pub fn remove_actor(&self, name: &str, id: &ActorId) -> Result<()> {
        match self.inner.registry.remove(name, id) {
            Ok(handle) => {
                info!(
                    actor_id = %handle.id(),
                    actor_name = %name,
                    pending = handle.pending(),
                    "Actor removed"
                );
                Ok(())
            }
            Err(e) => {
                warn!(actor_id = %id, actor_name = %name, error = %e, "Attempted to remove unknown actor");
                Err(e)
            }
        }
    }

    /// Resolve `name` to the instance the router would pick right now
    pub fn route(&self, name: &str) -> Result<ActorId> {
        self.resolve(name).map(|handle| *handle.id())
    }

    fn resolve(&self, name: &str) -> Result<Arc<ActorHandle>> {
        let pools = self.inner.registry.read();
        self.inner.router.route(name, &pools)
    }

    fn record_push(&self, handle: &ActorHandle, discarded: usize) {
        self.inner.metrics.record_enqueued();
        if discarded > 0 {
            // Routed just as the instance exited; counts stay balanced
            self.inner.metrics.record_discarded(discarded as u64);
            debug!(
                actor_id = %handle.id(),
                actor_name = %handle.name(),
                discarded,
                "Discarded envelopes pushed after loop exit"
            );
        }
    }

    fn dead_letter(&self, name: &str, payload: Payload) {
        self.inner.metrics.record_dead_letter();
        self.inner.dead_letters.process(name, payload);
    }

    /// Fire-and-forget send
    ///
    /// An unroutable name goes to the dead-letter sink; no error reaches the
    /// caller.
    pub fn request(&self, name: &str, payload: Payload) {
        match self.resolve(name) {
            Ok(handle) => {
                let discarded = handle.push(Envelope::request(payload));
                self.record_push(&handle, discarded);
            }
            Err(_) => self.dead_letter(name, payload),
        }
    }

    /// Synchronous send; blocks the calling thread for the reply
    ///
    /// `None` waits without bound. On expiry the in-flight `receive` is not
    /// cancelled: its eventual reply is produced with no consumer and
    /// dropped.
    pub fn require(&self, name: &str, payload: Payload, timeout: Option<Duration>) -> Result<Reply> {
        let handle = match self.resolve(name) {
            Ok(handle) => handle,
            Err(e) => {
                self.dead_letter(name, payload);
                return Err(e);
            }
        };

        let (envelope, slot) = Envelope::require(payload);
        let discarded = handle.push(envelope);
        self.record_push(&handle, discarded);
        drop(handle);

        match timeout {
            None => slot.recv().map_err(|_| ActorError::abandoned(name)),
            Some(timeout) => match slot.recv_timeout(timeout) {
                Ok(reply) => Ok(reply),
                Err(RecvTimeoutError::Timeout) => {
                    self.inner.metrics.record_timeout();
                    let timeout_ms = timeout.as_millis() as u64;
                    debug!(actor_name = %name, timeout_ms, "Require timed out");
                    Err(ActorError::timeout(name, timeout_ms))
                }
                Err(RecvTimeoutError::Disconnected) => Err(ActorError::abandoned(name)),
            },
        }
    }

    /// Integer-millisecond form of [`Self::require`]
    ///
    /// A negative bound degrades to [`Self::request`] and always returns
    /// `Ok(None)`; zero or positive waits at most that long.
    pub fn require_millis(&self, name: &str, payload: Payload, timeout_millis: i64) -> Result<Reply> {
        if timeout_millis < 0 {
            self.request(name, payload);
            return Ok(None);
        }
        self.require(name, payload, Some(Duration::from_millis(timeout_millis as u64)))
    }

    /// Signal every instance to terminate and clear the registry
    ///
    /// Best-effort: returns before loops finish draining or run
    /// `on_pullout`. Later sends route to the dead-letter sink.
    pub fn shutdown(&self) -> Result<()> {
        let signalled = self.inner.registry.terminate_all();
        info!(
            system_id = %self.inner.system_id,
            signalled,
            "Actor system shutdown requested"
        );
        Ok(())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    /// Instance identities registered under `name`, in insertion order
    pub fn pool(&self, name: &str) -> Vec<ActorId> {
        self.inner
            .registry
            .snapshot(name)
            .map(|pool| pool.iter().map(|handle| *handle.id()).collect())
            .unwrap_or_default()
    }

    /// Lifecycle state of a registered instance
    pub fn status(&self, id: &ActorId) -> Option<ActorStatus> {
        self.inner.registry.find(id).map(|handle| handle.status())
    }

    /// Total registered instances across all pools
    pub fn actor_count(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }
}

impl fmt::Debug for ActorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorSystem")
            .field("system_id", &self.inner.system_id)
            .field("registry", &self.inner.registry)
            .finish()
    }
}

/// Builder for systems with custom routing or dead-letter handling
#[derive(Default)]
pub struct ActorSystemBuilder {
    config: Option<SystemConfig>,
    router: Option<Box<dyn Router>>,
    balancer: Option<Box<dyn Balancer>>,
    dead_letters: Option<Box<dyn DeadLetterSink>>,
}

impl ActorSystemBuilder {
    pub fn config(mut self, config: SystemConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the router entirely; takes precedence over [`Self::balancer`]
    pub fn router(mut self, router: impl Router + 'static) -> Self {
        self.router = Some(Box::new(router));
        self
    }

    /// Use the full-name router with this balancer
    pub fn balancer(mut self, balancer: impl Balancer + 'static) -> Self {
        self.balancer = Some(Box::new(balancer));
        self
    }

    pub fn dead_letter_sink(mut self, sink: impl DeadLetterSink + 'static) -> Self {
        self.dead_letters = Some(Box::new(sink));
        self
    }

    pub fn build(self) -> Result<ActorSystem> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let router: Box<dyn Router> = match (self.router, self.balancer) {
            (Some(router), _) => router,
            (None, Some(balancer)) => Box::new(FullNameRouter::with_balancer(balancer)),
            (None, None) => Box::new(FullNameRouter::with_balancer(configured_balancer(&config))),
        };
        let dead_letters = self
            .dead_letters
            .unwrap_or_else(|| Box::new(LoggingDeadLetterSink::new()));

        Ok(ActorSystem::assemble(config, router, dead_letters))
    }
}

fn configured_balancer(config: &SystemConfig) -> Box<dyn Balancer> {
    match (config.balancer, config.balancer_seed) {
        (BalancerKind::Random, Some(seed)) => Box::new(RandomBalancer::seeded(seed)),
        (BalancerKind::Random, None) => Box::new(RandomBalancer::new()),
        (BalancerKind::RoundRobin, _) => Box::new(RoundRobinBalancer::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    struct EchoActor;

    impl ActorBehavior for EchoActor {
        fn receive(&mut self, _system: &ActorSystem, _kind: MessageKind, payload: Payload) -> Reply {
            Some(payload)
        }
    }

    struct SleepyActor {
        delay: Duration,
    }

    impl ActorBehavior for SleepyActor {
        fn receive(&mut self, _system: &ActorSystem, _kind: MessageKind, payload: Payload) -> Reply {
            std::thread::sleep(self.delay);
            Some(payload)
        }
    }

    /// Counts messages and replies with the running total
    struct CountingActor {
        seen: Arc<AtomicUsize>,
    }

    impl ActorBehavior for CountingActor {
        fn receive(&mut self, _system: &ActorSystem, _kind: MessageKind, _payload: Payload) -> Reply {
            let total = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
            Some(Box::new(total))
        }
    }

    #[derive(Debug, Default)]
    struct RecordingSink {
        letters: Mutex<Vec<String>>,
    }

    impl DeadLetterSink for RecordingSink {
        fn process(&self, name: &str, _payload: Payload) {
            self.letters.lock().push(name.to_string());
        }
    }

    #[derive(Debug, Default, Clone)]
    struct SharedSink(Arc<RecordingSink>);

    impl DeadLetterSink for SharedSink {
        fn process(&self, name: &str, payload: Payload) {
            self.0.process(name, payload);
        }
    }

    fn reply_as<T: 'static>(reply: Reply) -> T {
        *reply.expect("reply").downcast::<T>().expect("reply type")
    }

    #[test]
    fn test_actor_system_creation() {
        let system = ActorSystem::new();
        assert!(system.is_empty());
        assert!(system.names().is_empty());
        assert!(system.system_id().starts_with("system-"));
    }

    #[test]
    fn test_require_echo() {
        let system = ActorSystem::new();
        system.add_actor("echo", EchoActor).unwrap();

        let reply = system
            .require("echo", Box::new(42u64), Some(Duration::from_secs(1)))
            .unwrap();
        assert_eq!(reply_as::<u64>(reply), 42);

        let unbounded = system.require("echo", Box::new("hi"), None).unwrap();
        assert_eq!(reply_as::<&str>(unbounded), "hi");
        system.shutdown().unwrap();
    }

    #[test]
    fn test_require_missing_dead_letters() {
        let sink = SharedSink::default();
        let system = ActorSystem::builder()
            .dead_letter_sink(sink.clone())
            .build()
            .unwrap();

        let err = system
            .require("missing", Box::new(1u8), Some(Duration::from_millis(10)))
            .unwrap_err();
        assert!(matches!(err, ActorError::NotFound { .. }));
        assert_eq!(*sink.0.letters.lock(), vec!["missing".to_string()]);
        assert_eq!(system.metrics().snapshot().dead_letters, 1);
    }

    #[test]
    fn test_request_missing_is_silent() {
        let sink = SharedSink::default();
        let system = ActorSystem::builder()
            .dead_letter_sink(sink.clone())
            .build()
            .unwrap();

        system.request("nobody", Box::new(()));
        assert_eq!(sink.0.letters.lock().len(), 1);
    }

    #[test]
    fn test_require_timeout() {
        let system = ActorSystem::new();
        system
            .add_actor(
                "sleepy",
                SleepyActor {
                    delay: Duration::from_millis(200),
                },
            )
            .unwrap();

        let started = Instant::now();
        let err = system
            .require("sleepy", Box::new(()), Some(Duration::from_millis(20)))
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(started.elapsed() < Duration::from_millis(200));
        assert_eq!(system.metrics().snapshot().require_timeouts, 1);
        system.shutdown().unwrap();
    }

    #[test]
    fn test_require_millis_negative_is_request() {
        let seen = Arc::new(AtomicUsize::new(0));
        let system = ActorSystem::new();
        system
            .add_actor("counter", CountingActor { seen: Arc::clone(&seen) })
            .unwrap();

        let reply = system.require_millis("counter", Box::new(()), -1).unwrap();
        assert!(reply.is_none());

        // The fire-and-forget send still lands ahead of this one
        let total = system.require_millis("counter", Box::new(()), 1000).unwrap();
        assert_eq!(reply_as::<usize>(total), 2);

        // Negative bound never surfaces NotFound
        assert!(system.require_millis("missing", Box::new(()), -1).unwrap().is_none());
        system.shutdown().unwrap();
    }

    #[test]
    fn test_remove_actor() {
        let system = ActorSystem::new();
        let first = system.add_actor("pool", EchoActor).unwrap();
        let second = system.add_actor("pool", EchoActor).unwrap();
        assert_eq!(system.pool("pool"), vec![first, second]);

        system.remove_actor("pool", &first).unwrap();
        for _ in 0..20 {
            assert_eq!(system.route("pool").unwrap(), second);
        }

        let err = system.remove_actor("pool", &first).unwrap_err();
        assert!(err.is_not_found());

        system.remove_actor("pool", &second).unwrap();
        assert!(system.route("pool").unwrap_err().is_not_found());
        assert!(system.is_empty());
    }

    #[test]
    fn test_shutdown_clears_registry() {
        let sink = SharedSink::default();
        let system = ActorSystem::builder()
            .dead_letter_sink(sink.clone())
            .build()
            .unwrap();
        for name in ["a", "a", "b"] {
            system.add_actor(name, EchoActor).unwrap();
        }
        assert_eq!(system.actor_count(), 3);

        system.shutdown().unwrap();
        assert!(system.is_empty());

        let err = system.require("a", Box::new(()), None).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(*sink.0.letters.lock(), vec!["a".to_string()]);
    }

    #[test]
    fn test_status_tracks_lifecycle() {
        let system = ActorSystem::new();
        let id = system.add_actor("echo", EchoActor).unwrap();

        // A completed round trip implies on_plugin has returned
        system.require("echo", Box::new(()), None).unwrap();
        assert_eq!(system.status(&id), Some(ActorStatus::Running));

        system.remove_actor("echo", &id).unwrap();
        assert_eq!(system.status(&id), None);
    }

    #[test]
    fn test_round_robin_from_config() {
        let config = SystemConfig {
            balancer: BalancerKind::RoundRobin,
            ..SystemConfig::default()
        };
        let system = ActorSystem::from_config(config).unwrap();
        let ids: Vec<_> = (0..3).map(|_| system.add_actor("rr", EchoActor).unwrap()).collect();

        let picks: Vec<_> = (0..6).map(|_| system.route("rr").unwrap()).collect();
        let expected: Vec<_> = ids.iter().chain(ids.iter()).copied().collect();
        assert_eq!(picks, expected);
        system.shutdown().unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = SystemConfig {
            thread_name_prefix: String::new(),
            ..SystemConfig::default()
        };
        let err = ActorSystem::from_config(config).unwrap_err();
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn test_send_to_exited_instance_counts_discard() {
        let system = ActorSystem::new();
        let id = system.add_actor("exited", EchoActor).unwrap();
        let handle = system.inner.registry.find(&id).unwrap();

        // Stop the loop while the instance is still registered
        handle.terminate();
        for _ in 0..200 {
            if handle.status() == ActorStatus::Stopped {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(handle.status(), ActorStatus::Stopped);

        system.request("exited", Box::new(1u8));
        let err = system.require("exited", Box::new(2u8), None).unwrap_err();
        assert!(matches!(err, ActorError::Abandoned { .. }));

        let stats = system.metrics().snapshot();
        assert_eq!(stats.messages_enqueued, 2);
        assert_eq!(stats.messages_processed, 0);
        assert_eq!(stats.messages_discarded, 2);
        system.shutdown().unwrap();
    }

    #[test]
    fn test_weak_handle_does_not_extend_lifetime() {
        let system = ActorSystem::new();
        let weak = system.downgrade();
        assert!(weak.upgrade().is_some());

        drop(system);
        assert!(weak.upgrade().is_none());
    }
}
