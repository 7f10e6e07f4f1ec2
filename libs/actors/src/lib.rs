//! In-Process Actor Runtime
//!
//! Named actors run on dedicated threads and exchange opaque payloads either
//! fire-and-forget (`request`) or synchronously with an optional bound on
//! the wait (`require`). Many instances may share one name; the router picks
//! one per message.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │         ActorSystem          │
//! │                              │      ┌──────────────────────┐
//! │  request / require ──────────┼──┬──▶│ Router + Balancer    │
//! │                              │  │   │ name → one instance  │
//! │  ┌────────────────────────┐  │  │   └──────────┬───────────┘
//! │  │ Registry               │◀─┼──┘              │ miss
//! │  │ name → [instance, ..]  │  │                 ▼
//! │  └───────────┬────────────┘  │      ┌──────────────────────┐
//! └──────────────┼───────────────┘      │ DeadLetterSink       │
//!                │ push                 └──────────────────────┘
//!                ▼
//! ┌──────────────────────────────┐
//! │ Mailbox (FIFO + wake-up)     │
//! │   └─▶ loop thread            │
//! │        on_plugin → receive*  │
//! │                 → on_pullout │
//! └──────────────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - **Per-instance FIFO**: messages from one sender are handled in send order
//! - **Serial handling**: `receive` never runs concurrently for one instance
//! - **No lost wake-ups**: the loop drains to empty before waiting again
//! - **No silent drops**: unroutable messages always reach the dead-letter sink
//!
//! # Examples
//!
//! ```rust
//! use actor_runtime::{ActorBehavior, ActorSystem, MessageKind, Payload, Reply};
//! use std::time::Duration;
//!
//! struct Echo;
//!
//! impl ActorBehavior for Echo {
//!     fn receive(&mut self, _system: &ActorSystem, _kind: MessageKind, payload: Payload) -> Reply {
//!         Some(payload)
//!     }
//! }
//!
//! let system = ActorSystem::new();
//! system.add_actor("echo", Echo).unwrap();
//!
//! let reply = system
//!     .require("echo", Box::new(7u32), Some(Duration::from_secs(1)))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(*reply.downcast::<u32>().unwrap(), 7);
//!
//! system.shutdown().unwrap();
//! ```

pub mod behaviors;
pub mod config;
pub mod dead_letter;
pub mod error;
pub mod instance;
mod mailbox;
pub mod messages;
pub mod metrics;
pub mod registry;
pub mod router;
pub mod system;

pub use behaviors::BroadcastBehavior;
pub use config::{BalancerKind, SystemConfig};
pub use dead_letter::{DeadLetterSink, LoggingDeadLetterSink};
pub use error::{ActorError, Result};
pub use instance::{ActorHandle, ActorStatus};
pub use messages::{MessageKind, Payload, Reply};
pub use metrics::{SystemMetrics, SystemStats};
pub use registry::{ActorId, ActorRegistry, Pools};
pub use router::{Balancer, FullNameRouter, RandomBalancer, RoundRobinBalancer, Router};
pub use system::{ActorBehavior, ActorSystem, ActorSystemBuilder, WeakActorSystem};
