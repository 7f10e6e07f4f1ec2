//! Actor Instance Lifecycle
//!
//! Each instance owns one mailbox and one behavior and runs an exclusive
//! processing loop on a dedicated OS thread for its whole lifetime:
//!
//! ```text
//! Created ──on_plugin──▶ Running ──termination signal──▶ on_pullout ──▶ Stopped
//! ```
//!
//! Only the loop thread ever drains the mailbox, so `receive` calls for one
//! instance are strictly sequential and never re-entrant.

use crate::config::SystemConfig;
use crate::error::{ActorError, Result};
use crate::mailbox::{mailbox, Mailbox, MailboxReceiver};
use crate::messages::{Envelope, Message};
use crate::metrics::SystemMetrics;
use crate::registry::ActorId;
use crate::system::{ActorBehavior, WeakActorSystem};

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Instance lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ActorStatus {
    /// Registered; loop thread spawned but `on_plugin` not finished
    Created = 0,
    /// `on_plugin` returned; serving messages
    Running = 1,
    /// Loop exited and `on_pullout` ran (or was skipped)
    Stopped = 2,
}

impl ActorStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ActorStatus::Created,
            1 => ActorStatus::Running,
            _ => ActorStatus::Stopped,
        }
    }
}

/// Registry-side handle to a running instance
pub struct ActorHandle {
    id: ActorId,
    name: String,
    mailbox: Mailbox,
    status: Arc<AtomicU8>,
    /// Consumer side kept open for handles with no loop thread
    #[cfg(test)]
    _parked: Option<MailboxReceiver>,
}

impl ActorHandle {
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ActorStatus {
        ActorStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Envelopes queued but not yet drained by the loop
    pub fn pending(&self) -> usize {
        self.mailbox.len()
    }

    /// Queue an envelope; returns how many were discarded because the loop
    /// had already exited
    pub(crate) fn push(&self, envelope: Envelope) -> usize {
        self.mailbox.push(envelope)
    }

    pub(crate) fn terminate(&self) {
        self.mailbox.push(Envelope::terminate());
    }

    /// Handle with no loop thread behind it, for routing tests
    ///
    /// The mailbox stays open, so pushed envelopes accumulate in `pending`.
    #[cfg(test)]
    pub(crate) fn detached(name: &str) -> Arc<Self> {
        let (mailbox, receiver) = mailbox();
        Arc::new(Self {
            id: ActorId::new(),
            name: name.to_string(),
            mailbox,
            status: Arc::new(AtomicU8::new(ActorStatus::Created as u8)),
            _parked: Some(receiver),
        })
    }
}

impl fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status())
            .finish()
    }
}

/// Create an instance and start its loop thread
///
/// Returns once the thread is spawned; `on_plugin` runs asynchronously on
/// the new thread.
pub(crate) fn spawn_instance(
    name: &str,
    behavior: Box<dyn ActorBehavior>,
    system: WeakActorSystem,
    metrics: Arc<SystemMetrics>,
    config: &SystemConfig,
) -> Result<Arc<ActorHandle>> {
    let id = ActorId::new();
    let (mailbox, receiver) = mailbox();
    let status = Arc::new(AtomicU8::new(ActorStatus::Created as u8));

    let actor_loop = ActorLoop {
        id,
        name: name.to_string(),
        behavior,
        receiver,
        system,
        metrics,
        status: Arc::clone(&status),
    };

    std::thread::Builder::new()
        .name(config.thread_name(name))
        .spawn(move || actor_loop.run())
        .map_err(|e| ActorError::spawn(name, e))?;

    Ok(Arc::new(ActorHandle {
        id,
        name: name.to_string(),
        mailbox,
        status,
        #[cfg(test)]
        _parked: None,
    }))
}

/// Loop state owned by the instance thread
struct ActorLoop {
    id: ActorId,
    name: String,
    behavior: Box<dyn ActorBehavior>,
    receiver: MailboxReceiver,
    system: WeakActorSystem,
    metrics: Arc<SystemMetrics>,
    status: Arc<AtomicU8>,
}

impl ActorLoop {
    fn run(self) {
        let ActorLoop {
            id,
            name,
            mut behavior,
            receiver,
            system,
            metrics,
            status,
        } = self;
        let started = Instant::now();

        let plugged = match system.upgrade() {
            Some(strong) => {
                behavior.on_plugin(&strong);
                true
            }
            None => false,
        };

        if plugged {
            status.store(ActorStatus::Running as u8, Ordering::Release);
            debug!(actor_id = %id, actor_name = %name, "Actor plugged in");

            'serve: while receiver.wait() {
                // The strong reference lives only for one drain; an idle
                // loop never keeps the system alive.
                let Some(strong) = system.upgrade() else {
                    break;
                };

                while let Some(envelope) = receiver.pop() {
                    let kind = envelope.kind();
                    let Envelope { message, reply } = envelope;

                    let payload = match message {
                        Message::Terminate => break 'serve,
                        Message::User(payload) => payload,
                    };

                    let start = Instant::now();
                    let result = behavior.receive(&strong, kind, payload);
                    metrics.record_message_handled(start.elapsed());

                    if let Some(reply) = reply {
                        // Fails only when the caller stopped waiting; the
                        // value has no consumer and is dropped here.
                        if reply.try_send(result).is_err() {
                            debug!(actor_id = %id, actor_name = %name, "Reply produced after caller gave up");
                        }
                    }
                }
            }
        } else {
            debug!(actor_id = %id, actor_name = %name, "System dropped before plugin");
        }

        let discarded = receiver.close();
        if discarded > 0 {
            metrics.record_discarded(discarded as u64);
            debug!(
                actor_id = %id,
                actor_name = %name,
                discarded,
                "Discarded envelopes queued behind termination signal"
            );
        }

        if plugged {
            match system.upgrade() {
                Some(strong) => behavior.on_pullout(&strong),
                None => debug!(actor_id = %id, actor_name = %name, "System dropped; skipping pullout"),
            }
        }

        status.store(ActorStatus::Stopped as u8, Ordering::Release);
        metrics.record_stopped();
        info!(
            actor_id = %id,
            actor_name = %name,
            total_runtime_ms = started.elapsed().as_millis() as u64,
            "Actor pulled out"
        );
    }
}
