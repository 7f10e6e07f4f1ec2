//! Actor Mailbox
//!
//! Many-producer/single-consumer queue paired with a coalesced wake-up
//! signal. Producers append under a short lock and post a wake-up through a
//! capacity-one channel; if a wake-up is already pending the new one is
//! dropped. The consumer drains to empty before waiting again, so collapsed
//! wake-ups never strand a message.

use crate::messages::Envelope;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

struct MailboxQueue {
    envelopes: Mutex<VecDeque<Envelope>>,
}

/// Producer side of a mailbox; cheap to clone and safe to share
#[derive(Clone)]
pub(crate) struct Mailbox {
    queue: Arc<MailboxQueue>,
    wake: Sender<()>,
}

/// Consumer side of a mailbox; owned by exactly one loop thread
pub(crate) struct MailboxReceiver {
    queue: Arc<MailboxQueue>,
    wake: Receiver<()>,
}

/// Create a connected mailbox pair
pub(crate) fn mailbox() -> (Mailbox, MailboxReceiver) {
    let queue = Arc::new(MailboxQueue {
        envelopes: Mutex::new(VecDeque::new()),
    });
    let (wake_tx, wake_rx) = bounded(1);

    (
        Mailbox {
            queue: Arc::clone(&queue),
            wake: wake_tx,
        },
        MailboxReceiver {
            queue,
            wake: wake_rx,
        },
    )
}

impl Mailbox {
    /// Enqueue in arrival order and signal the consumer
    ///
    /// Returns how many envelopes were discarded because the consumer had
    /// already closed, this one included; zero on a normal push.
    pub(crate) fn push(&self, envelope: Envelope) -> usize {
        self.queue.envelopes.lock().push_back(envelope);

        match self.wake.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => 0,
            // Consumer closed: nothing will ever drain this queue, so drop
            // what is there now and release any response slots with it.
            Err(TrySendError::Disconnected(())) => {
                let stale = std::mem::take(&mut *self.queue.envelopes.lock());
                stale.len()
            }
        }
    }

    /// Number of envelopes not yet drained
    pub(crate) fn len(&self) -> usize {
        self.queue.envelopes.lock().len()
    }
}

impl MailboxReceiver {
    /// Block until a wake-up arrives
    ///
    /// Returns `false` once every producer handle is gone and no wake-up is
    /// pending, meaning nothing can ever be pushed again.
    pub(crate) fn wait(&self) -> bool {
        self.wake.recv().is_ok()
    }

    /// Dequeue the oldest envelope, if any
    pub(crate) fn pop(&self) -> Option<Envelope> {
        self.queue.envelopes.lock().pop_front()
    }

    /// Stop consuming and drop everything still queued
    ///
    /// The wake-up receiver goes first, so any push racing with the close
    /// either lands before the clear or sees the consumer gone and clears
    /// the queue itself. Returns how many envelopes were discarded here.
    pub(crate) fn close(self) -> usize {
        let MailboxReceiver { queue, wake } = self;
        drop(wake);
        // Payload destructors run outside the lock
        let stale = std::mem::take(&mut *queue.envelopes.lock());
        stale.len()
    }
}
