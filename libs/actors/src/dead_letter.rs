//! Dead-letter fallback for messages whose target name has no instances.

use crate::messages::Payload;
use std::fmt::Debug;
use tracing::warn;

/// Receives every message that could not be routed
///
/// Invoked synchronously on the sending thread, exactly once per failed
/// send, for both `request` and `require`.
pub trait DeadLetterSink: Send + Sync + Debug {
    fn process(&self, name: &str, payload: Payload);
}

/// Default sink: logs the miss and drops the payload
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDeadLetterSink;

impl LoggingDeadLetterSink {
    pub fn new() -> Self {
        Self
    }
}

impl DeadLetterSink for LoggingDeadLetterSink {
    fn process(&self, name: &str, payload: Payload) {
        warn!(
            actor_name = %name,
            payload_type_id = ?(*payload).type_id(),
            "Unable to find actor; discarding message"
        );
    }
}
