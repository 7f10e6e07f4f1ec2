//! Actor Message Types
//!
//! Payloads are opaque in-memory values. An envelope pairs one payload with
//! an optional one-shot response slot; the slot's presence is what makes a
//! message a `Require` rather than a `Request`.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::any::Any;
use std::fmt;

/// Opaque message payload; behaviors downcast to the types they understand
pub type Payload = Box<dyn Any + Send>;

/// Value produced by `receive`; `None` is the empty reply
pub type Reply = Option<Payload>;

/// How the caller sent a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Synchronous send; the caller waits on the response slot
    Require,
    /// Fire-and-forget send; the reply is discarded
    Request,
}

impl MessageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Require => "require",
            Self::Request => "request",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope body
pub(crate) enum Message {
    /// User payload handed to `receive`
    User(Payload),
    /// Stops the loop once dequeued; never reaches `receive`
    Terminate,
}

/// One message unit queued in a mailbox
pub(crate) struct Envelope {
    pub(crate) message: Message,
    pub(crate) reply: Option<Sender<Reply>>,
}

impl Envelope {
    /// Fire-and-forget envelope
    pub(crate) fn request(payload: Payload) -> Self {
        Self {
            message: Message::User(payload),
            reply: None,
        }
    }

    /// Envelope carrying a fresh one-shot response slot
    pub(crate) fn require(payload: Payload) -> (Self, Receiver<Reply>) {
        // Capacity one: the loop never blocks writing a reply, even when
        // the caller has already given up waiting.
        let (tx, rx) = bounded(1);
        let envelope = Self {
            message: Message::User(payload),
            reply: Some(tx),
        };
        (envelope, rx)
    }

    /// Termination signal
    pub(crate) fn terminate() -> Self {
        Self {
            message: Message::Terminate,
            reply: None,
        }
    }

    pub(crate) fn kind(&self) -> MessageKind {
        if self.reply.is_some() {
            MessageKind::Require
        } else {
            MessageKind::Request
        }
    }

    pub(crate) fn is_terminate(&self) -> bool {
        matches!(self.message, Message::Terminate)
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("kind", &self.kind())
            .field("terminate", &self.is_terminate())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_response_slot() {
        let request = Envelope::request(Box::new(1u32));
        assert_eq!(request.kind(), MessageKind::Request);
        assert!(!request.is_terminate());

        let (require, _rx) = Envelope::require(Box::new(1u32));
        assert_eq!(require.kind(), MessageKind::Require);

        let stop = Envelope::terminate();
        assert!(stop.is_terminate());
        assert_eq!(stop.kind(), MessageKind::Request);
    }

    #[test]
    fn test_reply_survives_dropped_caller() {
        let (envelope, rx) = Envelope::require(Box::new("ping"));
        drop(rx);

        // Writing to an abandoned slot must not block or panic
        let tx = envelope.reply.unwrap();
        assert!(tx.try_send(Some(Box::new("pong"))).is_err());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MessageKind::Require.to_string(), "require");
        assert_eq!(MessageKind::Request.to_string(), "request");
    }
}
