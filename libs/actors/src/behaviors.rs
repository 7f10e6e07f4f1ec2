//! Stock behaviors

use crate::messages::{MessageKind, Payload, Reply};
use crate::system::{ActorBehavior, ActorSystem};
use std::any::type_name;
use std::marker::PhantomData;
use tracing::warn;

/// Fans each incoming `T` out to every name in its group
///
/// Each target receives its own clone as a fire-and-forget `request`, so an
/// unregistered target goes to the dead-letter sink like any other send.
/// Always replies `None`; a `require` is still broadcast but the caller gets
/// no value back.
pub struct BroadcastBehavior<T> {
    group: Vec<String>,
    _payload: PhantomData<fn() -> T>,
}

impl<T> BroadcastBehavior<T>
where
    T: Clone + Send + 'static,
{
    pub fn new<I, S>(group: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group: group.into_iter().map(Into::into).collect(),
            _payload: PhantomData,
        }
    }

    pub fn group(&self) -> &[String] {
        &self.group
    }
}

impl<T> ActorBehavior for BroadcastBehavior<T>
where
    T: Clone + Send + 'static,
{
    fn receive(&mut self, system: &ActorSystem, kind: MessageKind, payload: Payload) -> Reply {
        if kind != MessageKind::Request {
            warn!(kind = %kind, "Broadcast only supports request; broadcasting anyway");
        }

        let value = match payload.downcast::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(expected = type_name::<T>(), "Broadcast payload has unexpected type; dropping");
                return None;
            }
        };

        for name in &self.group {
            system.request(name, Box::new(T::clone(&value)));
        }
        None
    }
}
