//! In-process publish/subscribe used by the store to announce changes.
//!
//! Notices carry no payload: a handler receives a read-only reference to
//! the publisher's state and re-reads whatever it needs from there.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// Record set or view state changed; re-read the derived view.
    DataChanged,
    /// Dialog opened, closed or replaced; re-read the dialog state.
    DialogChanged,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DataChanged => f.write_str("data-changed"),
            Notice::DialogChanged => f.write_str("dialog-changed"),
        }
    }
}

pub type Handler<C> = Rc<dyn Fn(&C) -> Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription<C> {
    id: SubscriptionId,
    notice: Notice,
    handler: Handler<C>,
}

/// A handler invocation that returned an error or panicked.
#[derive(Debug)]
pub struct HandlerFailure {
    pub subscription: SubscriptionId,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct PublishReport {
    pub delivered: usize,
    pub failures: Vec<HandlerFailure>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct EventBus<C> {
    subscriptions: Vec<Subscription<C>>,
    next_id: u64,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self {
            subscriptions: Vec::new(),
            next_id: 0,
        }
    }
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `notice`.
    ///
    /// Subscribing the same handler (same `Rc`) to the same notice again
    /// returns the existing id and registers nothing.
    pub fn subscribe(&mut self, notice: Notice, handler: Handler<C>) -> SubscriptionId {
        if let Some(existing) = self
            .subscriptions
            .iter()
            .find(|sub| sub.notice == notice && Rc::ptr_eq(&sub.handler, &handler))
        {
            return existing.id;
        }

        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription { id, notice, handler });
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != id);
        self.subscriptions.len() != before
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, notice: Notice) -> usize {
        self.subscriptions
            .iter()
            .filter(|sub| sub.notice == notice)
            .count()
    }

    /// Run every handler registered for `notice`, in registration order.
    pub fn publish(&self, notice: Notice, context: &C) -> PublishReport {
        let mut report = PublishReport::default();

        for sub in self.subscriptions.iter().filter(|sub| sub.notice == notice) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (sub.handler)(context)));
            let error = match outcome {
                Ok(Ok(())) => {
                    report.delivered += 1;
                    continue;
                }
                Ok(Err(err)) => err,
                Err(payload) => anyhow!("handler panicked: {}", panic_message(payload.as_ref())),
            };

            report.failures.push(HandlerFailure {
                subscription: sub.id,
                error,
            });
        }

        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
