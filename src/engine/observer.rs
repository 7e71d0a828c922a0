//! State-changed observers.

use crate::core::{State, StateChange};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Callback invoked on the worker thread after every committed transition.
pub type Observer<S> = Arc<dyn Fn(&StateChange<S>) + Send + Sync>;

/// Observer callbacks and channel subscriptions, shared between the façade
/// (which registers them) and the worker (which publishes to them).
///
/// Callbacks live as long as the machine. A subscription lives as long as
/// its receiver: once the receiver is dropped the sender is pruned.
pub struct Observers<S: State> {
    list: RwLock<Vec<Observer<S>>>,
    subscribers: Mutex<Vec<UnboundedSender<StateChange<S>>>>,
}

impl<S: State> Observers<S> {
    pub fn new() -> Self {
        Self {
            list: RwLock::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn add<F>(&self, observer: F)
    where
        F: Fn(&StateChange<S>) + Send + Sync + 'static,
    {
        self.list.write().push(Arc::new(observer));
    }

    /// Forward every future change into a channel.
    ///
    /// Changes committed before the call are not replayed.
    pub fn subscribe(&self) -> UnboundedReceiver<StateChange<S>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|subscriber| !subscriber.is_closed());
        subscribers.push(tx);
        rx
    }

    /// Callbacks registered so far, in registration order.
    ///
    /// The worker calls observers from this copy so that an observer may
    /// itself register further observers without deadlocking.
    pub fn snapshot(&self) -> Vec<Observer<S>> {
        self.list.read().clone()
    }

    /// Send `change` to every live subscription, dropping closed ones.
    pub fn forward(&self, change: &StateChange<S>) {
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.list.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.read().is_empty()
    }

    /// Number of subscriptions not yet known to be closed.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl<S: State> Default for Observers<S> {
    fn default() -> Self {
        Self::new()
    }
}
