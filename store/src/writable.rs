use std::sync::Arc;

use crate::{
    broadcast::Broadcast,
    subscription::{IntoSubscribeListener, SubscribeListener, SubscriptionGuard},
    traits::Store,
    value::ValueCell,
};

/// The default underlying store: holds a value and synchronously publishes every replacement.
///
/// Cloning a `Writable` shares the same value and subscriber list.
pub struct Writable<T> {
    value: ValueCell<T>,
    broadcast: Broadcast<T>,
}

impl<T> Clone for Writable<T> {
    fn clone(&self) -> Self { Self { value: self.value.clone(), broadcast: self.broadcast.clone() } }
}

impl<T: Clone + Send + 'static> Writable<T> {
    pub fn new(value: T) -> Self { Self { value: ValueCell::new(value), broadcast: Broadcast::new() } }

    /// Returns a clone of the current value without subscribing
    pub fn peek(&self) -> T { self.value.value() }

    /// Convenience over [`Store::subscribe`] accepting anything that converts into a listener
    pub fn subscribe<L: IntoSubscribeListener<T>>(&self, listener: L) -> SubscriptionGuard {
        Store::subscribe(self, listener.into_subscribe_listener())
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize { self.broadcast.len() }
}

impl<T: Clone + Send + 'static> Store<T> for Writable<T> {
    fn subscribe(&self, listener: SubscribeListener<T>) -> SubscriptionGuard {
        let listener: Arc<dyn Fn(T) + Send + Sync> = Arc::from(listener);
        let guard = self.broadcast.listen(listener.clone());
        listener(self.value.value());
        SubscriptionGuard::new(guard)
    }

    fn set(&self, value: T) {
        self.value.set(value.clone());
        self.broadcast.send(value);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Writable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writable").field("value", &self.value).field("broadcast", &self.broadcast).finish()
    }
}
