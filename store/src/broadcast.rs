use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// A listener registered with a [`Broadcast`]
pub type Listener<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Synchronous fan-out of a payload to every registered listener.
///
/// Listeners are keyed by registration order, so they are invoked in the order they subscribed.
pub struct Broadcast<T>(Arc<Inner<T>>);

struct Inner<T> {
    listeners: RwLock<BTreeMap<usize, Listener<T>>>,
    next_id: AtomicUsize,
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> std::fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcast").field("listeners", &self.len()).finish()
    }
}

impl<T: Clone> Default for Broadcast<T> {
    fn default() -> Self { Self::new() }
}

/// Removes its listener from the broadcast when dropped.
/// Does not keep the broadcast alive.
pub struct ListenerGuard<T> {
    inner: Weak<Inner<T>>,
    id: usize,
}

impl<T: Clone> Broadcast<T> {
    pub fn new() -> Self { Self(Arc::new(Inner { listeners: RwLock::new(BTreeMap::new()), next_id: AtomicUsize::new(0) })) }

    pub fn listen(&self, listener: Listener<T>) -> ListenerGuard<T> {
        let id = self.0.next_id.fetch_add(1, Ordering::Relaxed);
        self.0.listeners.write().unwrap_or_else(|e| e.into_inner()).insert(id, listener);
        ListenerGuard { inner: Arc::downgrade(&self.0), id }
    }

    /// Sends `value` to all listeners registered at the time of the call
    pub fn send(&self, value: T) {
        // Snapshot first: a listener may subscribe or unsubscribe while being notified
        let listeners: Vec<Listener<T>> = self.0.listeners.read().unwrap_or_else(|e| e.into_inner()).values().cloned().collect();

        if let Some((last, rest)) = listeners.split_last() {
            for listener in rest {
                listener(value.clone());
            }
            last(value);
        }
    }
}

impl<T> Broadcast<T> {
    pub fn len(&self) -> usize { self.0.listeners.read().unwrap_or_else(|e| e.into_inner()).len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl<T> Drop for ListenerGuard<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.write().unwrap_or_else(|e| e.into_inner()).remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_listeners_receive_in_order() {
        let broadcast = Broadcast::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let _a = {
            let seen = seen.clone();
            broadcast.listen(Arc::new(move |v: u32| seen.lock().unwrap().push(("a", v))))
        };
        let _b = {
            let seen = seen.clone();
            broadcast.listen(Arc::new(move |v: u32| seen.lock().unwrap().push(("b", v))))
        };

        broadcast.send(7);
        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_dropping_guard_unsubscribes() {
        let broadcast = Broadcast::<()>::new();
        let counter = Arc::new(Mutex::new(0));

        let guard = {
            let counter = counter.clone();
            broadcast.listen(Arc::new(move |_: ()| *counter.lock().unwrap() += 1))
        };
        broadcast.send(());
        assert_eq!(broadcast.len(), 1);

        drop(guard);
        broadcast.send(());
        assert!(broadcast.is_empty());
        assert_eq!(*counter.lock().unwrap(), 1);
    }

    #[test]
    fn test_guard_outlives_broadcast() {
        let broadcast = Broadcast::<()>::new();
        let guard = broadcast.listen(Arc::new(|_: ()| {}));
        drop(broadcast);
        drop(guard);
    }
}
