use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A shared slot holding one Value.
///
/// Every wholesale replacement of a container's Value allocates a fresh cell, so two cells
/// compare equal (via [`ValueCell::ptr_eq`]) only when they address the same Value.
pub struct ValueCell<T>(Arc<Mutex<T>>);

impl<T> Clone for ValueCell<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> ValueCell<T> {
    pub fn new(value: T) -> Self { Self(Arc::new(Mutex::new(value))) }

    pub fn set(&self, value: T) { *self.lock() = value; }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R { f(&*self.lock()) }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R { f(&mut *self.lock()) }

    /// Whether both cells address the same Value
    pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }

    // A panicking action must not make its partial update unreachable
    pub(crate) fn lock(&self) -> MutexGuard<'_, T> { self.0.lock().unwrap_or_else(PoisonError::into_inner) }
}

impl<T: Clone> ValueCell<T> {
    pub fn value(&self) -> T { self.lock().clone() }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.with(|v| f.debug_tuple("ValueCell").field(v).finish()) }
}
