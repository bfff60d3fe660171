use crate::subscription::{SubscribeListener, SubscriptionGuard};

/// The publish/subscribe primitive a container flushes into.
///
/// Must be dyn object safe - containers hold their store as `Arc<dyn Store<T>>`.
pub trait Store<T>: Send + Sync + 'static {
    /// Register `listener`, call it once immediately with the current value, and keep calling it
    /// with every value passed to [`Store::set`] until the returned guard is dropped.
    fn subscribe(&self, listener: SubscribeListener<T>) -> SubscriptionGuard;

    /// Replace the stored value and synchronously notify every current subscriber
    fn set(&self, value: T);
}

/// Mutation traffic of one container, erased over its value type so bound actions can force
/// flushes without naming `T`.
pub trait Schedule: Send + Sync {
    /// Record that the value may have changed. Schedules at most one checkpoint per pending window.
    fn report(&self);

    /// Push the current value to the store if a change is pending
    fn flush(&self);

    /// Whether a change has been reported but not yet flushed
    fn is_pending(&self) -> bool;

    /// A synchronous stretch of bound-action code begins. Checkpoints firing before the matching
    /// [`Schedule::exit`] hold their flush back.
    fn enter(&self);

    /// The stretch opened by [`Schedule::enter`] ends. A checkpoint held back meanwhile is rescheduled.
    fn exit(&self);
}
