use tracing::trace;

/// A store subscriber, called with every value published by a flush
pub type SubscribeListener<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

/// Anything [`Bound::subscribe`](crate::Bound::subscribe) accepts: closures, and the sending half
/// of a channel, which receives each published value as a message
pub trait IntoSubscribeListener<T> {
    fn into_subscribe_listener(self) -> SubscribeListener<T>;
}

impl<F, T> IntoSubscribeListener<T> for F
where F: Fn(T) + Send + Sync + 'static
{
    fn into_subscribe_listener(self) -> SubscribeListener<T> { Box::new(self) }
}

impl<T: Send + 'static> IntoSubscribeListener<T> for std::sync::mpsc::Sender<T> {
    fn into_subscribe_listener(self) -> SubscribeListener<T> { forward(move |value| self.send(value).is_ok()) }
}

#[cfg(feature = "tokio")]
impl<T: Send + 'static> IntoSubscribeListener<T> for tokio::sync::mpsc::UnboundedSender<T> {
    fn into_subscribe_listener(self) -> SubscribeListener<T> { forward(move |value| self.send(value).is_ok()) }
}

// A receiver that went away only loses its own messages; the flush carries on to other subscribers
fn forward<T, S>(send: S) -> SubscribeListener<T>
where S: Fn(T) -> bool + Send + Sync + 'static {
    Box::new(move |value| {
        if !send(value) {
            trace!("Subscriber channel closed, value dropped");
        }
    })
}

/// Keeps a subscription alive. Dropping the guard detaches the subscriber.
///
/// Wraps whatever registration handle the [`Store`](crate::Store) hands out, so custom stores can
/// return their own.
#[must_use = "dropping the guard immediately unsubscribes"]
pub struct SubscriptionGuard {
    _registration: Box<dyn std::any::Any + Send + Sync>,
}

impl SubscriptionGuard {
    pub fn new<G: Send + Sync + 'static>(registration: G) -> Self { Self { _registration: Box::new(registration) } }

    /// Detach the subscriber now
    pub fn unsubscribe(self) {}
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("SubscriptionGuard").finish_non_exhaustive() }
}
