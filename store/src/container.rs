use std::{future::Future, ops::Deref, sync::Arc};

use tracing::debug;

use crate::{
    action::{Action, Task},
    checkpoint::{Checkpoint, default_checkpoint},
    engine::Engine,
    subscription::{IntoSubscribeListener, SubscriptionGuard},
    tracked::Tracked,
    traits::{Schedule, Store},
    writable::Writable,
};

/// Entry point for building a reactive container
pub struct Container;

impl Container {
    /// Start building a container holding `initial`
    #[allow(clippy::new_ret_no_self)]
    pub fn new<T: Clone + Send + 'static>(initial: T) -> Builder<T> { Builder { initial, store: None, checkpoint: None } }
}

/// A container that has a Value but no actions yet
pub struct Builder<T> {
    initial: T,
    store: Option<Arc<dyn Store<T>>>,
    checkpoint: Option<Arc<dyn Checkpoint>>,
}

impl<T: Clone + Send + 'static> Builder<T> {
    /// Publish into `store` instead of a fresh [`Writable`]
    pub fn store(mut self, store: impl Store<T>) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Defer coalesced flushes to `checkpoint` instead of the default one
    pub fn checkpoint(mut self, checkpoint: impl Checkpoint) -> Self {
        self.checkpoint = Some(Arc::new(checkpoint));
        self
    }

    /// Bind the container's actions.
    ///
    /// `build` runs exactly once, here, with the container's [`Accessor`]. Whatever it returns is
    /// exposed through the [`Bound`] container; bind each public operation with
    /// [`Accessor::action`] or [`Accessor::task`]. State and helpers captured by `build` stay
    /// private to the actions.
    pub fn actions<A>(self, build: impl FnOnce(&Accessor<T>) -> A) -> Bound<T, A> {
        let store = self.store.unwrap_or_else(|| Arc::new(Writable::new(self.initial.clone())));
        let checkpoint = self.checkpoint.unwrap_or_else(default_checkpoint);
        let engine = Engine::new(self.initial, store, checkpoint);
        debug!("Container created");

        let accessor = Accessor { engine: engine.clone() };
        let actions = build(&accessor);
        Bound { actions, engine }
    }
}

/// The Value accessor handed to the action builder.
///
/// Reads come in two forms: [`Accessor::get`] returns an untracked snapshot (the primitive path,
/// where only assignment counts as a change), [`Accessor::view`] returns the live tracked view
/// (the object path, where every access counts).
///
/// Snapshots do not follow later changes. Code that suspends must read through the accessor
/// again after resuming rather than compare against a value captured before suspending.
pub struct Accessor<T> {
    engine: Arc<Engine<T>>,
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self { Self { engine: self.engine.clone() } }
}

impl<T: Clone + Send + 'static> Accessor<T> {
    /// Untracked snapshot of the current Value
    pub fn get(&self) -> T { self.engine.value() }

    /// The live tracked view of the current Value
    pub fn view(&self) -> Tracked<T> { self.engine.view() }

    /// Replace the Value wholesale. Reports the change, stores `value`, and rebuilds the view.
    pub fn set(&self, value: T) { self.engine.replace(value) }

    /// Bind a synchronous action. `func` receives this accessor and the call's arguments.
    pub fn action<Args, R, F>(&self, func: F) -> Action<Args, R>
    where F: Fn(&Accessor<T>, Args) -> R + Send + Sync + 'static {
        let accessor = self.clone();
        Action::new(move |args| func(&accessor, args), self.schedule())
    }

    /// Bind an asynchronous action. `func` receives an owned accessor so the future can keep it.
    pub fn task<Args, O, F, Fut>(&self, func: F) -> Task<Args, O>
    where
        F: Fn(Accessor<T>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let accessor = self.clone();
        Task::new(move |args| func(accessor.clone(), args), self.schedule())
    }

    fn schedule(&self) -> Arc<dyn Schedule> { self.engine.clone() }
}

impl<T> std::fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Accessor").finish_non_exhaustive() }
}

/// A container with its actions bound.
///
/// Exposes [`Bound::subscribe`] and, through `Deref`, exactly what the action builder returned.
pub struct Bound<T, A> {
    actions: A,
    engine: Arc<Engine<T>>,
}

impl<T: Clone + Send + 'static, A> Bound<T, A> {
    /// Subscribe to the container. The listener is called immediately with the current published
    /// value, then once per flush.
    pub fn subscribe<L: IntoSubscribeListener<T>>(&self, listener: L) -> SubscriptionGuard {
        self.engine.store().subscribe(listener.into_subscribe_listener())
    }
}

impl<T, A> Deref for Bound<T, A> {
    type Target = A;

    fn deref(&self) -> &A { &self.actions }
}
