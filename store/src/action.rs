use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::{FutureExt, future::BoxFuture};

use crate::{
    engine::{FlushGuard, Segment},
    traits::Schedule,
};

/// A bound synchronous action.
///
/// [`Action::call`] runs the user function and flushes the container before returning, so every
/// change made during the call reaches subscribers before the caller sees the result. The flush
/// also runs when the function panics. The return value is handed back untouched; use a tuple for
/// several arguments.
///
/// A checkpoint that fires on another thread while the function runs is held back until it returns.
pub struct Action<A = (), R = ()> {
    func: Box<dyn Fn(A) -> R + Send + Sync>,
    schedule: Arc<dyn Schedule>,
}

impl<A, R> Action<A, R> {
    pub(crate) fn new<F>(func: F, schedule: Arc<dyn Schedule>) -> Self
    where F: Fn(A) -> R + Send + Sync + 'static {
        Self { func: Box::new(func), schedule }
    }

    pub fn call(&self, args: A) -> R {
        let flush = FlushGuard(self.schedule.clone());
        let segment = Segment::enter(self.schedule.clone());
        let result = (self.func)(args);
        drop(segment);
        drop(flush);
        result
    }
}

impl<A, R> std::fmt::Debug for Action<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Action").finish_non_exhaustive() }
}

/// A bound asynchronous action.
///
/// [`Task::call`] invokes the user function immediately, so any work it does before building its
/// future runs inside the call, and flushes before returning. The returned [`Settle`] future
/// yields the task's output unchanged and flushes again once the task completes.
pub struct Task<A = (), O = ()> {
    func: Box<dyn Fn(A) -> BoxFuture<'static, O> + Send + Sync>,
    schedule: Arc<dyn Schedule>,
}

impl<A, O> Task<A, O> {
    pub(crate) fn new<F, Fut>(func: F, schedule: Arc<dyn Schedule>) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        Self { func: Box::new(move |args| func(args).boxed()), schedule }
    }

    pub fn call(&self, args: A) -> Settle<O> {
        let inner = {
            let _flush = FlushGuard(self.schedule.clone());
            let _segment = Segment::enter(self.schedule.clone());
            (self.func)(args)
        };
        Settle { inner, schedule: self.schedule.clone(), flush: Some(FlushGuard(self.schedule.clone())) }
    }
}

impl<A, O> std::fmt::Debug for Task<A, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Task").finish_non_exhaustive() }
}

/// The pending result of a [`Task`] call.
///
/// Flushes the container when the task completes. A `Settle` dropped before completion flushes
/// on drop, so changes made before cancellation are still published. Each poll of the task is a
/// segment during which checkpoints are held back, same as a synchronous [`Action`] call.
#[must_use = "futures do nothing unless polled"]
pub struct Settle<O> {
    inner: BoxFuture<'static, O>,
    schedule: Arc<dyn Schedule>,
    flush: Option<FlushGuard>,
}

impl<O> Future for Settle<O> {
    type Output = O;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<O> {
        let polled = {
            let _segment = Segment::enter(self.schedule.clone());
            self.inner.poll_unpin(cx)
        };
        match polled {
            Poll::Ready(output) => {
                self.flush.take();
                Poll::Ready(output)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<O> std::fmt::Debug for Settle<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Settle").field("settled", &self.flush.is_none()).finish() }
}
