use std::sync::{
    Arc, PoisonError, RwLock, Weak,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use tracing::{debug, trace, warn};

use crate::{
    checkpoint::Checkpoint,
    error::CheckpointError,
    tracked::Tracked,
    traits::{Schedule, Store},
    value::ValueCell,
};

/// The flush scheduler of one container.
///
/// A single dirty token coalesces any number of reported changes into one pending checkpoint.
/// Flushes always read the Value as it is when they run, never a capture from report time.
///
/// A checkpoint that fires while bound-action code is running (possible when it runs on another
/// worker thread) does not flush. It marks itself held back, and the last segment to exit
/// reschedules it, so a burst is never split by a concurrent checkpoint.
pub(crate) struct Engine<T> {
    /// Tracked view of the current Value, rebuilt on every wholesale replacement
    current: RwLock<Tracked<T>>,
    /// Dirty token: `true` while a change is pending and a checkpoint is outstanding
    dirty: AtomicBool,
    /// Number of bound-action segments currently running
    active: AtomicUsize,
    /// A checkpoint fired while `active` was non-zero and still owes a flush
    held: AtomicBool,
    store: Arc<dyn Store<T>>,
    checkpoint: Arc<dyn Checkpoint>,
    this: Weak<Engine<T>>,
}

impl<T: Clone + Send + 'static> Engine<T> {
    pub fn new(initial: T, store: Arc<dyn Store<T>>, checkpoint: Arc<dyn Checkpoint>) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| Self {
            current: RwLock::new(Tracked::new(ValueCell::new(initial), this.clone())),
            dirty: AtomicBool::new(false),
            active: AtomicUsize::new(0),
            held: AtomicBool::new(false),
            store,
            checkpoint,
            this: this.clone(),
        })
    }

    /// The live tracked view of the current Value
    pub fn view(&self) -> Tracked<T> { self.current.read().unwrap_or_else(PoisonError::into_inner).clone() }

    /// Snapshot of the current Value. Not a mutation signal.
    pub fn value(&self) -> T { self.cell().value() }

    /// Replace the Value wholesale: report, store, then rebuild the tracked view
    pub fn replace(&self, value: T) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        self.report();
        *current = Tracked::new(ValueCell::new(value), self.this.clone());
        debug!("Value replaced, tracked view rebuilt");
    }

    pub fn store(&self) -> &Arc<dyn Store<T>> { &self.store }

    pub(crate) fn is_current(&self, cell: &ValueCell<T>) -> bool { self.cell().ptr_eq(cell) }

    // Clone the cell out so the view lock is not held while the Value is locked
    fn cell(&self) -> ValueCell<T> { self.current.read().unwrap_or_else(PoisonError::into_inner).cell().clone() }

    fn schedule_checkpoint(&self) {
        let this = self.this.clone();
        let job = Box::new(move || {
            if let Some(engine) = this.upgrade() {
                engine.run_checkpoint();
            }
        });
        match self.checkpoint.defer(job) {
            Ok(()) => {}
            // the token stays pending; the next forced flush delivers the change
            Err(CheckpointError::Disabled) => trace!("Checkpoints disabled, change waits for the next forced flush"),
            Err(e) => warn!("Failed to schedule checkpoint: {}", e),
        }
    }

    /// Body of a scheduled checkpoint
    fn run_checkpoint(&self) {
        self.held.store(true, Ordering::SeqCst);
        if self.active.load(Ordering::SeqCst) > 0 {
            trace!("Checkpoint held back by a running action");
            return;
        }
        if self.held.swap(false, Ordering::SeqCst) {
            self.flush();
        }
    }
}

impl<T: Clone + Send + 'static> Schedule for Engine<T> {
    fn report(&self) {
        if self.dirty.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return;
        }
        trace!("Change reported, scheduling checkpoint");
        self.schedule_checkpoint();
    }

    fn flush(&self) {
        // Clear before publishing so changes made by subscribers schedule a new checkpoint
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return;
        }
        let value = self.value();
        trace!("Flushing pending change to store");
        self.store.set(value);
    }

    fn is_pending(&self) -> bool { self.dirty.load(Ordering::Acquire) }

    fn enter(&self) { self.active.fetch_add(1, Ordering::SeqCst); }

    fn exit(&self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 && self.held.swap(false, Ordering::SeqCst) && self.is_pending() {
            trace!("Rescheduling held-back checkpoint");
            self.schedule_checkpoint();
        }
    }
}

/// Forces a flush when dropped, including during unwinding
pub(crate) struct FlushGuard(pub(crate) Arc<dyn Schedule>);

impl Drop for FlushGuard {
    fn drop(&mut self) { self.0.flush(); }
}

/// Marks a running segment of bound-action code for as long as it lives
pub(crate) struct Segment(Arc<dyn Schedule>);

impl Segment {
    pub(crate) fn enter(schedule: Arc<dyn Schedule>) -> Self {
        schedule.enter();
        Self(schedule)
    }
}

impl Drop for Segment {
    fn drop(&mut self) { self.0.exit(); }
}
