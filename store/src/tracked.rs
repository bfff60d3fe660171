use std::sync::{Arc, Weak};

use crate::{engine::Engine, traits::Schedule, value::ValueCell};

/// A tracked view over a container's Value.
///
/// Every access through the view is reported to the container as a possible mutation before it
/// touches the Value. Reads are reported too: a closure handed `&T` may still reach interior
/// mutability, and the tracker cannot tell a reading closure from a writing one.
///
/// A view addresses the Value it was built for. After the container's Value is replaced wholesale,
/// previously obtained views keep addressing the discarded Value ([`Tracked::is_current`] turns
/// `false`); fetch a fresh one from the accessor.
///
/// Closures passed to [`Tracked::read`] and [`Tracked::write`] run while the Value is locked.
/// Calling a bound action or another access on the same view from inside them deadlocks.
pub struct Tracked<T> {
    cell: ValueCell<T>,
    engine: Weak<Engine<T>>,
}

impl<T> Clone for Tracked<T> {
    fn clone(&self) -> Self { Self { cell: self.cell.clone(), engine: self.engine.clone() } }
}

impl<T> Tracked<T> {
    pub(crate) fn new(cell: ValueCell<T>, engine: Weak<Engine<T>>) -> Self { Self { cell, engine } }

    pub(crate) fn cell(&self) -> &ValueCell<T> { &self.cell }
}

impl<T: Clone + Send + 'static> Tracked<T> {
    /// Report, then read the live Value
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.cell.lock();
        self.report();
        f(&*guard)
    }

    /// Report, then mutate the live Value in place. Returns whatever `f` returns.
    pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.cell.lock();
        self.report();
        f(&mut *guard)
    }

    /// Reported clone of the whole Value
    pub fn get(&self) -> T { self.read(T::clone) }

    /// A tracked handle to one property of the Value
    ///
    /// ```ignore
    /// let count = value.view().field(|s: &mut Stats| &mut s.count);
    /// count.update(|c| *c += 1);
    /// ```
    pub fn field<U, P>(&self, project: P) -> Field<T, U>
    where P: Fn(&mut T) -> &mut U + Send + Sync + 'static {
        Field { view: self.clone(), project: Arc::new(project) }
    }

    /// Whether this view still addresses the container's current Value
    pub fn is_current(&self) -> bool { self.engine.upgrade().is_some_and(|engine| engine.is_current(&self.cell)) }

    fn report(&self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.report();
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("Tracked").field("value", &self.cell).finish() }
}

/// One property of a tracked Value, addressed through a projection
pub struct Field<T, U> {
    view: Tracked<T>,
    project: Arc<dyn Fn(&mut T) -> &mut U + Send + Sync>,
}

impl<T, U> Clone for Field<T, U> {
    fn clone(&self) -> Self { Self { view: self.view.clone(), project: self.project.clone() } }
}

impl<T: Clone + Send + 'static, U> Field<T, U> {
    /// Reported clone of the property
    pub fn get(&self) -> U
    where U: Clone {
        self.view.write(|value| (self.project)(value).clone())
    }

    /// Report, assign the property, and return the assigned value
    pub fn set(&self, new: U) -> U
    where U: Clone {
        self.view.write(|value| {
            *(self.project)(value) = new.clone();
            new
        })
    }

    /// Report, then mutate the property in place
    pub fn update<R>(&self, f: impl FnOnce(&mut U) -> R) -> R { self.view.write(|value| f((self.project)(value))) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{checkpoint::ManualCheckpoint, writable::Writable};

    #[derive(Clone, Debug, PartialEq)]
    struct Stats {
        count: u32,
        label: String,
    }

    fn engine() -> (Arc<Engine<Stats>>, ManualCheckpoint) {
        let initial = Stats { count: 0, label: "a".into() };
        let checkpoint = ManualCheckpoint::new();
        let engine = Engine::new(initial.clone(), Arc::new(Writable::new(initial)), Arc::new(checkpoint.clone()));
        (engine, checkpoint)
    }

    #[test]
    fn test_reads_are_reported() {
        let (engine, checkpoint) = engine();
        assert_eq!(engine.view().read(|s| s.count), 0);
        assert!(engine.is_pending());
        assert_eq!(checkpoint.pending(), 1);
    }

    #[test]
    fn test_field_access_goes_through_the_tracker() {
        let (engine, _checkpoint) = engine();
        let count = engine.view().field(|s: &mut Stats| &mut s.count);

        assert_eq!(count.set(4), 4);
        count.update(|c| *c += 1);
        assert_eq!(count.get(), 5);
        assert_eq!(engine.value().count, 5);
        assert!(engine.is_pending());
    }

    #[test]
    fn test_replacement_detaches_old_views() {
        let (engine, _checkpoint) = engine();
        let old = engine.view();
        assert!(old.is_current());

        engine.replace(Stats { count: 10, label: "b".into() });
        assert!(!old.is_current());
        assert!(engine.view().is_current());

        old.write(|s| s.count = 99);
        assert_eq!(engine.value(), Stats { count: 10, label: "b".into() });
    }

    #[test]
    fn test_view_outliving_engine_is_inert() {
        let (engine, _checkpoint) = engine();
        let view = engine.view();
        drop(engine);

        assert!(!view.is_current());
        view.write(|s| s.label.push('!'));
        assert_eq!(view.get().label, "a!");
    }
}
