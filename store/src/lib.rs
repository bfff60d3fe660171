/*!
A mutation-tracking reactive container for ankurah

Wrap a value, bind the operations that change it, and subscribers hear about the changes
without any explicit "set" or "update" call. Any number of changes made within one action call
(or one synchronous stretch of an asynchronous action) reach subscribers as a single
notification carrying the latest value.

# Design requirements:
- Store seam must be dyn object safe - a container holds its underlying store as `Arc<dyn Store<T>>`
- One dirty token per container - no per-field dirty tracking
- Flushes read the value as it is when they run, never a capture from when it was dirtied
- Every bound action flushes before returning, and asynchronous actions flush again when they settle
- The public surface of a bound container is `subscribe` plus whatever the action builder returned

# Basic usage

```rust
use ankurah_store::*;

struct Counter {
    next: Action,
}

let counter = Container::new(0).actions(|value| Counter {
    next: value.action(|value, ()| {
        value.set(value.get() + 1);
        value.set(value.get() + 1);
        value.set(value.get() + 1);
    }),
});

let (tx, rx) = std::sync::mpsc::channel();
let _subscription = counter.subscribe(tx);
counter.next.call(());

// the initial value on subscribe, then a single notification for the whole call
assert_eq!(rx.try_iter().collect::<Vec<_>>(), [0, 3]);
```

# Tracked views

Object values are changed in place through the tracked view. Every access through the view counts
as a change, reads included.

```rust
use ankurah_store::*;

#[derive(Clone, Debug, PartialEq)]
struct Stats {
    count: u32,
}

struct StatsActions {
    bump: Action<u32, u32>,
}

let stats = Container::new(Stats { count: 0 }).actions(|value| StatsActions {
    bump: value.action(|value, by: u32| value.view().write(|s| {
        s.count += by;
        s.count
    })),
});

let (tx, rx) = std::sync::mpsc::channel();
let _subscription = stats.subscribe(tx);
assert_eq!(stats.bump.call(2), 2);
assert_eq!(rx.try_iter().last(), Some(Stats { count: 2 }));
```
*/

mod action;
mod broadcast;
mod checkpoint;
mod container;
mod engine;
mod error;
mod subscription;
mod tracked;
mod traits;
mod value;
mod writable;

pub use action::*;
pub use broadcast::{Broadcast, Listener, ListenerGuard};
pub use checkpoint::{Checkpoint, Job, ManualCheckpoint, Unscheduled};
#[cfg(feature = "tokio")]
pub use checkpoint::TokioCheckpoint;
pub use container::*;
pub use error::*;
pub use subscription::*;
pub use tracked::*;
pub use traits::*;
pub use value::ValueCell;
pub use writable::*;
