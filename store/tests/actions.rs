mod common;
use ankurah_store::*;
use common::Recorded;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

#[derive(Debug, PartialEq)]
struct Rejected(u32);

struct Ledger {
    literal: Action<(), &'static str>,
    shared: Action<(), Arc<Vec<u8>>>,
    withdraw: Action<u32, Result<u32, Rejected>>,
    explode: Action,
    calls: Action<(), usize>,
}

fn ledger(builds: &Arc<AtomicUsize>) -> Bound<u32, Ledger> {
    let builds = builds.clone();
    Container::new(100u32).checkpoint(ManualCheckpoint::new()).actions(move |value| {
        builds.fetch_add(1, Ordering::SeqCst);

        // private to the actions, never part of the bound surface
        let shared = Arc::new(vec![1, 2, 3]);
        let calls = Arc::new(AtomicUsize::new(0));
        let count_call = {
            let calls = calls.clone();
            move || calls.fetch_add(1, Ordering::SeqCst)
        };

        Ledger {
            literal: value.action({
                let count_call = count_call.clone();
                move |_, ()| {
                    count_call();
                    "literal"
                }
            }),
            shared: value.action({
                let count_call = count_call.clone();
                move |_, ()| {
                    count_call();
                    shared.clone()
                }
            }),
            withdraw: value.action({
                let count_call = count_call.clone();
                move |value, amount: u32| {
                    count_call();
                    // a partial update: the fee is charged even when the withdrawal is rejected
                    value.set(value.get().saturating_sub(1));
                    let balance = value.get();
                    if amount > balance {
                        return Err(Rejected(balance));
                    }
                    value.set(balance - amount);
                    Ok(balance - amount)
                }
            }),
            explode: value.action(move |value, ()| {
                count_call();
                value.set(0);
                panic!("exploded after zeroing the balance");
            }),
            calls: value.action(move |_, ()| calls.load(Ordering::SeqCst)),
        }
    })
}

#[test]
fn test_builder_runs_exactly_once() {
    let builds = Arc::new(AtomicUsize::new(0));
    let ledger = ledger(&builds);
    assert_eq!(builds.load(Ordering::SeqCst), 1);

    ledger.literal.call(());
    ledger.literal.call(());
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert_eq!(ledger.calls.call(()), 2);
}

#[test]
fn test_return_values_pass_through() {
    let ledger = ledger(&Arc::new(AtomicUsize::new(0)));

    assert_eq!(ledger.literal.call(()), "literal");

    let first = ledger.shared.call(());
    let second = ledger.shared.call(());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first, [1, 2, 3]);
}

#[test]
fn test_errors_pass_through_and_partial_updates_flush() {
    let ledger = ledger(&Arc::new(AtomicUsize::new(0)));
    let seen = Recorded::<u32>::new();
    let _subscription = ledger.subscribe(seen.listener());
    assert_eq!(seen.take(), [100]);

    assert_eq!(ledger.withdraw.call(40), Ok(59));
    assert_eq!(seen.take(), [59]);

    assert_eq!(ledger.withdraw.call(500), Err(Rejected(58)));
    assert_eq!(seen.take(), [58]);
}

#[test]
fn test_panicking_action_still_flushes() {
    let ledger = ledger(&Arc::new(AtomicUsize::new(0)));
    let seen = Recorded::<u32>::new();
    let _subscription = ledger.subscribe(seen.listener());
    seen.take();

    let result = catch_unwind(AssertUnwindSafe(|| ledger.explode.call(())));
    assert!(result.is_err());
    assert_eq!(seen.take(), [0]);

    // the container stays usable
    assert_eq!(ledger.withdraw.call(0), Ok(0));
}

#[test]
fn test_subscribers_detach() {
    let ledger = ledger(&Arc::new(AtomicUsize::new(0)));
    let seen = Recorded::<u32>::new();
    let subscription = ledger.subscribe(seen.listener());
    seen.take();

    subscription.unsubscribe();
    let _ = ledger.withdraw.call(10);
    assert!(seen.take().is_empty());
}

#[test]
fn test_custom_store_receives_flushes() {
    let store = Writable::new(7u32);
    let seen = Recorded::<u32>::new();
    let _subscription = store.subscribe(seen.listener());
    seen.take();

    struct Doubler {
        double: Action,
    }
    let container = Container::new(7u32)
        .store(store.clone())
        .checkpoint(ManualCheckpoint::new())
        .actions(|value| Doubler { double: value.action(|value, ()| value.set(value.get() * 2)) });

    container.double.call(());
    assert_eq!(seen.take(), [14]);
    assert_eq!(store.peek(), 14);
}
