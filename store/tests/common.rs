use std::sync::{Arc, Mutex};

/// Values delivered to a subscriber, in delivery order.
///
/// Cloning shares the record, so a listener handed to a container on one thread can be read back
/// on another.
#[derive(Clone)]
pub struct Recorded<T>(Arc<Mutex<Vec<T>>>);

#[allow(unused)]
impl<T: Send + 'static> Recorded<T> {
    pub fn new() -> Self { Self(Arc::new(Mutex::new(Vec::new()))) }

    /// A subscriber appending to this record
    pub fn listener(&self) -> impl Fn(T) + Send + Sync + 'static {
        let record = self.0.clone();
        move |value| record.lock().unwrap().push(value)
    }

    /// Everything recorded since the last `take`
    pub fn take(&self) -> Vec<T> { std::mem::take(&mut *self.0.lock().unwrap()) }

    pub fn len(&self) -> usize { self.0.lock().unwrap().len() }
}

#[allow(unused)]
pub fn init_tracing() { let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init(); }
