use std::{
    sync::{
        Arc, OnceLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use crate::TimeSource;

/// State shared between the clock handles and the ticker thread.
#[derive(Debug)]
struct Ticker {
    /// Milliseconds elapsed since the anchor was taken.
    elapsed_millis: AtomicU64,
    thread: OnceLock<JoinHandle<()>>,
}

/// A time source that never goes backward.
///
/// The wall clock is sampled once at construction. From then on, a background
/// thread advances a shared counter from a monotonic timer (`Instant`) once
/// per millisecond, and readings are the construction-time wall clock plus
/// that counter. Host clock adjustments after construction are ignored, so a
/// generator driven by this clock never observes a regression.
///
/// Clones share the ticker. The thread exits once the last clone is dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    ticker: Arc<Ticker>,
    anchor_millis: u64,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Starts the ticker thread, anchored at the current wall-clock time.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use flakegen::{MonotonicClock, TimeSource};
    ///
    /// let clock = MonotonicClock::new();
    /// let before = clock.current_millis();
    ///
    /// std::thread::sleep(Duration::from_millis(5));
    ///
    /// // The ticker may lag by a tick, but never reads backwards.
    /// assert!(clock.current_millis() >= before);
    /// ```
    pub fn new() -> Self {
        let start = Instant::now();
        let anchor_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64);

        let ticker = Arc::new(Ticker {
            elapsed_millis: AtomicU64::new(0),
            thread: OnceLock::new(),
        });

        let weak = Arc::downgrade(&ticker);
        let handle = thread::spawn(move || run_ticker(&weak, start));
        let _ = ticker.thread.set(handle);

        Self {
            ticker,
            anchor_millis,
        }
    }
}

/// Publishes the elapsed milliseconds once per millisecond boundary until
/// every clock handle is gone. Only a weak reference is held while sleeping.
fn run_ticker(ticker: &Weak<Ticker>, start: Instant) {
    loop {
        let elapsed = start.elapsed();
        let millis = elapsed.as_millis() as u64;
        match ticker.upgrade() {
            Some(ticker) => ticker.elapsed_millis.store(millis, Ordering::Relaxed),
            None => return,
        }
        let next_boundary = Duration::from_millis(millis + 1);
        thread::sleep(next_boundary.saturating_sub(elapsed));
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.anchor_millis + self.ticker.elapsed_millis.load(Ordering::Relaxed)
    }
}
