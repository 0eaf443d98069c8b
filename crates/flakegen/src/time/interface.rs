/// Default custom epoch: Thursday, January 1, 2015 00:00:00 UTC, in
/// milliseconds since the Unix epoch.
pub const DEFAULT_EPOCH: u64 = 1_420_070_400_000;

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: u64 = 1_288_834_974_657;

/// Instagram epoch: Saturday, January 1, 2011 00:00:00 UTC
pub const INSTAGRAM_EPOCH: u64 = 1_293_840_000_000;

/// A source of wall-clock time in milliseconds since the Unix epoch.
///
/// Generators subtract their custom epoch from this reading. Plug in
/// [`SystemClock`] for real use, [`MonotonicClock`] for a clock that never
/// goes backward, or a mock in tests.
///
/// # Example
///
/// ```
/// use flakegen::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_420_070_401_000
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1_420_070_401_000);
/// ```
///
/// [`SystemClock`]: crate::SystemClock
/// [`MonotonicClock`]: crate::MonotonicClock
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}
