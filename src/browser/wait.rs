//! Wait/poll engine.
//!
//! Repeatedly evaluates a condition against a subject (usually a
//! [`Driver`](crate::Driver)) until it yields a truthy value or the
//! timeout passes.
//!
//! # Polling Rules
//!
//! | Condition result | Effect |
//! |------------------|--------|
//! | truthy value | returned immediately |
//! | falsy value | sleep one poll interval, try again |
//! | error of an ignored kind | recorded as last error, try again |
//! | any other error | returned immediately |
//!
//! The deadline is checked after each sleep, so a condition is never
//! evaluated more often than once per poll interval and an in-flight
//! evaluation is never aborted.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use remote_webdriver::{By, conditions};
//!
//! let button = driver
//!     .wait(Duration::from_secs(10))
//!     .with_message("submit button")
//!     .until(conditions::element_to_be_clickable(By::id("submit")))
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use rustc_hash::FxHashSet;
use serde_json::Value;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::protocol::capabilities::is_truthy;

use super::element::Element;

// ============================================================================
// Constants
// ============================================================================

/// Poll interval used when none (or zero) is given.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// Types
// ============================================================================

/// Boxed future returned by ready-made conditions.
pub type ConditionFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

// ============================================================================
// Truthy
// ============================================================================

/// Values a condition may yield; falsy values mean "not yet".
pub trait Truthy {
    /// Returns `true` if the condition is satisfied.
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for &str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        is_truthy(self)
    }
}

impl Truthy for Element {
    fn is_truthy(&self) -> bool {
        true
    }
}

// ============================================================================
// WaitDescriptor
// ============================================================================

/// Timeout, poll interval and ignored error kinds of one wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitDescriptor {
    timeout: Duration,
    poll_interval: Duration,
    ignored: FxHashSet<ErrorKind>,
    message: Option<String>,
}

impl WaitDescriptor {
    /// Creates a descriptor ignoring only [`ErrorKind::NoSuchElement`].
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let mut ignored = FxHashSet::default();
        ignored.insert(ErrorKind::NoSuchElement);
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            ignored,
            message: None,
        }
    }

    /// Sets the poll interval; zero is replaced by [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!(
                default_ms = DEFAULT_POLL_INTERVAL.as_millis() as u64,
                "Zero poll interval replaced by default"
            );
            self.poll_interval = DEFAULT_POLL_INTERVAL;
        } else {
            self.poll_interval = interval;
        }
        self
    }

    /// Adds an error kind treated as "not yet".
    #[must_use]
    pub fn ignoring(mut self, kind: ErrorKind) -> Self {
        self.ignored.insert(kind);
        self
    }

    /// Replaces the ignored error kinds.
    #[must_use]
    pub fn ignoring_only(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.ignored = kinds.into_iter().collect();
        self
    }

    /// Sets the message reported on timeout.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the timeout.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the poll interval; always non-zero.
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns `true` if errors of `kind` are treated as "not yet".
    #[inline]
    #[must_use]
    pub fn is_ignored(&self, kind: ErrorKind) -> bool {
        self.ignored.contains(&kind)
    }

    fn timeout_error(&self, last_error: Option<Error>) -> Error {
        let message = self
            .message
            .clone()
            .unwrap_or_else(|| "condition not met".to_string());
        Error::timeout(message, self.timeout.as_millis() as u64, last_error)
    }
}

// ============================================================================
// Wait
// ============================================================================

/// A pending wait on `subject`.
///
/// Conditions receive a clone of the subject on every evaluation.
#[derive(Debug, Clone)]
pub struct Wait<S> {
    subject: S,
    descriptor: WaitDescriptor,
}

impl<S: Clone> Wait<S> {
    /// Creates a wait on `subject` with the given timeout.
    #[must_use]
    pub fn new(subject: S, timeout: Duration) -> Self {
        Self {
            subject,
            descriptor: WaitDescriptor::new(timeout),
        }
    }

    /// Creates a wait from a prepared descriptor.
    #[must_use]
    pub fn with_descriptor(subject: S, descriptor: WaitDescriptor) -> Self {
        Self {
            subject,
            descriptor,
        }
    }

    /// Sets the poll interval; zero is replaced by [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.descriptor = self.descriptor.with_poll_interval(interval);
        self
    }

    /// Adds an error kind treated as "not yet".
    #[must_use]
    pub fn ignoring(mut self, kind: ErrorKind) -> Self {
        self.descriptor = self.descriptor.ignoring(kind);
        self
    }

    /// Sets the message reported on timeout.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.descriptor = self.descriptor.with_message(message);
        self
    }

    /// Returns the descriptor.
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &WaitDescriptor {
        &self.descriptor
    }

    /// Polls `condition` until it yields a truthy value.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] with the last ignored error once the deadline passes
    /// - any non-ignored error from `condition`, immediately
    pub async fn until<F, Fut, T>(&self, mut condition: F) -> Result<T>
    where
        F: FnMut(S) -> Fut,
        Fut: Future<Output = Result<T>>,
        T: Truthy,
    {
        let descriptor = &self.descriptor;
        let deadline = Instant::now() + descriptor.timeout;
        let mut last_error: Option<Error> = None;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match condition(self.subject.clone()).await {
                Ok(value) if value.is_truthy() => {
                    trace!(attempts, "Wait condition met");
                    return Ok(value);
                }
                Ok(_) => {}
                Err(e) if descriptor.is_ignored(e.kind()) => {
                    trace!(attempts, error = %e, "Ignored error while waiting");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }

            sleep(descriptor.poll_interval).await;
            if Instant::now() > deadline {
                break;
            }
        }

        debug!(
            attempts,
            timeout_ms = descriptor.timeout.as_millis() as u64,
            "Wait timed out"
        );
        Err(descriptor.timeout_error(last_error))
    }

    /// Polls `condition` until it yields a falsy value or fails.
    ///
    /// Any error counts as the condition no longer holding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the condition still holds at the deadline.
    pub async fn until_not<F, Fut, T>(&self, mut condition: F) -> Result<()>
    where
        F: FnMut(S) -> Fut,
        Fut: Future<Output = Result<T>>,
        T: Truthy,
    {
        let descriptor = &self.descriptor;
        let deadline = Instant::now() + descriptor.timeout;

        loop {
            match condition(self.subject.clone()).await {
                Ok(value) if value.is_truthy() => {}
                Ok(_) => return Ok(()),
                Err(e) => {
                    trace!(error = %e, "Condition failed, treating as no longer true");
                    return Ok(());
                }
            }

            sleep(descriptor.poll_interval).await;
            if Instant::now() > deadline {
                break;
            }
        }

        Err(descriptor.timeout_error(None))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::Diagnostics;

    type Counter = Arc<AtomicUsize>;

    fn counter() -> Counter {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn test_zero_poll_interval_uses_default() {
        let descriptor = WaitDescriptor::new(Duration::from_secs(5)).with_poll_interval(Duration::ZERO);
        assert_eq!(descriptor.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert!(descriptor.poll_interval() > Duration::ZERO);
    }

    #[test]
    fn test_default_ignored_kinds() {
        let descriptor = WaitDescriptor::new(Duration::from_secs(1));
        assert!(descriptor.is_ignored(ErrorKind::NoSuchElement));
        assert!(!descriptor.is_ignored(ErrorKind::StaleElementReference));

        let descriptor = descriptor.ignoring(ErrorKind::StaleElementReference);
        assert!(descriptor.is_ignored(ErrorKind::StaleElementReference));

        let descriptor = descriptor.ignoring_only([]);
        assert!(!descriptor.is_ignored(ErrorKind::NoSuchElement));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_does_not_busy_loop() {
        let calls = counter();
        let wait = Wait::new(calls.clone(), Duration::from_secs(5)).with_poll_interval(Duration::ZERO);

        let start = Instant::now();
        let err = wait
            .until(|c: Counter| async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout { timeout_ms: 5000, .. }));
        let n = calls.load(Ordering::SeqCst);
        assert!((10..=11).contains(&n), "polled {n} times");
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignored_errors_then_success() {
        let calls = counter();
        let wait = Wait::new(calls.clone(), Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(100));

        let value = wait
            .until(|c: Counter| async move {
                match c.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err(Error::no_such_element("not yet")),
                    _ => Ok(Some("found")),
                }
            })
            .await
            .unwrap();

        assert_eq!(value, Some("found"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_propagates_immediately() {
        let calls = counter();
        let wait = Wait::new(calls.clone(), Duration::from_secs(30));

        let start = Instant::now();
        let err = wait
            .until(|c: Counter| async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<bool, _>(Error::invalid_session_id("gone"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidSessionId { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_carries_last_error_and_message() {
        let wait = Wait::new((), Duration::from_secs(1)).with_message("login form");

        let err = wait
            .until(|()| async {
                let diagnostics = Diagnostics {
                    screen: Some("iVBORw0KGgo".into()),
                    stacktrace: Some("at findElement".into()),
                    data: None,
                };
                Err::<bool, _>(Error::from_driver(
                    ErrorKind::NoSuchElement,
                    "no such element",
                    "#login",
                    diagnostics,
                ))
            })
            .await
            .unwrap_err();

        let text = err.to_string();
        assert!(text.contains("login form"), "{text}");
        assert!(text.contains("#login"), "{text}");
        assert!(matches!(
            err,
            Error::Timeout { last_error: Some(ref e), .. } if e.kind() == ErrorKind::NoSuchElement
        ));

        let diagnostics = err.diagnostics().unwrap();
        assert_eq!(diagnostics.screen.as_deref(), Some("iVBORw0KGgo"));
        assert_eq!(diagnostics.stacktrace.as_deref(), Some("at findElement"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_not_returns_on_falsy() {
        let calls = counter();
        let wait = Wait::new(calls.clone(), Duration::from_secs(5));

        wait.until_not(|c: Counter| async move { Ok(c.fetch_add(1, Ordering::SeqCst) < 2) })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_not_treats_error_as_success() {
        let wait = Wait::new((), Duration::from_secs(5));
        let result = wait
            .until_not(|()| async { Err::<bool, _>(Error::invalid_argument("boom")) })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_not_times_out_while_true() {
        let wait = Wait::new((), Duration::from_secs(1));
        let err = wait.until_not(|()| async { Ok(true) }).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_truthy_values() {
        assert!(true.is_truthy());
        assert!(!Vec::<u8>::new().is_truthy());
        assert!(!String::new().is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Some(true).is_truthy());
        assert!(Some("ready").is_truthy());
    }

    #[test]
    fn test_option_truthiness_follows_inner_value() {
        assert!(!Some(false).is_truthy());
        assert!(!Some("").is_truthy());
        assert!(!Some(String::new()).is_truthy());
        assert!(!Some(Vec::<u8>::new()).is_truthy());
        assert!(!None::<bool>.is_truthy());
        assert!(!Some(None::<bool>).is_truthy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_some_falsy_keeps_waiting() {
        let calls = counter();
        let wait = Wait::new(calls.clone(), Duration::from_secs(5));

        let value = wait
            .until(|c: Counter| async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                Ok(Some(n >= 2))
            })
            .await
            .unwrap();
        assert_eq!(value, Some(true));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
