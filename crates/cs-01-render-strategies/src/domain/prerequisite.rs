//! Component prerequisites.
//!
//! A prerequisite is a condition that must hold before a component may run
//! part of its lifecycle. `ensure()` returns as soon as the requirement is
//! met, or fails with [`TimeoutError`] once the timeout elapses.
//!
//! Two completion detection modes exist:
//!
//! - **Manual**: the requirement is re-checked only when something calls
//!   [`Prerequisite::notify_completion`] (directly or through a
//!   [`PrerequisiteCallback`](super::callback::PrerequisiteCallback)).
//! - **Automatic**: the requirement is additionally re-checked every
//!   `period`.
//!
//! An optional constraint gates the whole check: when the constraint is not
//! met, `ensure()` succeeds immediately without evaluating the requirement.
//!
//! Prerequisites have identity. Clones are handles to the same
//! prerequisite; two prerequisites built from identical closures are
//! distinct.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, trace};

use super::callback::PrerequisiteCallback;
use crate::error::TimeoutError;

pub const DEFAULT_PREREQUISITE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Shortest poll period of an automatic prerequisite; shorter periods are
/// raised to it.
pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

/// A side-effect free predicate.
pub type Condition = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDetection {
    Manual,
    Automatic { period: Duration },
}

#[derive(Clone)]
pub struct Prerequisite {
    inner: Arc<Inner>,
}

struct Inner {
    requirement: Condition,
    constraint: Option<Condition>,
    timeout: Duration,
    allow_initialization: bool,
    detection: CompletionDetection,
    state: Mutex<WaitState>,
    wake: Notify,
}

#[derive(Debug, Default)]
struct WaitState {
    completed: bool,
    waiting: bool,
}

/// Resets the waiting flag however the wait ends, including when the
/// `ensure()` future is dropped.
struct WaitingGuard<'a>(&'a Inner);

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.state.lock().waiting = false;
    }
}

impl Prerequisite {
    /// A prerequisite re-checked only on notification.
    pub fn manual(requirement: impl Fn() -> bool + Send + Sync + 'static) -> PrerequisiteBuilder {
        PrerequisiteBuilder::new(Arc::new(requirement), CompletionDetection::Manual)
    }

    /// A prerequisite re-checked every `period` as well as on notification.
    /// `period` is at least [`MIN_POLL_PERIOD`].
    pub fn automatic(
        period: Duration,
        requirement: impl Fn() -> bool + Send + Sync + 'static,
    ) -> PrerequisiteBuilder {
        PrerequisiteBuilder::new(
            Arc::new(requirement),
            CompletionDetection::Automatic {
                period: period.max(MIN_POLL_PERIOD),
            },
        )
    }

    /// Wait until the requirement holds, or the constraint says it is not needed.
    pub async fn ensure(&self) -> Result<(), TimeoutError> {
        if !self.constraint_met() {
            trace!("prerequisite constraint not met, skipping");
            return Ok(());
        }
        if self.check_requirement() {
            return Ok(());
        }

        self.inner.state.lock().waiting = true;
        let _guard = WaitingGuard(&self.inner);
        debug!(timeout = ?self.inner.timeout, detection = ?self.inner.detection, "waiting for prerequisite");
        self.wait_for_requirement().await
    }

    /// Signal that the requirement may now hold. No-op unless a wait is in
    /// progress and the prerequisite has not completed.
    pub fn notify_completion(&self) {
        let state = self.inner.state.lock();
        if state.waiting && !state.completed {
            self.inner.wake.notify_one();
        }
    }

    pub fn constraint_met(&self) -> bool {
        self.inner.constraint.as_ref().map_or(true, |constraint| constraint())
    }

    pub fn is_completed(&self) -> bool {
        self.inner.state.lock().completed
    }

    pub fn is_waiting(&self) -> bool {
        self.inner.state.lock().waiting
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn detection(&self) -> CompletionDetection {
        self.inner.detection
    }

    /// Whether the component may initialize while this is still unmet.
    pub fn allows_initialization(&self) -> bool {
        self.inner.allow_initialization
    }

    pub fn ptr_eq(&self, other: &Prerequisite) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn check_requirement(&self) -> bool {
        if self.inner.state.lock().completed {
            return true;
        }
        // Evaluated outside the lock; requirements may notify other prerequisites.
        if (self.inner.requirement)() {
            self.inner.state.lock().completed = true;
            true
        } else {
            false
        }
    }

    async fn wait_for_requirement(&self) -> Result<(), TimeoutError> {
        let deadline = Instant::now() + self.inner.timeout;
        loop {
            let expired = match self.inner.detection {
                CompletionDetection::Manual => tokio::select! {
                    _ = sleep_until(deadline) => true,
                    _ = self.inner.wake.notified() => false,
                },
                CompletionDetection::Automatic { period } => tokio::select! {
                    _ = sleep_until(deadline) => true,
                    _ = self.inner.wake.notified() => false,
                    _ = sleep(period) => false,
                },
            };

            if self.check_requirement() {
                return Ok(());
            }
            if expired {
                return Err(TimeoutError::new("prerequisite", self.inner.timeout));
            }
        }
    }
}

impl fmt::Debug for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Prerequisite")
            .field("detection", &self.inner.detection)
            .field("timeout", &self.inner.timeout)
            .field("has_constraint", &self.inner.constraint.is_some())
            .field("allow_initialization", &self.inner.allow_initialization)
            .field("completed", &state.completed)
            .field("waiting", &state.waiting)
            .finish()
    }
}

/// Builder for [`Prerequisite`]
pub struct PrerequisiteBuilder {
    requirement: Condition,
    constraint: Option<Condition>,
    timeout: Duration,
    allow_initialization: bool,
    detection: CompletionDetection,
    callbacks: Vec<PrerequisiteCallback>,
}

impl PrerequisiteBuilder {
    fn new(requirement: Condition, detection: CompletionDetection) -> Self {
        Self {
            requirement,
            constraint: None,
            timeout: DEFAULT_PREREQUISITE_TIMEOUT,
            allow_initialization: false,
            detection,
            callbacks: Vec::new(),
        }
    }

    pub fn with_constraint(mut self, constraint: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.constraint = Some(Arc::new(constraint));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach to `callback` so that invoking it notifies this prerequisite.
    pub fn with_callback(mut self, callback: &PrerequisiteCallback) -> Self {
        self.callbacks.push(callback.clone());
        self
    }

    /// Check this prerequisite after initialization instead of before it.
    pub fn allow_initialization(mut self) -> Self {
        self.allow_initialization = true;
        self
    }

    pub fn build(self) -> Prerequisite {
        let prerequisite = Prerequisite {
            inner: Arc::new(Inner {
                requirement: self.requirement,
                constraint: self.constraint,
                timeout: self.timeout,
                allow_initialization: self.allow_initialization,
                detection: self.detection,
                state: Mutex::new(WaitState::default()),
                wake: Notify::new(),
            }),
        };
        for callback in &self.callbacks {
            callback.attach(&prerequisite);
        }
        prerequisite
    }
}
