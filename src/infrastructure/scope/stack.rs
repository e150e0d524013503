//! Scope stack - nested temporary scope overrides with guaranteed restore

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::{DomainError, Notifier, NotifyLevel, Scope};
use crate::infrastructure::observability::{
    record_restore_failure, record_scope_switch, record_scoped_call,
};

/// Scoped calls slower than this are logged at warn
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(1000);

/// Side effect run on every scope switch, before the current scope changes.
///
/// Runs while the stack lock is held and must not call back into the stack.
/// An error leaves the current scope unchanged.
pub trait ScopeSwitchHook: Send + Sync {
    fn on_switch(&self, from: Scope, to: Scope) -> Result<(), DomainError>;
}

#[derive(Debug)]
struct StackState {
    current: Scope,
    frames: Vec<Scope>,
}

/// Process-wide current scope plus the frames of every active `with_scope` call
pub struct ScopeStack {
    state: Mutex<StackState>,
    hook: Option<Arc<dyn ScopeSwitchHook>>,
    notifier: Option<Arc<dyn Notifier>>,
    slow_threshold: Duration,
}

impl fmt::Debug for ScopeStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ScopeStack")
            .field("current", &state.current)
            .field("frames", &state.frames)
            .field("slow_threshold", &self.slow_threshold)
            .finish_non_exhaustive()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new(Scope::DEFAULT)
    }
}

impl ScopeStack {
    pub fn new(initial: Scope) -> Self {
        Self {
            state: Mutex::new(StackState {
                current: initial,
                frames: Vec::new(),
            }),
            hook: None,
            notifier: None,
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn ScopeSwitchHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Scope currently in effect
    pub fn current(&self) -> Scope {
        self.lock().current
    }

    /// Number of active `with_scope` frames
    pub fn depth(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn slow_threshold(&self) -> Duration {
        self.slow_threshold
    }

    /// Replaces the current scope outside any frame. Used by scope-change handling.
    pub(crate) fn set_current(&self, scope: Scope) -> Result<(), DomainError> {
        let mut state = self.lock();
        self.switch_locked(&mut state, scope)
    }

    /// Runs `f` with `target` as the current scope, then restores the previous scope.
    ///
    /// Calls nest in LIFO order. Restoration runs on success, on error, on
    /// panic unwind and when the returned future is dropped before completion.
    /// A failed restore falls back to [`Scope::DEFAULT`] and is never raised;
    /// the callback's outcome is returned unchanged.
    pub async fn with_scope<F, Fut, T, E>(&self, target: Scope, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DomainError> + fmt::Display,
    {
        let frame_id = Uuid::new_v4();
        let span = info_span!("with_scope", frame_id = %frame_id, target = %target);

        async move {
            let (frame, switched) = self.enter(target);

            if let Err(e) = switched {
                error!(depth = frame.depth, error = %e, "Scope switch failed, callback not run");
                return Err(E::from(e));
            }

            let started = Instant::now();
            let outcome = f().await;
            let elapsed = started.elapsed();
            let elapsed_ms = elapsed.as_millis() as u64;

            match &outcome {
                Ok(_) => debug!(depth = frame.depth, elapsed_ms, "Scoped call completed"),
                Err(e) => warn!(depth = frame.depth, elapsed_ms, error = %e, "Scoped call failed"),
            }

            if elapsed > self.slow_threshold {
                warn!(
                    depth = frame.depth,
                    elapsed_ms,
                    threshold_ms = self.slow_threshold.as_millis() as u64,
                    "Slow scoped call"
                );
            }

            record_scoped_call(target, frame.depth, elapsed, outcome.is_ok());
            outcome
        }
        .instrument(span)
        .await
    }

    fn lock(&self) -> MutexGuard<'_, StackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn switch_locked(&self, state: &mut StackState, to: Scope) -> Result<(), DomainError> {
        if let Some(hook) = &self.hook {
            hook.on_switch(state.current, to)?;
        }

        state.current = to;
        record_scope_switch(to);
        Ok(())
    }

    fn enter(&self, target: Scope) -> (FrameGuard<'_>, Result<bool, DomainError>) {
        let mut state = self.lock();
        let previous = state.current;
        state.frames.push(previous);
        let depth = state.frames.len();

        let switched = if depth == 1 && previous == target {
            debug!(depth, scope = %target, "Already in target scope, switch skipped");
            Ok(false)
        } else {
            info!(depth, from = %previous, to = %target, "Switching scope");
            self.switch_locked(&mut state, target).map(|()| true)
        };
        drop(state);

        let frame = FrameGuard {
            stack: self,
            previous,
            depth,
        };
        (frame, switched)
    }

    fn exit(&self, expected: Scope, depth: usize) {
        let mut state = self.lock();

        let restore_to = match state.frames.pop() {
            Some(popped) => {
                if popped != expected {
                    warn!(
                        depth,
                        popped = %popped,
                        expected = %expected,
                        "Scope frames interleaved between concurrent calls"
                    );
                }
                popped
            }
            None => {
                error!(depth, scope = %expected, "Scope stack empty on exit");
                expected
            }
        };

        let from = state.current;
        let restore_error = match self.switch_locked(&mut state, restore_to) {
            Ok(()) => {
                debug!(depth, from = %from, to = %restore_to, "Scope restored");
                return;
            }
            Err(e) => e,
        };

        error!(depth, scope = %restore_to, error = %restore_error, "Scope restore failed, falling back to default");
        record_restore_failure(restore_to, false);

        let fallback = self.switch_locked(&mut state, Scope::DEFAULT);
        drop(state);

        match fallback {
            Ok(()) => {
                warn!(depth, scope = %Scope::DEFAULT, "Restored default scope after failed restore");
                self.notify(
                    NotifyLevel::Warn,
                    "Scope restore failed, switched to the default backend config",
                );
            }
            Err(e) => {
                error!(depth, error = %e, "Fallback to default scope failed");
                record_restore_failure(Scope::DEFAULT, true);
                self.notify(
                    NotifyLevel::Error,
                    "Scope restore failed and the default scope could not be applied, reload required",
                );
            }
        }
    }

    fn notify(&self, level: NotifyLevel, message: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(level, message);
        }
    }
}

/// Pops and restores its frame on drop
struct FrameGuard<'a> {
    stack: &'a ScopeStack,
    previous: Scope,
    depth: usize,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.stack.exit(self.previous, self.depth);
    }
}
