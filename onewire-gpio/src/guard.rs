use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::RestoreState;

/// A reentrant critical-section guard.
///
/// [`acquire`](ReentrantGuard::acquire) returns a scope-bound token. While any
/// token is live the underlying critical section (via the [`critical_section`]
/// crate) is held, so the guarded code runs without preemption. Tokens may be
/// acquired recursively from nested calls on the same call path: a depth
/// counter enters the critical section only on the 0 to 1 transition and
/// leaves it on the 1 to 0 transition. The token releases on every exit path,
/// including early returns.
///
/// The depth counter alone does not provide mutual exclusion between
/// independent threads racing to be first, so the guard must stay with a
/// single owning thread. The type is `!Sync`, which makes the compiler enforce
/// that precondition; owning structures remain `Send`.
#[derive(Debug)]
pub struct ReentrantGuard {
    depth: AtomicU32,
    restore: Cell<RestoreState>,
}

impl Default for ReentrantGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ReentrantGuard {
    /// Creates a released guard.
    pub const fn new() -> Self {
        Self {
            depth: AtomicU32::new(0),
            restore: Cell::new(RestoreState::invalid()),
        }
    }

    /// Enters the critical section, or deepens it when already held.
    pub fn acquire(&self) -> GuardToken<'_> {
        if self.depth.fetch_add(1, Ordering::AcqRel) == 0 {
            // SAFETY: depth was zero, so no restore state is outstanding; the
            // matching release happens in the drop of the last live token.
            let state = unsafe { critical_section::acquire() };
            self.restore.set(state);
        }
        GuardToken { guard: self }
    }

    #[cfg(test)]
    fn depth(&self) -> u32 {
        self.depth.load(Ordering::Acquire)
    }
}

/// Scope-bound proof that the critical section is held.
///
/// Dropping the last outstanding token leaves the critical section.
#[must_use = "the critical section is released as soon as the token is dropped"]
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrantGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        if self.guard.depth.fetch_sub(1, Ordering::AcqRel) == 1 {
            // SAFETY: this was the last token, so the stored restore state is
            // the one saved on the 0 to 1 transition.
            unsafe { critical_section::release(self.guard.restore.get()) };
        }
    }
}
