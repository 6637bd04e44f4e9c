//! Exactly-once shutdown guarding
//!
//! The session service must be torn down exactly once per process, no
//! matter whether the application's dispose path or the process-exit
//! path (facade drop) gets there first. Both check one shared flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Idempotent teardown flag, cloneable into exit hooks.
#[derive(Clone, Default)]
pub struct ShutdownGuard {
    fired: Arc<AtomicBool>,
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the teardown. Returns true exactly once across all clones.
    pub fn try_begin(&self) -> bool {
        !self.fired.swap(true, Ordering::SeqCst)
    }

    pub fn is_shut_down(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}
