//! Process-wide "a placement session is running" flag.
//!
//! Only one modal session may drive the scene at a time. A session claims the
//! registry on invoke and holds a [`SessionGuard`] until cleanup; dropping the
//! guard releases the claim, so the flag clears even when a session is torn
//! down without running its cleanup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Tracks whether a session currently owns the scene.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    running: AtomicBool,
}

impl SessionRegistry {
    /// A fresh, unclaimed registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every session in this process.
    pub fn global() -> Arc<SessionRegistry> {
        static GLOBAL: OnceLock<Arc<SessionRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(SessionRegistry::new()))
            .clone()
    }

    /// Whether a session holds the registry.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claim the registry; `None` if another session already holds it.
    pub fn try_claim(self: &Arc<Self>) -> Option<SessionGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SessionGuard {
                registry: Arc::clone(self),
            })
    }
}

/// Proof that the holder owns the registry.
#[derive(Debug)]
pub struct SessionGuard {
    registry: Arc<SessionRegistry>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.running.store(false, Ordering::Release);
    }
}
