//! Stale-response guard for views
//!
//! A view takes a [`Ticket`] before each request and only applies the result
//! if the ticket is still current. Leaving the view or starting a newer
//! request invalidates older tickets. The request itself keeps running.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Identity of one request issued by a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug)]
pub struct ViewGuard {
    generation: AtomicU64,
    mounted: AtomicBool,
}

impl Default for ViewGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewGuard {
    /// A guard for a view that is currently shown
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
        }
    }

    /// Start a request; supersedes every earlier ticket
    pub fn begin(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.mounted.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// The view was navigated away from
    pub fn leave(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// The view is shown again
    pub fn enter(&self) {
        self.mounted.store(true, Ordering::SeqCst);
    }

    /// Run `update` with `value` if `ticket` is still current.
    pub fn apply<T>(&self, ticket: Ticket, value: T, update: impl FnOnce(T)) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!("dropping stale response");
            return false;
        }
        update(value);
        true
    }
}
