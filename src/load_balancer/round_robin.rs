//! Round-robin channel selection.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::routing::RouteClass;

/// Round-robin selector.
///
/// Every call claims a unique ticket from a monotonically increasing counter;
/// the ticket modulo the pool size is the channel index. The counter wraps on
/// overflow (modular `u64` arithmetic), which keeps the modulo valid.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicU64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn starting_at(ticket: u64) -> Self {
        Self {
            counter: AtomicU64::new(ticket),
        }
    }

    /// Claim the next ticket and reduce it to an index below `len`.
    /// `len` must be non-zero.
    pub fn next_index(&self, len: usize) -> usize {
        let ticket = self.counter.fetch_add(1, Ordering::Relaxed);
        (ticket % len as u64) as usize
    }

    /// Tickets issued so far (modulo 2^64).
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

/// One independent rotation per route class.
#[derive(Debug, Default)]
pub struct ClassCounters {
    stats: RoundRobin,
    www: RoundRobin,
}

impl ClassCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_class(&self, class: RouteClass) -> &RoundRobin {
        match class {
            RouteClass::Stats => &self.stats,
            RouteClass::Www => &self.www,
        }
    }
}
