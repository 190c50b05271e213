//! Face-internal registries and their typed record ids
//!
//! Each table keys its records by a distinct id newtype so a request id
//! can never be confused with a filter or registration id. Ids are
//! allocated from per-table atomic counters and never reused within a
//! face's lifetime.

pub(crate) mod filters;
pub(crate) mod registrations;
pub(crate) mod requests;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic id source shared between a face handle (which allocates
/// before posting) and the table that stores the records.
#[derive(Debug)]
pub(crate) struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        IdAllocator { next: AtomicU64::new(1) }
    }

    pub(crate) fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Identifies one pending request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub(crate) u64);

/// Identifies one registered Interest filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterId(pub(crate) u64);

/// Identifies one prefix registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistrationId(pub(crate) u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
