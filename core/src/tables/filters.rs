//! Local Interest-filter table
//!
//! Filters are local subscriptions: inbound Interests are delivered to
//! every filter whose prefix matches, in registration order. Matching
//! never consumes a filter, and filter lifetime is independent of any
//! forwarding-layer registration.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use super::{FilterId, IdAllocator};
use crate::face::InterestCallback;
use crate::packet::{Interest, InterestFilter, Name};

struct FilterEntry {
    filter: InterestFilter,
    on_interest: InterestCallback,
}

pub(crate) struct FilterRegistry {
    ids: Arc<IdAllocator>,
    entries: BTreeMap<FilterId, FilterEntry>,
}

impl FilterRegistry {
    pub(crate) fn new(ids: Arc<IdAllocator>) -> Self {
        FilterRegistry { ids, entries: BTreeMap::new() }
    }

    pub(crate) fn allocate(&self) -> FilterId {
        FilterId(self.ids.next())
    }

    pub(crate) fn set_filter(&mut self, id: FilterId, filter: InterestFilter, on_interest: InterestCallback) {
        trace!(%id, prefix = %filter, "filter set");
        self.entries.insert(id, FilterEntry { filter, on_interest });
    }

    /// Remove one filter; no-op if absent.
    pub(crate) fn unset(&mut self, id: FilterId) {
        if self.entries.remove(&id).is_some() {
            trace!(%id, "filter cleared");
        }
    }

    pub(crate) fn remove_all(&mut self) {
        self.entries.clear();
    }

    /// Ids of every filter matching `name`, in registration order.
    /// Registration order is ascending id order: ids are allocated
    /// monotonically.
    pub(crate) fn matching_ids(&self, name: &Name) -> Vec<FilterId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.filter.matches(name))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Deliver `interest` to every matching filter. Returns how many
    /// callbacks fired. Matching does not remove filters, so one
    /// Interest may fire many callbacks and later Interests fire them
    /// again.
    pub(crate) fn dispatch(&mut self, interest: &Interest) -> usize {
        let matches = self.matching_ids(&interest.name);
        let mut fired = 0;
        for id in &matches {
            if let Some(entry) = self.entries.get_mut(id) {
                let FilterEntry { filter, on_interest } = entry;
                (on_interest)(filter, interest);
                fired += 1;
            }
        }
        fired
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
