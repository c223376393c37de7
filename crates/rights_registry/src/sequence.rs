//! Sequence allocator for right identifiers

use crate::types::RightId;
use serde::{Deserialize, Serialize};

/// Monotonic counter holding the last issued identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceAllocator {
    last_issued: RightId,
}

impl SequenceAllocator {
    pub fn new(last_issued: RightId) -> Self {
        Self { last_issued }
    }

    pub fn last_issued(&self) -> RightId {
        self.last_issued
    }

    /// Identifier the next call to [`next_id`](Self::next_id) will return.
    pub fn peek_next(&self) -> RightId {
        self.last_issued + 1
    }

    /// Issue the next identifier and advance the counter.
    pub fn next_id(&mut self) -> RightId {
        self.last_issued += 1;
        self.last_issued
    }

    /// Move the counter forward to `id`. Never moves it backwards.
    pub(crate) fn advance_to(&mut self, id: RightId) {
        self.last_issued = self.last_issued.max(id);
    }
}
