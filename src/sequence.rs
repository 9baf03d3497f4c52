//! Request sequencing for views that can have overlapping fetches in flight.
//!
//! Every load takes a ticket. Only the most recently issued ticket may
//! update the display, so the last request issued wins no matter which
//! response arrives last.

/// Proof that a load was started; hand it back when the fetch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket {
    seq: u64,
}

impl LoadTicket {
    pub fn sequence(&self) -> u64 {
        self.seq
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// New data is on display.
    Applied,
    /// The fetch failed; an error was surfaced and the display kept.
    Failed,
    /// A newer load was issued meanwhile; the result was dropped.
    Stale,
}

#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
    pending: bool,
}

impl RequestSequence {
    pub fn issue(&mut self) -> LoadTicket {
        self.latest += 1;
        self.pending = true;
        LoadTicket { seq: self.latest }
    }

    /// Marks the latest load as settled. Returns `false` for stale tickets,
    /// which leave the pending flag alone.
    pub fn settle(&mut self, ticket: LoadTicket) -> bool {
        if ticket.seq == self.latest {
            self.pending = false;
            true
        } else {
            false
        }
    }

    /// Whether the latest issued load has not completed yet.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}
