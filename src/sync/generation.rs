//! Supersession counters for in-flight queries.
//!
//! Every query is issued with the current [`Generation`] of its
//! [`QueryKind`]. Issuing a newer query, or invalidating the kind, moves the
//! counter on, so a completion carrying an older generation is recognisably
//! stale and gets dropped.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryKind {
    Developments,
    Heatmap,
    Infrastructure,
    Route,
}

impl QueryKind {
    pub const ALL: [QueryKind; 4] = [
        QueryKind::Developments,
        QueryKind::Heatmap,
        QueryKind::Infrastructure,
        QueryKind::Route,
    ];

    fn index(self) -> usize {
        match self {
            QueryKind::Developments => 0,
            QueryKind::Heatmap => 1,
            QueryKind::Infrastructure => 2,
            QueryKind::Route => 3,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::Developments => "developments",
            QueryKind::Heatmap => "heatmap",
            QueryKind::Infrastructure => "infrastructure",
            QueryKind::Route => "route",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Slot {
    current: Generation,
    pending: bool,
}

/// One monotonically increasing counter per [`QueryKind`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generations {
    slots: [Slot; 4],
}

impl Generations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new query of `kind`; any older one in flight becomes stale
    pub fn advance(&mut self, kind: QueryKind) -> Generation {
        let slot = &mut self.slots[kind.index()];
        slot.current = Generation(slot.current.0 + 1);
        slot.pending = true;
        slot.current
    }

    pub fn current(&self, kind: QueryKind) -> Generation {
        self.slots[kind.index()].current
    }

    /// Whether a completion for `generation` should still be applied
    pub fn is_current(&self, kind: QueryKind, generation: Generation) -> bool {
        let slot = &self.slots[kind.index()];
        slot.pending && slot.current == generation
    }

    /// Marks the completion of `generation`. Returns `false` for stale
    /// completions, which must be discarded.
    pub fn settle(&mut self, kind: QueryKind, generation: Generation) -> bool {
        if !self.is_current(kind, generation) {
            return false;
        }
        self.slots[kind.index()].pending = false;
        true
    }

    /// Supersedes whatever is in flight without issuing anything new
    pub fn invalidate(&mut self, kind: QueryKind) {
        let slot = &mut self.slots[kind.index()];
        slot.current = Generation(slot.current.0 + 1);
        slot.pending = false;
    }

    pub fn invalidate_all(&mut self) {
        for kind in QueryKind::ALL {
            self.invalidate(kind);
        }
    }

    /// Whether the latest query of `kind` has not completed yet
    pub fn is_fetching(&self, kind: QueryKind) -> bool {
        self.slots[kind.index()].pending
    }
}
