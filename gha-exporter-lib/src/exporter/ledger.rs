use crate::HashSet;

/// Ids of runs whose duration has already been pushed during this process lifetime.
///
/// Memory only and never evicted; a restart starts from an empty ledger.
#[derive(Debug, Default, Clone)]
pub struct DedupLedger {
    seen: HashSet<String>,
}

impl DedupLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn seen(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Record `id` as pushed. Returns `false` if it was already present.
    pub fn mark_seen(&mut self, id: impl Into<String>) -> bool {
        self.seen.insert(id.into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
