use crate::{notes::NoteKey, synth::voice::VoiceId};

/// A voice teardown waiting for its release to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTeardown {
    pub key: NoteKey,
    /// The voice this teardown belongs to. If the key has since been taken
    /// by another voice the teardown is stale and must not touch it.
    pub id: VoiceId,
    /// Engine frame on which the voice is removed.
    pub due: u64,
}

/// Frame-accurate list of deferred teardowns.
///
/// One entry per releasing key, kept in a flat list. Capacity is reserved
/// up front.
pub struct Scheduler {
    pending: Vec<PendingTeardown>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: Vec::with_capacity(capacity),
        }
    }

    pub fn schedule(&mut self, teardown: PendingTeardown) {
        self.pending.push(teardown);
    }

    /// Earliest due frame, if anything is pending.
    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|t| t.due).min()
    }

    /// Remove and return one teardown due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<PendingTeardown> {
        let index = self.pending.iter().position(|t| t.due <= now)?;
        Some(self.pending.swap_remove(index))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teardown(key: &str, id: u64, due: u64) -> PendingTeardown {
        PendingTeardown {
            key: key.parse().unwrap(),
            id: VoiceId(id),
            due,
        }
    }

    #[test]
    fn pops_only_due_entries() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(teardown("C4", 1, 100));
        scheduler.schedule(teardown("D4", 2, 50));

        assert_eq!(scheduler.next_due(), Some(50));
        assert!(scheduler.pop_due(49).is_none());

        let first = scheduler.pop_due(50).unwrap();
        assert_eq!(first.id, VoiceId(2));
        assert!(scheduler.pop_due(50).is_none());

        assert_eq!(scheduler.next_due(), Some(100));
        assert_eq!(scheduler.pop_due(500).unwrap().id, VoiceId(1));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn empty_has_no_due_frame() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.next_due(), None);
    }
}
