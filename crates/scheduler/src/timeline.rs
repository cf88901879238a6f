//! Deadline-ordered queue shared by both scheduler front-ends.
//!
//! Entries are keyed by `(deadline, seq)`. `seq` is a monotonically
//! increasing insertion counter, so entries with equal deadlines keep their
//! scheduling order and every entry has a unique key even when payloads are
//! identical.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::clock::Timestamp;
use crate::phase::{GroupId, PhaseMask};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct EntryKey {
    pub deadline: Timestamp,
    seq: u64,
}

#[derive(Debug)]
pub(crate) struct Entry<T> {
    pub group: Option<GroupId>,
    pub phases: PhaseMask,
    pub payload: T,
}

#[derive(Debug)]
pub(crate) struct Timeline<T> {
    now: Timestamp,
    next_seq: u64,
    entries: BTreeMap<EntryKey, Entry<T>>,
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self {
            now: Timestamp::ZERO,
            next_seq: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
    }

    pub fn insert(&mut self, deadline: Timestamp, entry: Entry<T>) -> EntryKey {
        let key = EntryKey {
            deadline,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key, entry);
        key
    }

    pub fn remove(&mut self, key: &EntryKey) -> Option<Entry<T>> {
        self.entries.remove(key)
    }

    /// Keys of entries due at the current clock and eligible in `active`, in
    /// firing order.
    pub fn due_keys(&self, active: PhaseMask) -> Vec<EntryKey> {
        self.entries
            .iter()
            .take_while(|(key, _)| key.deadline <= self.now)
            .filter(|(_, entry)| entry.phases.eligible_in(active))
            .map(|(key, _)| *key)
            .collect()
    }

    /// First entry due at the current clock and eligible in `active`.
    pub fn first_due(&self, active: PhaseMask) -> Option<EntryKey> {
        self.entries
            .iter()
            .take_while(|(key, _)| key.deadline <= self.now)
            .find(|(_, entry)| entry.phases.eligible_in(active))
            .map(|(key, _)| *key)
    }

    /// Removes every entry matching `pred`, returning how many were dropped.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Entry<T>) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !pred(entry));
        before - self.entries.len()
    }

    /// Pushes the deadline of every entry matching `pred` back by `by`.
    ///
    /// Insertion order is preserved, so delayed entries still fire after
    /// earlier-scheduled entries that end up on the same deadline.
    pub fn delay_where(&mut self, by: Duration, mut pred: impl FnMut(&Entry<T>) -> bool) -> usize {
        let keys: Vec<EntryKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| pred(entry))
            .map(|(key, _)| *key)
            .collect();

        for key in &keys {
            if let Some(entry) = self.entries.remove(key) {
                let moved = EntryKey {
                    deadline: key.deadline + by,
                    seq: key.seq,
                };
                self.entries.insert(moved, entry);
            }
        }
        keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryKey, &Entry<T>)> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}
