//! The per-instance encounter state machine.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::blob::{self, SaveData};
use crate::boundary::Position;
use crate::error::{BlobError, LayoutError, TransitionError};
use crate::hooks::{EncounterHooks, NoopHooks};
use crate::layout::{AttemptPolicy, DoorKind, EncounterLayout};
use crate::state::EncounterState;

/// Result of [`EncounterStateMachine::load`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Restored,
    /// The blob was unusable; every slot and counter was reset.
    Defaulted(BlobError),
}

/// Boss-slot states, attempt counter and scratch data of one instance.
///
/// Every accepted transition re-applies the door and gate side effects
/// wholesale from the current states, so the host never drifts from the
/// machine. Transitions to `Done`, and any transition while unsaved changes
/// are pending, hand a fresh blob to [`EncounterHooks::persist`]. Unsaved
/// changes are flushed when the machine is dropped.
pub struct EncounterStateMachine<H: EncounterHooks = NoopHooks> {
    layout: EncounterLayout,
    states: Vec<EncounterState>,
    data: BTreeMap<u32, u32>,
    attempts_remaining: Option<u32>,
    dirty: bool,
    hooks: H,
}

impl<H: EncounterHooks> EncounterStateMachine<H> {
    pub fn new(layout: EncounterLayout, hooks: H) -> Result<Self, LayoutError> {
        layout.validate()?;
        let states = vec![EncounterState::NotStarted; layout.slot_count()];
        let attempts_remaining = Self::full_attempts(layout.attempts);
        Ok(Self {
            layout,
            states,
            data: BTreeMap::new(),
            attempts_remaining,
            dirty: false,
            hooks,
        })
    }

    pub fn layout(&self) -> &EncounterLayout {
        &self.layout
    }

    pub fn header(&self) -> &str {
        &self.layout.header
    }

    pub fn slot_count(&self) -> usize {
        self.states.len()
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// State of `slot`, or `None` for an unknown slot.
    pub fn boss_state(&self, slot: usize) -> Option<EncounterState> {
        self.states.get(slot).copied()
    }

    pub fn states(&self) -> &[EncounterState] {
        &self.states
    }

    /// Requests a transition. Returns `false`, with no side effects, for
    /// unknown slots, same-state requests and illegal transitions.
    pub fn set_boss_state(&mut self, slot: usize, state: EncounterState) -> bool {
        match self.try_set_boss_state(slot, state) {
            Ok(_) => true,
            Err(err) => {
                debug!(target: "encounter", header = %self.layout.header, %err, "boss state change rejected");
                false
            }
        }
    }

    /// Like [`Self::set_boss_state`] but reports why a request was rejected.
    ///
    /// On success returns the state the slot ended up in, which differs from
    /// the request when a `Fail` is rolled back to `NotStarted`.
    pub fn try_set_boss_state(
        &mut self,
        slot: usize,
        state: EncounterState,
    ) -> Result<EncounterState, TransitionError> {
        let count = self.states.len();
        let current = *self
            .states
            .get(slot)
            .ok_or(TransitionError::InvalidSlot { slot, count })?;

        if current == state {
            return Err(TransitionError::Unchanged { slot, state });
        }
        if !current.can_transition_to(state) {
            return Err(TransitionError::Illegal {
                slot,
                from: current,
                to: state,
            });
        }

        info!(
            target: "encounter",
            header = %self.layout.header,
            slot,
            boss = %self.layout.slots[slot].name,
            from = %current,
            to = %state,
            "boss state changed"
        );

        let resolved = match state {
            EncounterState::Fail => self.consume_attempt(slot),
            EncounterState::Special => {
                self.dirty = true;
                state
            }
            _ => state,
        };
        self.states[slot] = resolved;

        self.apply_side_effects();
        if state == EncounterState::Done || self.dirty {
            self.persist();
        }
        Ok(resolved)
    }

    /// Ends the fight on `slot` as a wipe. Works from `InProgress` and from
    /// `Special`, which is first folded back into `InProgress`, and resolves
    /// through the usual `Fail` handling.
    pub fn wipe(&mut self, slot: usize) -> Result<EncounterState, TransitionError> {
        let count = self.states.len();
        let current = *self
            .states
            .get(slot)
            .ok_or(TransitionError::InvalidSlot { slot, count })?;

        if current == EncounterState::Special {
            debug!(target: "encounter", header = %self.layout.header, slot, "wipe during special stage");
            self.states[slot] = EncounterState::InProgress;
        }
        self.try_set_boss_state(slot, EncounterState::Fail)
    }

    /// Puts `slot` back to `NotStarted` regardless of its state, including
    /// `Done`. Used by instance resets and GM tooling.
    pub fn reset_slot(&mut self, slot: usize) -> bool {
        let Some(current) = self.states.get(slot).copied() else {
            return false;
        };
        if current == EncounterState::NotStarted {
            return false;
        }
        info!(target: "encounter", header = %self.layout.header, slot, from = %current, "boss slot reset");
        self.states[slot] = EncounterState::NotStarted;
        self.dirty = true;
        self.apply_side_effects();
        self.persist();
        true
    }

    /// Scratch counter; unknown keys read as zero.
    pub fn data(&self, key: u32) -> u32 {
        self.data.get(&key).copied().unwrap_or(0)
    }

    /// Stores a scratch counter. Saved with the next persisting transition,
    /// [`Self::flush`], or on drop.
    pub fn set_data(&mut self, key: u32, value: u32) {
        if self.data.insert(key, value) != Some(value) {
            debug!(target: "encounter", header = %self.layout.header, key, value, "instance data set");
            self.dirty = true;
        }
    }

    /// Remaining attempts, `None` for unlimited instances.
    pub fn attempts_remaining(&self) -> Option<u32> {
        self.attempts_remaining
    }

    pub fn is_locked_out(&self) -> bool {
        self.attempts_remaining == Some(0)
    }

    /// True while any slot is in progress or in its special stage.
    pub fn is_encounter_in_progress(&self) -> bool {
        self.states.iter().any(|state| state.is_active())
    }

    /// Leash check for the boss of `slot`. Unknown slots have no leash.
    pub fn is_within_boundary(&self, slot: usize, pos: Position) -> bool {
        self.layout
            .slots
            .get(slot)
            .is_none_or(|layout| layout.is_within_boundary(pos))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Serializes every slot and counter.
    pub fn save(&self) -> String {
        let save = SaveData {
            states: self.states.clone(),
            attempts: self.attempts_remaining,
            data: self.data.clone(),
        };
        blob::encode(&self.layout.header, &save)
    }

    /// Restores state from a blob. Unusable input resets the machine to its
    /// defaults instead of failing. Gate and doors are re-applied either way.
    pub fn load(&mut self, input: &str) -> LoadOutcome {
        let outcome = match blob::decode(&self.layout.header, self.states.len(), input) {
            Ok(save) => {
                self.states = save.states;
                self.attempts_remaining = match self.layout.attempts {
                    AttemptPolicy::Unlimited => None,
                    AttemptPolicy::Limited(max) => Some(save.attempts.unwrap_or(max).min(max)),
                };
                self.data = save.data;
                info!(
                    target: "encounter",
                    header = %self.layout.header,
                    states = ?self.states,
                    attempts = ?self.attempts_remaining,
                    "instance state restored"
                );
                LoadOutcome::Restored
            }
            Err(err) => {
                warn!(
                    target: "encounter",
                    header = %self.layout.header,
                    %err,
                    "save blob unusable, starting from defaults"
                );
                self.states.fill(EncounterState::NotStarted);
                self.attempts_remaining = Self::full_attempts(self.layout.attempts);
                self.data.clear();
                LoadOutcome::Defaulted(err)
            }
        };
        self.dirty = false;
        self.apply_side_effects();
        outcome
    }

    /// Persists pending changes. Returns whether anything was written.
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.persist();
        true
    }

    /// Re-applies gate and door state from the current slot states.
    pub fn apply_side_effects(&mut self) {
        self.hooks
            .set_encounter_gate(self.is_encounter_in_progress());

        for (layout, state) in self.layout.slots.iter().zip(&self.states) {
            for door in &layout.doors {
                let open = match door.kind {
                    DoorKind::Room => !state.is_active(),
                    DoorKind::Passage => *state == EncounterState::Done,
                };
                self.hooks.set_door(door.door, open);
            }
        }
    }

    fn consume_attempt(&mut self, slot: usize) -> EncounterState {
        let Some(remaining) = self.attempts_remaining.as_mut() else {
            return EncounterState::NotStarted;
        };

        *remaining = remaining.saturating_sub(1);
        self.dirty = true;

        if *remaining > 0 {
            info!(target: "encounter", header = %self.layout.header, slot, remaining = *remaining, "attempt consumed");
            return EncounterState::NotStarted;
        }

        warn!(target: "encounter", header = %self.layout.header, slot, "no attempts left, instance locked out");
        self.hooks.on_lockout(slot);
        EncounterState::Fail
    }

    fn persist(&mut self) {
        let blob = self.save();
        debug!(target: "encounter", header = %self.layout.header, %blob, "persisting instance state");
        self.hooks.persist(&blob);
        self.dirty = false;
    }

    fn full_attempts(policy: AttemptPolicy) -> Option<u32> {
        match policy {
            AttemptPolicy::Unlimited => None,
            AttemptPolicy::Limited(max) => Some(max),
        }
    }
}

impl<H: EncounterHooks> Drop for EncounterStateMachine<H> {
    fn drop(&mut self) {
        if self.dirty {
            debug!(target: "encounter", header = %self.layout.header, "flushing unsaved state on unload");
            self.persist();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::boundary::Boundary;
    use crate::hooks::DoorId;
    use crate::layout::SlotLayout;
    use EncounterState::*;

    #[derive(Default)]
    struct Recorder {
        gate: Vec<bool>,
        doors: HashMap<DoorId, bool>,
        lockouts: Vec<usize>,
        saves: Vec<String>,
    }

    impl EncounterHooks for Recorder {
        fn set_encounter_gate(&mut self, closed: bool) {
            self.gate.push(closed);
        }

        fn set_door(&mut self, door: DoorId, open: bool) {
            self.doors.insert(door, open);
        }

        fn on_lockout(&mut self, slot: usize) {
            self.lockouts.push(slot);
        }

        fn persist(&mut self, blob: &str) {
            self.saves.push(blob.to_string());
        }
    }

    fn machine(slots: usize, attempts: AttemptPolicy) -> EncounterStateMachine<Recorder> {
        let layout = EncounterLayout::with_slot_count("NAXX", slots).attempts(attempts);
        EncounterStateMachine::new(layout, Recorder::default()).unwrap()
    }

    #[test]
    fn fail_with_attempts_left_rolls_back_and_opens_gate() {
        let mut m = machine(10, AttemptPolicy::Limited(3));
        assert!(m.set_boss_state(0, InProgress));
        assert_eq!(m.hooks().gate.last(), Some(&true));

        assert!(m.set_boss_state(0, Fail));
        assert_eq!(m.boss_state(0), Some(NotStarted));
        assert_eq!(m.attempts_remaining(), Some(2));
        assert_eq!(m.hooks().gate.last(), Some(&false));
        // the attempt change is persisted
        assert_eq!(m.hooks().saves.len(), 1);
    }

    #[test]
    fn gate_stays_closed_while_another_slot_is_active() {
        let mut m = machine(3, AttemptPolicy::Unlimited);
        m.set_boss_state(0, InProgress);
        m.set_boss_state(1, InProgress);
        m.set_boss_state(1, Special);
        m.set_boss_state(0, Fail);
        assert_eq!(m.boss_state(0), Some(NotStarted));
        assert_eq!(m.hooks().gate.last(), Some(&true));
        assert!(m.is_encounter_in_progress());
    }

    #[test]
    fn last_attempt_locks_out_and_keeps_fail() {
        let mut m = machine(2, AttemptPolicy::Limited(1));
        m.set_boss_state(1, InProgress);
        assert_eq!(m.try_set_boss_state(1, Fail), Ok(Fail));
        assert_eq!(m.boss_state(1), Some(Fail));
        assert!(m.is_locked_out());
        assert_eq!(m.hooks().lockouts, vec![1]);

        // an explicit reset from Fail is still allowed
        assert!(m.set_boss_state(1, NotStarted));
    }

    #[test]
    fn wipe_from_special_stage_consumes_an_attempt() {
        let mut m = machine(2, AttemptPolicy::Limited(3));
        m.set_boss_state(0, InProgress);
        m.set_boss_state(0, Special);
        assert!(!m.set_boss_state(0, Fail));

        assert_eq!(m.wipe(0), Ok(NotStarted));
        assert_eq!(m.boss_state(0), Some(NotStarted));
        assert_eq!(m.attempts_remaining(), Some(2));
        assert_eq!(m.hooks().gate.last(), Some(&false));
        assert_eq!(m.hooks().saves.last().map(String::as_str), Some("NAXX 0 0 a=2"));
    }

    #[test]
    fn wipe_needs_an_active_slot() {
        let mut m = machine(2, AttemptPolicy::Limited(3));
        assert_eq!(
            m.wipe(0),
            Err(TransitionError::Illegal {
                slot: 0,
                from: NotStarted,
                to: Fail
            })
        );
        assert_eq!(m.wipe(4), Err(TransitionError::InvalidSlot { slot: 4, count: 2 }));
        assert_eq!(m.attempts_remaining(), Some(3));
        assert!(m.hooks().saves.is_empty());
    }

    #[test]
    fn rejected_requests_have_no_side_effects() {
        let mut m = machine(2, AttemptPolicy::Unlimited);
        assert_eq!(
            m.try_set_boss_state(5, InProgress),
            Err(TransitionError::InvalidSlot { slot: 5, count: 2 })
        );
        assert_eq!(
            m.try_set_boss_state(0, NotStarted),
            Err(TransitionError::Unchanged {
                slot: 0,
                state: NotStarted
            })
        );
        assert!(!m.set_boss_state(0, Done));
        assert!(m.hooks().gate.is_empty());
        assert!(m.hooks().saves.is_empty());
    }

    #[test]
    fn done_persists_and_is_terminal_until_reset() {
        let mut m = machine(2, AttemptPolicy::Unlimited);
        m.set_boss_state(0, InProgress);
        assert!(m.set_boss_state(0, Done));
        assert_eq!(m.hooks().saves, vec!["NAXX 3 0".to_string()]);

        assert!(!m.set_boss_state(0, InProgress));
        assert!(m.reset_slot(0));
        assert_eq!(m.boss_state(0), Some(NotStarted));
        assert_eq!(m.hooks().saves.last().map(String::as_str), Some("NAXX 0 0"));
        assert!(!m.reset_slot(0));
    }

    #[test]
    fn dirty_data_is_saved_with_next_transition() {
        let mut m = machine(1, AttemptPolicy::Unlimited);
        m.set_data(4, 17);
        assert!(m.is_dirty());
        assert!(m.hooks().saves.is_empty());

        m.set_boss_state(0, InProgress);
        assert_eq!(m.hooks().saves, vec!["NAXX 1 d4=17".to_string()]);
        assert!(!m.is_dirty());
        assert_eq!(m.data(4), 17);
        assert_eq!(m.data(5), 0);
    }

    #[test]
    fn setting_same_data_value_does_not_dirty() {
        let mut m = machine(1, AttemptPolicy::Unlimited);
        m.set_data(1, 5);
        assert!(m.flush());
        m.set_data(1, 5);
        assert!(!m.is_dirty());
        assert!(!m.flush());
    }

    #[test]
    fn save_load_round_trip_drops_in_progress() {
        let mut m = machine(4, AttemptPolicy::Limited(5));
        m.set_boss_state(0, InProgress);
        m.set_boss_state(0, Done);
        m.set_boss_state(1, InProgress);
        m.set_boss_state(2, InProgress);
        m.set_boss_state(2, Special);
        m.set_boss_state(3, InProgress);
        m.set_boss_state(3, Fail);
        m.set_boss_state(3, InProgress);
        m.set_data(9, 2);
        let blob = m.save();

        let mut restored = machine(4, AttemptPolicy::Limited(5));
        assert_eq!(restored.load(&blob), LoadOutcome::Restored);
        assert_eq!(restored.states(), &[Done, NotStarted, Special, NotStarted]);
        assert_eq!(restored.attempts_remaining(), Some(4));
        assert_eq!(restored.data(9), 2);
        assert_eq!(restored.hooks().gate.last(), Some(&true));
    }

    #[test]
    fn malformed_blob_degrades_to_defaults() {
        let mut m = machine(3, AttemptPolicy::Limited(3));
        m.set_boss_state(0, InProgress);
        m.set_boss_state(0, Done);
        m.set_data(1, 1);

        let outcome = m.load("NAXX 3 3");
        assert!(matches!(outcome, LoadOutcome::Defaulted(BlobError::Truncated { .. })));
        assert_eq!(m.states(), &[NotStarted; 3]);
        assert_eq!(m.attempts_remaining(), Some(3));
        assert_eq!(m.data(1), 0);
        assert!(!m.is_dirty());

        assert!(matches!(
            m.load("something else entirely"),
            LoadOutcome::Defaulted(BlobError::HeaderMismatch { .. })
        ));
    }

    #[test]
    fn loaded_attempts_are_clamped_to_policy() {
        let mut m = machine(1, AttemptPolicy::Limited(3));
        m.load("NAXX 0 a=50");
        assert_eq!(m.attempts_remaining(), Some(3));

        let mut unlimited = machine(1, AttemptPolicy::Unlimited);
        unlimited.load("NAXX 0 a=2");
        assert_eq!(unlimited.attempts_remaining(), None);
    }

    #[test]
    fn doors_follow_their_slot() {
        let room = DoorId(10);
        let passage = DoorId(11);
        let layout = EncounterLayout::new(
            "ONY",
            vec![
                SlotLayout::named("onyxia")
                    .door(room, DoorKind::Room)
                    .door(passage, DoorKind::Passage),
            ],
        );
        let mut m = EncounterStateMachine::new(layout, Recorder::default()).unwrap();
        m.apply_side_effects();
        assert!(m.hooks().doors[&room]);
        assert!(!m.hooks().doors[&passage]);

        m.set_boss_state(0, InProgress);
        assert!(!m.hooks().doors[&room]);
        assert!(!m.hooks().doors[&passage]);

        m.set_boss_state(0, Done);
        assert!(m.hooks().doors[&room]);
        assert!(m.hooks().doors[&passage]);
    }

    #[test]
    fn boundary_lookup_per_slot() {
        let layout = EncounterLayout::new(
            "ONY",
            vec![SlotLayout::named("onyxia").boundary(Boundary::circle(Position::new(0.0, 0.0), 30.0))],
        );
        let m = EncounterStateMachine::new(layout, NoopHooks).unwrap();
        assert!(m.is_within_boundary(0, Position::new(10.0, 10.0)));
        assert!(!m.is_within_boundary(0, Position::new(40.0, 0.0)));
        assert!(m.is_within_boundary(3, Position::new(40.0, 0.0)));
    }

    #[test]
    fn drop_flushes_pending_changes() {
        use std::sync::{Arc, Mutex};

        struct Shared(Arc<Mutex<Vec<String>>>);
        impl EncounterHooks for Shared {
            fn set_encounter_gate(&mut self, _closed: bool) {}
            fn persist(&mut self, blob: &str) {
                self.0.lock().unwrap().push(blob.to_string());
            }
        }

        let saves = Arc::new(Mutex::new(Vec::new()));
        {
            let layout = EncounterLayout::with_slot_count("ZG", 1);
            let mut m = EncounterStateMachine::new(layout, Shared(Arc::clone(&saves))).unwrap();
            m.set_data(2, 8);
        }
        assert_eq!(*saves.lock().unwrap(), vec!["ZG 0 d2=8".to_string()]);
    }
}
