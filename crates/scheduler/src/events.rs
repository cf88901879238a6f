//! Id-based event scheduler.
//!
//! The controller schedules opaque event ids ("cast Flame Breath", "summon
//! adds") with a randomized delay, advances the clock once per tick and then
//! dispatches whatever became due. Events can be restricted to encounter
//! phases and tagged with a group for bulk cancellation.
//!
//! # Dispatch
//!
//! [`EventScheduler::execute_events`] takes a snapshot of due, phase-eligible
//! events before invoking anything. Each event leaves the queue right before
//! its callback runs, and the callback receives the scheduler itself so it
//! can schedule or cancel further events. Events inserted during the pass are
//! never part of the snapshot; events cancelled by an earlier callback of the
//! same pass are skipped.

use std::fmt::Debug;
use std::ops::ControlFlow;
use std::time::Duration;

use tracing::{debug, trace};

use crate::clock::Timestamp;
use crate::delay::{DelayRange, DelayRoller};
use crate::phase::{GroupId, PhaseMask};
use crate::timeline::{Entry, Timeline};

/// Everything needed to enqueue one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventSpec<E> {
    pub id: E,
    pub delay: DelayRange,
    pub group: Option<GroupId>,
    pub phases: PhaseMask,
    pub repeat: Option<DelayRange>,
}

impl<E> EventSpec<E> {
    pub fn new(id: E, delay: impl Into<DelayRange>) -> Self {
        Self {
            id,
            delay: delay.into(),
            group: None,
            phases: PhaseMask::ALL,
            repeat: None,
        }
    }

    #[must_use]
    pub fn group(mut self, group: GroupId) -> Self {
        self.group = group.tag();
        self
    }

    #[must_use]
    pub fn phases(mut self, phases: PhaseMask) -> Self {
        self.phases = phases;
        self
    }

    /// Re-enqueue the event with a fresh roll of `every` each time it fires.
    #[must_use]
    pub fn repeat(mut self, every: impl Into<DelayRange>) -> Self {
        self.repeat = Some(every.into());
        self
    }
}

#[derive(Debug)]
struct QueuedEvent<E> {
    id: E,
    repeat: Option<DelayRange>,
}

/// Per-controller queue of timed event ids.
#[derive(Debug)]
pub struct EventScheduler<E> {
    timeline: Timeline<QueuedEvent<E>>,
    phase: PhaseMask,
    roller: DelayRoller,
}

impl<E> EventScheduler<E>
where
    E: Copy + PartialEq + Debug,
{
    pub fn new() -> Self {
        Self::with_roller(DelayRoller::from_entropy())
    }

    /// Scheduler whose delay rolls are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_roller(DelayRoller::seeded(seed))
    }

    pub fn with_roller(roller: DelayRoller) -> Self {
        Self {
            timeline: Timeline::new(),
            phase: PhaseMask::empty(),
            roller,
        }
    }

    /// Current scheduler clock.
    pub fn now(&self) -> Timestamp {
        self.timeline.now()
    }

    /// Schedules `id` after `delay`, eligible in every phase.
    pub fn schedule_event(&mut self, id: E, delay: impl Into<DelayRange>) -> Timestamp {
        self.schedule(EventSpec::new(id, delay))
    }

    /// Schedules an event and returns its absolute deadline.
    pub fn schedule(&mut self, spec: EventSpec<E>) -> Timestamp {
        let deadline = self.now() + self.roller.roll(spec.delay);
        trace!(
            target: "scheduler::events",
            id = ?spec.id,
            %deadline,
            group = ?spec.group,
            phases = spec.phases.bits(),
            "event scheduled"
        );
        self.timeline.insert(
            deadline,
            Entry {
                group: spec.group,
                phases: spec.phases,
                payload: QueuedEvent {
                    id: spec.id,
                    repeat: spec.repeat,
                },
            },
        );
        deadline
    }

    /// Cancels every queued event with `id`, then schedules a fresh one.
    pub fn reschedule_event(&mut self, id: E, delay: impl Into<DelayRange>) -> Timestamp {
        self.cancel_event(&id);
        self.schedule_event(id, delay)
    }

    /// Advances the clock. Nothing is dispatched here.
    pub fn update(&mut self, dt: Duration) {
        self.timeline.advance(dt);
    }

    /// Dispatches every event that is due and eligible in the current phase.
    ///
    /// Returns the number of callbacks invoked.
    pub fn execute_events<F>(&mut self, mut callback: F) -> usize
    where
        F: FnMut(&mut Self, E),
    {
        self.execute_events_until(|events, id| {
            callback(events, id);
            ControlFlow::Continue(())
        })
    }

    /// Like [`Self::execute_events`], but the pass ends as soon as a callback
    /// returns `Break`. Snapshot entries not yet dispatched stay queued with
    /// their original deadlines.
    pub fn execute_events_until<F>(&mut self, mut callback: F) -> usize
    where
        F: FnMut(&mut Self, E) -> ControlFlow<()>,
    {
        let snapshot = self.timeline.due_keys(self.phase);
        let mut fired = 0;

        for key in snapshot {
            let Some(entry) = self.timeline.remove(&key) else {
                // cancelled by an earlier callback in this pass
                continue;
            };

            let id = entry.payload.id;
            if let Some(every) = entry.payload.repeat {
                let deadline = self.now() + self.roller.roll(every);
                self.timeline.insert(deadline, entry);
            }

            trace!(target: "scheduler::events", ?id, now = %self.now(), "event fired");
            fired += 1;
            if callback(self, id).is_break() {
                debug!(target: "scheduler::events", fired, "dispatch pass interrupted");
                break;
            }
        }

        fired
    }

    /// Removes every queued event with `id`. Unknown ids are a no-op.
    pub fn cancel_event(&mut self, id: &E) -> usize {
        let removed = self.timeline.remove_where(|entry| entry.payload.id == *id);
        if removed > 0 {
            debug!(target: "scheduler::events", ?id, removed, "events cancelled");
        }
        removed
    }

    /// Removes every queued event tagged with `group`.
    pub fn cancel_group(&mut self, group: GroupId) -> usize {
        let removed = self.timeline.remove_where(|entry| group.matches(entry.group));
        if removed > 0 {
            debug!(target: "scheduler::events", %group, removed, "event group cancelled");
        }
        removed
    }

    /// Pushes back every queued event.
    pub fn delay_events(&mut self, by: Duration) -> usize {
        self.timeline.delay_where(by, |_| true)
    }

    /// Pushes back every queued event tagged with `group`.
    pub fn delay_group(&mut self, group: GroupId, by: Duration) -> usize {
        self.timeline.delay_where(by, |entry| group.matches(entry.group))
    }

    /// Replaces the active phase set. Queued events are untouched.
    pub fn set_phase(&mut self, phase: PhaseMask) {
        debug!(
            target: "scheduler::events",
            from = self.phase.bits(),
            to = phase.bits(),
            "phase changed"
        );
        self.phase = phase;
    }

    pub fn add_phase(&mut self, phase: PhaseMask) {
        self.set_phase(self.phase | phase);
    }

    pub fn remove_phase(&mut self, phase: PhaseMask) {
        self.set_phase(self.phase - phase);
    }

    pub fn phase(&self) -> PhaseMask {
        self.phase
    }

    /// True when the active phase set intersects `phase`.
    pub fn is_in_phase(&self, phase: PhaseMask) -> bool {
        self.phase.intersects(phase)
    }

    /// Time until the earliest queued event with `id` is due.
    pub fn time_until(&self, id: &E) -> Option<Duration> {
        self.timeline
            .iter()
            .find(|(_, entry)| entry.payload.id == *id)
            .map(|(key, _)| key.deadline.saturating_since(self.now()))
    }

    pub fn is_scheduled(&self, id: &E) -> bool {
        self.timeline.iter().any(|(_, entry)| entry.payload.id == *id)
    }

    /// Drops every queued event. The phase set is kept.
    pub fn reset(&mut self) {
        if !self.timeline.is_empty() {
            debug!(
                target: "scheduler::events",
                dropped = self.timeline.len(),
                "event scheduler reset"
            );
        }
        self.timeline.clear();
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }
}

impl<E> Default for EventScheduler<E>
where
    E: Copy + PartialEq + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Ev {
        Breath,
        Tail,
        Adds,
        Enrage,
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn drain(events: &mut EventScheduler<Ev>) -> Vec<Ev> {
        let mut out = Vec::new();
        events.execute_events(|_, id| out.push(id));
        out
    }

    #[test]
    fn fixed_delay_fires_exactly_once() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule_event(Ev::Breath, ms(5_000));

        events.update(ms(5_000));
        assert_eq!(drain(&mut events), vec![Ev::Breath]);

        events.update(ms(5_000));
        assert!(drain(&mut events).is_empty());
    }

    #[test]
    fn nothing_fires_before_deadline() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule_event(Ev::Breath, ms(1_000));
        events.update(ms(999));
        assert!(drain(&mut events).is_empty());
        events.update(ms(1));
        assert_eq!(drain(&mut events), vec![Ev::Breath]);
    }

    #[test]
    fn deadlines_respect_random_range() {
        let mut events = EventScheduler::with_seed(99);
        events.update(ms(1_234));
        for _ in 0..200 {
            let now = events.now();
            let deadline = events.schedule_event(Ev::Tail, (ms(2_000), ms(3_000)));
            let offset = deadline.as_millis() - now.as_millis();
            assert!((2_000..=3_000).contains(&offset), "offset {offset}");
        }
    }

    #[test]
    fn reversed_range_is_corrected_not_rejected() {
        let mut events = EventScheduler::with_seed(3);
        let deadline = events.schedule_event(Ev::Tail, (ms(800), ms(200)));
        assert!((200..=800).contains(&deadline.as_millis()));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn fires_in_deadline_order_with_stable_ties() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule_event(Ev::Adds, ms(300));
        events.schedule_event(Ev::Breath, ms(100));
        events.schedule_event(Ev::Tail, ms(300));
        events.schedule_event(Ev::Enrage, ms(200));

        events.update(ms(300));
        assert_eq!(
            drain(&mut events),
            vec![Ev::Breath, Ev::Enrage, Ev::Adds, Ev::Tail]
        );
    }

    #[test]
    fn duplicate_ids_are_distinct_events() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule_event(Ev::Adds, ms(10));
        events.schedule_event(Ev::Adds, ms(10));
        events.update(ms(10));
        assert_eq!(drain(&mut events), vec![Ev::Adds, Ev::Adds]);
    }

    #[test]
    fn interrupted_pass_leaves_rest_queued() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule_event(Ev::Breath, ms(100));
        events.schedule_event(Ev::Tail, ms(100));
        events.schedule_event(Ev::Adds, ms(200));
        events.update(ms(200));

        let mut fired = Vec::new();
        let count = events.execute_events_until(|_, id| {
            fired.push(id);
            ControlFlow::Break(())
        });
        assert_eq!(count, 1);
        assert_eq!(fired, vec![Ev::Breath]);
        assert_eq!(events.len(), 2);

        assert_eq!(drain(&mut events), vec![Ev::Tail, Ev::Adds]);
    }

    #[test]
    fn phase_gates_eligibility() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule(EventSpec::new(Ev::Breath, ms(100)).phases(PhaseMask::phase(2)));
        events.schedule(EventSpec::new(Ev::Tail, ms(100)).phases(PhaseMask::phase(1)));
        events.schedule_event(Ev::Enrage, ms(100));
        events.set_phase(PhaseMask::phase(1));

        events.update(ms(100));
        assert_eq!(drain(&mut events), vec![Ev::Tail, Ev::Enrage]);

        // stays queued until its phase comes up
        events.update(ms(10_000));
        assert!(drain(&mut events).is_empty());
        assert!(events.is_scheduled(&Ev::Breath));

        events.set_phase(PhaseMask::phase(2));
        assert_eq!(drain(&mut events), vec![Ev::Breath]);
    }

    #[test]
    fn phase_helpers_compose() {
        let mut events = EventScheduler::<Ev>::with_seed(1);
        events.set_phase(PhaseMask::phase(1));
        events.add_phase(PhaseMask::phase(3));
        assert!(events.is_in_phase(PhaseMask::phase(1)));
        assert!(events.is_in_phase(PhaseMask::phase(3)));
        events.remove_phase(PhaseMask::phase(1));
        assert!(!events.is_in_phase(PhaseMask::phase(1)));
        assert_eq!(events.phase(), PhaseMask::phase(3));
    }

    #[test]
    fn event_scheduled_for_now_inside_callback_waits_for_next_pass() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule_event(Ev::Breath, ms(100));
        events.update(ms(100));

        let mut fired = Vec::new();
        events.execute_events(|events, id| {
            fired.push(id);
            events.schedule_event(Ev::Tail, Duration::ZERO);
        });
        assert_eq!(fired, vec![Ev::Breath]);
        assert!(events.is_scheduled(&Ev::Tail));

        events.update(ms(1));
        assert_eq!(drain(&mut events), vec![Ev::Tail]);
    }

    #[test]
    fn callback_can_cancel_later_snapshot_entries() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule_event(Ev::Breath, ms(10));
        events.schedule_event(Ev::Tail, ms(20));
        events.schedule_event(Ev::Adds, ms(30));
        events.update(ms(30));

        let mut fired = Vec::new();
        events.execute_events(|events, id| {
            fired.push(id);
            if id == Ev::Breath {
                events.cancel_event(&Ev::Tail);
            }
        });
        assert_eq!(fired, vec![Ev::Breath, Ev::Adds]);
        assert!(events.is_empty());
    }

    #[test]
    fn cancel_group_removes_all_tagged_events() {
        let adds = GroupId(1);
        let mut events = EventScheduler::with_seed(1);
        events.schedule(EventSpec::new(Ev::Adds, ms(100)).group(adds));
        events.schedule(EventSpec::new(Ev::Tail, ms(200)).group(adds));
        events.schedule_event(Ev::Breath, ms(150));

        assert_eq!(events.cancel_group(adds), 2);
        assert_eq!(events.cancel_group(adds), 0);

        events.update(ms(1_000));
        assert_eq!(drain(&mut events), vec![Ev::Breath]);
    }

    #[test]
    fn group_zero_never_cancels_ungrouped_events() {
        let mut events = EventScheduler::with_seed(1);
        let spec = EventSpec::new(Ev::Adds, ms(100)).group(GroupId::NONE);
        assert_eq!(spec.group, None);
        events.schedule(spec);
        events.schedule_event(Ev::Breath, ms(150));

        assert_eq!(events.cancel_group(GroupId::NONE), 0);
        assert_eq!(events.delay_group(GroupId::NONE, ms(500)), 0);

        events.update(ms(1_000));
        assert_eq!(drain(&mut events), vec![Ev::Adds, Ev::Breath]);
    }

    #[test]
    fn cancelling_unknown_ids_is_a_no_op() {
        let mut events = EventScheduler::<Ev>::with_seed(1);
        assert_eq!(events.cancel_event(&Ev::Enrage), 0);
        assert_eq!(events.cancel_group(GroupId(7)), 0);
    }

    #[test]
    fn repeating_event_refires_after_interval() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule(EventSpec::new(Ev::Tail, ms(100)).repeat(ms(100)));

        events.update(ms(100));
        assert_eq!(drain(&mut events), vec![Ev::Tail]);
        // the repeat is not re-dispatched within the same clock instant
        assert!(drain(&mut events).is_empty());

        events.update(ms(100));
        assert_eq!(drain(&mut events), vec![Ev::Tail]);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn callback_can_stop_a_repeating_event() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule(EventSpec::new(Ev::Tail, ms(100)).repeat(ms(100)));
        events.update(ms(100));
        events.execute_events(|events, id| {
            events.cancel_event(&id);
        });
        assert!(events.is_empty());
    }

    #[test]
    fn reset_clears_events_but_keeps_phase() {
        let mut events = EventScheduler::with_seed(1);
        events.set_phase(PhaseMask::phase(2));
        events.schedule_event(Ev::Breath, ms(100));
        events.schedule_event(Ev::Tail, ms(200));
        events.reset();
        assert!(events.is_empty());
        assert_eq!(events.phase(), PhaseMask::phase(2));
    }

    #[test]
    fn delays_and_time_until() {
        let group = GroupId(2);
        let mut events = EventScheduler::with_seed(1);
        events.schedule(EventSpec::new(Ev::Adds, ms(1_000)).group(group));
        events.schedule_event(Ev::Breath, ms(500));

        events.delay_group(group, ms(250));
        assert_eq!(events.time_until(&Ev::Adds), Some(ms(1_250)));

        events.delay_events(ms(100));
        assert_eq!(events.time_until(&Ev::Breath), Some(ms(600)));

        events.update(ms(700));
        assert_eq!(events.time_until(&Ev::Adds), Some(ms(650)));
        assert_eq!(events.time_until(&Ev::Enrage), None);
    }

    #[test]
    fn reschedule_replaces_existing_copies() {
        let mut events = EventScheduler::with_seed(1);
        events.schedule_event(Ev::Enrage, ms(100));
        events.schedule_event(Ev::Enrage, ms(200));
        events.reschedule_event(Ev::Enrage, ms(1_000));
        assert_eq!(events.len(), 1);
        assert_eq!(events.time_until(&Ev::Enrage), Some(ms(1_000)));
    }
}
