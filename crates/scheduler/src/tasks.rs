//! Closure-based task scheduler.
//!
//! A task is a boxed closure that runs once when its deadline passes. While
//! running it receives the owner state `C` and a [`TaskContext`] through
//! which it can repeat itself, schedule follow-up tasks, or cancel groups.
//!
//! ```text
//! Pending --(due, validator passes)--> Executing --repeat()--> Pending
//!                                          |
//!                                          +--(no repeat)--> Terminated
//! ```
//!
//! The optional validator is checked before every individual task. When it
//! fails the pass stops and all remaining due tasks stay queued at their
//! original deadlines, to be retried on the next update.

use std::time::Duration;

use tracing::{debug, trace};

use crate::clock::Timestamp;
use crate::delay::{DelayRange, DelayRoller};
use crate::phase::{GroupId, PhaseMask};
use crate::timeline::{Entry, Timeline};

/// Boxed task body.
pub type TaskFn<C> = Box<dyn FnMut(&mut C, &mut TaskContext<C>) + Send>;

type Validator<C> = Box<dyn Fn(&C) -> bool + Send>;

/// Grouping and phase options for a scheduled task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskOptions {
    pub group: Option<GroupId>,
    pub phases: PhaseMask,
}

impl TaskOptions {
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
}

struct Task<C> {
    run: TaskFn<C>,
    repeat_count: u32,
}

enum TaskOp<C> {
    Schedule {
        options: TaskOptions,
        delay: DelayRange,
        run: TaskFn<C>,
    },
    CancelGroup(GroupId),
    CancelAll,
    DelayAll(Duration),
    DelayGroup(GroupId, Duration),
}

/// Handle given to a running task.
///
/// Requests made here are applied once the task returns. Tasks created
/// through the context only become eligible after the current pass.
pub struct TaskContext<C> {
    group: Option<GroupId>,
    repeat_count: u32,
    repeat: Option<DelayRange>,
    ops: Vec<TaskOp<C>>,
}

impl<C> TaskContext<C> {
    fn new(group: Option<GroupId>, repeat_count: u32) -> Self {
        Self {
            group,
            repeat_count,
            repeat: None,
            ops: Vec::new(),
        }
    }

    /// Re-enqueue this task after `delay`. Calling it again overrides the
    /// previous delay.
    pub fn repeat(&mut self, delay: impl Into<DelayRange>) {
        self.repeat = Some(delay.into());
    }

    /// How many times this task has already been repeated.
    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Group the task keeps if it repeats.
    pub fn set_group(&mut self, group: GroupId) {
        self.group = group.tag();
    }

    pub fn clear_group(&mut self) {
        self.group = None;
    }

    pub fn schedule<F>(&mut self, delay: impl Into<DelayRange>, task: F)
    where
        F: FnMut(&mut C, &mut TaskContext<C>) + Send + 'static,
    {
        self.schedule_with(TaskOptions::default(), delay, task);
    }

    pub fn schedule_with<F>(&mut self, options: TaskOptions, delay: impl Into<DelayRange>, task: F)
    where
        F: FnMut(&mut C, &mut TaskContext<C>) + Send + 'static,
    {
        self.ops.push(TaskOp::Schedule {
            options,
            delay: delay.into(),
            run: Box::new(task),
        });
    }

    pub fn cancel_group(&mut self, group: GroupId) {
        self.ops.push(TaskOp::CancelGroup(group));
    }

    /// Cancels every other pending task. A repeat requested by this task
    /// still applies.
    pub fn cancel_all(&mut self) {
        self.ops.push(TaskOp::CancelAll);
    }

    pub fn delay_all(&mut self, by: Duration) {
        self.ops.push(TaskOp::DelayAll(by));
    }

    pub fn delay_group(&mut self, group: GroupId, by: Duration) {
        self.ops.push(TaskOp::DelayGroup(group, by));
    }
}

/// Per-owner queue of timed closures.
pub struct TaskScheduler<C> {
    timeline: Timeline<Task<C>>,
    validator: Option<Validator<C>>,
    phase: PhaseMask,
    roller: DelayRoller,
}

/// Tasks created during a pass, inserted once the pass ends.
type Deferred<C> = Vec<(Timestamp, Entry<Task<C>>)>;

impl<C> TaskScheduler<C> {
    pub fn new() -> Self {
        Self::with_roller(DelayRoller::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_roller(DelayRoller::seeded(seed))
    }

    pub fn with_roller(roller: DelayRoller) -> Self {
        Self {
            timeline: Timeline::new(),
            validator: None,
            phase: PhaseMask::empty(),
            roller,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.timeline.now()
    }

    /// Installs the readiness gate consulted before each task runs.
    pub fn set_validator<P>(&mut self, predicate: P)
    where
        P: Fn(&C) -> bool + Send + 'static,
    {
        self.validator = Some(Box::new(predicate));
    }

    pub fn clear_validator(&mut self) {
        self.validator = None;
    }

    pub fn schedule<F>(&mut self, delay: impl Into<DelayRange>, task: F) -> Timestamp
    where
        F: FnMut(&mut C, &mut TaskContext<C>) + Send + 'static,
    {
        self.schedule_with(TaskOptions::default(), delay, task)
    }

    pub fn schedule_in_group<F>(
        &mut self,
        group: GroupId,
        delay: impl Into<DelayRange>,
        task: F,
    ) -> Timestamp
    where
        F: FnMut(&mut C, &mut TaskContext<C>) + Send + 'static,
    {
        self.schedule_with(TaskOptions::default().group(group), delay, task)
    }

    pub fn schedule_with<F>(
        &mut self,
        options: TaskOptions,
        delay: impl Into<DelayRange>,
        task: F,
    ) -> Timestamp
    where
        F: FnMut(&mut C, &mut TaskContext<C>) + Send + 'static,
    {
        let (deadline, entry) = self.make_entry(options, delay.into(), Box::new(task));
        self.timeline.insert(deadline, entry);
        deadline
    }

    /// Advances the clock and runs every due, permitted task.
    ///
    /// Returns the number of tasks executed.
    pub fn update(&mut self, dt: Duration, owner: &mut C) -> usize {
        self.timeline.advance(dt);

        let mut deferred: Deferred<C> = Vec::new();
        let mut executed = 0;

        loop {
            if let Some(validator) = &self.validator
                && !validator(&*owner)
            {
                trace!(target: "scheduler::tasks", now = %self.now(), "validator holding tasks");
                break;
            }

            let Some(key) = self.timeline.first_due(self.phase) else {
                break;
            };
            let Some(Entry {
                group,
                phases,
                payload: mut task,
            }) = self.timeline.remove(&key)
            else {
                break;
            };

            let mut ctx = TaskContext::new(group, task.repeat_count);
            (task.run)(owner, &mut ctx);
            executed += 1;

            let TaskContext {
                group, repeat, ops, ..
            } = ctx;
            for op in ops {
                self.apply(op, &mut deferred);
            }

            if let Some(every) = repeat {
                task.repeat_count += 1;
                let deadline = self.now() + self.roller.roll(every);
                deferred.push((
                    deadline,
                    Entry {
                        group,
                        phases,
                        payload: task,
                    },
                ));
            }
        }

        for (deadline, entry) in deferred {
            self.timeline.insert(deadline, entry);
        }
        executed
    }

    /// Removes every pending task tagged with `group`.
    pub fn cancel_group(&mut self, group: GroupId) -> usize {
        let removed = self.timeline.remove_where(|entry| group.matches(entry.group));
        if removed > 0 {
            debug!(target: "scheduler::tasks", %group, removed, "task group cancelled");
        }
        removed
    }

    pub fn cancel_all(&mut self) {
        self.timeline.clear();
    }

    pub fn delay_all(&mut self, by: Duration) -> usize {
        self.timeline.delay_where(by, |_| true)
    }

    pub fn delay_group(&mut self, group: GroupId, by: Duration) -> usize {
        self.timeline.delay_where(by, |entry| group.matches(entry.group))
    }

    pub fn set_phase(&mut self, phase: PhaseMask) {
        self.phase = phase;
    }

    pub fn phase(&self) -> PhaseMask {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    fn make_entry(
        &mut self,
        options: TaskOptions,
        delay: DelayRange,
        run: TaskFn<C>,
    ) -> (Timestamp, Entry<Task<C>>) {
        let deadline = self.now() + self.roller.roll(delay);
        trace!(target: "scheduler::tasks", %deadline, group = ?options.group, "task scheduled");
        (
            deadline,
            Entry {
                group: options.group,
                phases: options.phases,
                payload: Task {
                    run,
                    repeat_count: 0,
                },
            },
        )
    }

    fn apply(&mut self, op: TaskOp<C>, deferred: &mut Deferred<C>) {
        match op {
            TaskOp::Schedule {
                options,
                delay,
                run,
            } => {
                let pending = self.make_entry(options, delay, run);
                deferred.push(pending);
            }
            TaskOp::CancelGroup(group) => {
                self.cancel_group(group);
                deferred.retain(|(_, entry)| !group.matches(entry.group));
            }
            TaskOp::CancelAll => {
                self.cancel_all();
                deferred.clear();
            }
            TaskOp::DelayAll(by) => {
                self.delay_all(by);
                for (deadline, _) in deferred.iter_mut() {
                    *deadline += by;
                }
            }
            TaskOp::DelayGroup(group, by) => {
                self.delay_group(group, by);
                for (deadline, entry) in deferred.iter_mut() {
                    if group.matches(entry.group) {
                        *deadline += by;
                    }
                }
            }
        }
    }
}

impl<C> Default for TaskScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}
