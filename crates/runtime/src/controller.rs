//! Per-actor controllers.
//!
//! A [`Controller`] binds one actor to one [`Script`]. It owns the script's
//! [`EventScheduler`], advances it every tick and hands due events to the
//! script, which answers with actions on the [`ActionDispatcher`]. World
//! notifications arrive as [`HookEvent`]s. For actors bound to a boss slot
//! the controller applies the encounter defaults itself:
//!
//! - engaging marks the slot `InProgress`
//! - death marks it `Done` and clears pending events
//! - evading (explicit, or by leaving the slot's leash region) resolves it as
//!   a wipe (from `InProgress` or `Special`), clears pending events and sends
//!   the actor home
//!
//! The script's own hook, if it has one for the event kind, runs afterwards.

use std::fmt::Debug;
use std::ops::ControlFlow;
use std::time::Duration;

use tracing::{debug, trace, warn};

use encounter::{EncounterState, Position};
use scheduler::{EventScheduler, PhaseMask};

use crate::actions::{ActionDispatcher, ActorAction, ActorId, SpellId};
use crate::hooks::{HookEvent, HookTable};
use crate::instance::Instance;

/// Behaviour of one kind of actor.
pub trait Script: Sized + Send + 'static {
    /// Identifier of the script's scheduled events.
    type Event: Copy + PartialEq + Debug + Send + 'static;

    /// Hooks this script reacts to. Called once per controller.
    fn hooks() -> HookTable<Self> {
        HookTable::new()
    }

    /// A scheduled event came due.
    fn on_event(&mut self, event: Self::Event, ctx: &mut ScriptContext<'_, Self::Event>);

    /// Runs every tick before events are dispatched, busy or not.
    fn update(&mut self, _dt: Duration, _ctx: &mut ScriptContext<'_, Self::Event>) {}
}

/// What a script may touch while it runs.
pub struct ScriptContext<'a, E> {
    actor: ActorId,
    slot: Option<usize>,
    events: &'a mut EventScheduler<E>,
    dispatcher: &'a mut dyn ActionDispatcher,
    instance: Option<&'a mut Instance>,
}

impl<'a, E> ScriptContext<'a, E>
where
    E: Copy + PartialEq + Debug,
{
    fn new(
        actor: ActorId,
        slot: Option<usize>,
        events: &'a mut EventScheduler<E>,
        dispatcher: &'a mut dyn ActionDispatcher,
        instance: Option<&'a mut Instance>,
    ) -> Self {
        Self {
            actor,
            slot,
            events,
            dispatcher,
            instance,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Boss slot of the actor, `None` for adds and trash.
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub fn events(&mut self) -> &mut EventScheduler<E> {
        self.events
    }

    pub fn dispatch(&mut self, action: ActorAction) {
        trace!(target: "runtime::controller", actor = %self.actor, ?action, "dispatch");
        self.dispatcher.dispatch(self.actor, action);
    }

    pub fn cast(&mut self, spell: SpellId, target: Option<ActorId>) {
        self.dispatch(ActorAction::Cast { spell, target });
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy(self.actor)
    }

    pub fn position(&self) -> Option<Position> {
        self.dispatcher.position(self.actor)
    }

    pub fn instance(&self) -> Option<&Instance> {
        self.instance.as_deref()
    }

    pub fn instance_mut(&mut self) -> Option<&mut Instance> {
        self.instance.as_deref_mut()
    }

    /// State of the actor's own boss slot.
    pub fn boss_state(&self) -> Option<EncounterState> {
        let slot = self.slot?;
        self.instance.as_deref()?.boss_state(slot)
    }

    /// Requests a transition of the actor's own boss slot.
    pub fn set_boss_state(&mut self, state: EncounterState) -> bool {
        match (self.slot, self.instance.as_deref_mut()) {
            (Some(slot), Some(instance)) => instance.set_boss_state(slot, state),
            _ => false,
        }
    }
}

/// World access lent to controllers for one tick or notification.
pub struct ControllerEnv<'a> {
    pub dispatcher: &'a mut dyn ActionDispatcher,
    pub instance: Option<&'a mut Instance>,
}

impl<'a> ControllerEnv<'a> {
    pub fn new(dispatcher: &'a mut dyn ActionDispatcher) -> Self {
        Self {
            dispatcher,
            instance: None,
        }
    }

    #[must_use]
    pub fn with_instance(mut self, instance: &'a mut Instance) -> Self {
        self.instance = Some(instance);
        self
    }
}

/// Object-safe view of a controller, used to keep controllers of different
/// scripts side by side.
pub trait ActorController: Send {
    fn actor(&self) -> ActorId;

    fn slot(&self) -> Option<usize>;

    fn is_in_combat(&self) -> bool;

    fn pending_events(&self) -> usize;

    /// Advances the clock and dispatches due events. Returns how many events
    /// fired.
    fn update(&mut self, dt: Duration, env: &mut ControllerEnv<'_>) -> usize;

    fn notify(&mut self, event: HookEvent, env: &mut ControllerEnv<'_>);
}

pub struct Controller<S: Script> {
    actor: ActorId,
    slot: Option<usize>,
    script: S,
    hooks: HookTable<S>,
    events: EventScheduler<S::Event>,
    in_combat: bool,
}

impl<S: Script> Controller<S> {
    pub fn new(actor: ActorId, slot: Option<usize>, script: S) -> Self {
        Self::with_events(actor, slot, script, EventScheduler::new())
    }

    /// Like [`Self::new`] with a caller-supplied scheduler, e.g. a seeded one.
    pub fn with_events(
        actor: ActorId,
        slot: Option<usize>,
        script: S,
        events: EventScheduler<S::Event>,
    ) -> Self {
        let hooks = S::hooks();
        debug!(target: "runtime::controller", %actor, ?slot, ?hooks, "controller created");
        Self {
            actor,
            slot,
            script,
            hooks,
            events,
            in_combat: false,
        }
    }

    pub fn script(&self) -> &S {
        &self.script
    }

    pub fn script_mut(&mut self) -> &mut S {
        &mut self.script
    }

    pub fn events(&self) -> &EventScheduler<S::Event> {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventScheduler<S::Event> {
        &mut self.events
    }

    pub fn hooks(&self) -> &HookTable<S> {
        &self.hooks
    }

    fn has_left_boundary(&self, env: &ControllerEnv<'_>) -> bool {
        let (Some(slot), Some(instance)) = (self.slot, env.instance.as_deref()) else {
            return false;
        };
        let Some(pos) = env.dispatcher.position(self.actor) else {
            return false;
        };
        !instance.is_within_boundary(slot, pos)
    }

    fn set_slot_state(&self, state: EncounterState, env: &mut ControllerEnv<'_>) -> bool {
        match (self.slot, env.instance.as_deref_mut()) {
            (Some(slot), Some(instance)) => instance.set_boss_state(slot, state),
            _ => false,
        }
    }

    fn apply_boss_defaults(&mut self, event: &HookEvent, env: &mut ControllerEnv<'_>) {
        match event {
            HookEvent::EnterCombat { .. } => {
                self.in_combat = true;
                self.set_slot_state(EncounterState::InProgress, env);
            }
            HookEvent::Death { .. } => {
                self.in_combat = false;
                self.events.reset();
                self.events.set_phase(PhaseMask::empty());
                self.set_slot_state(EncounterState::Done, env);
            }
            HookEvent::Evade => {
                self.in_combat = false;
                self.events.reset();
                self.events.set_phase(PhaseMask::empty());
                env.dispatcher.dispatch(self.actor, ActorAction::Evade);
                if let (Some(slot), Some(instance)) = (self.slot, env.instance.as_deref_mut())
                    && let Err(err) = instance.wipe(slot)
                {
                    debug!(target: "runtime::controller", actor = %self.actor, %err, "evade left boss state unchanged");
                }
            }
            _ => {}
        }
    }
}

impl<S: Script> ActorController for Controller<S> {
    fn actor(&self) -> ActorId {
        self.actor
    }

    fn slot(&self) -> Option<usize> {
        self.slot
    }

    fn is_in_combat(&self) -> bool {
        self.in_combat
    }

    fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn update(&mut self, dt: Duration, env: &mut ControllerEnv<'_>) -> usize {
        self.events.update(dt);

        if self.in_combat && self.has_left_boundary(env) {
            warn!(target: "runtime::controller", actor = %self.actor, slot = ?self.slot, "left encounter boundary, evading");
            self.notify(HookEvent::Evade, env);
            return 0;
        }

        let actor = self.actor;
        let slot = self.slot;
        let Self { script, events, .. } = self;

        {
            let mut ctx = ScriptContext::new(
                actor,
                slot,
                events,
                &mut *env.dispatcher,
                env.instance.as_deref_mut(),
            );
            script.update(dt, &mut ctx);
        }

        if env.dispatcher.is_busy(actor) {
            trace!(target: "runtime::controller", %actor, "busy, events held");
            return 0;
        }

        events.execute_events_until(|events, id| {
            let mut ctx = ScriptContext::new(
                actor,
                slot,
                events,
                &mut *env.dispatcher,
                env.instance.as_deref_mut(),
            );
            script.on_event(id, &mut ctx);

            if ctx.is_busy() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    fn notify(&mut self, event: HookEvent, env: &mut ControllerEnv<'_>) {
        let kind = event.kind();
        debug!(target: "runtime::controller", actor = %self.actor, %kind, "hook event");

        if self.slot.is_some() {
            self.apply_boss_defaults(&event, env);
        } else if let HookEvent::EnterCombat { .. } = event {
            self.in_combat = true;
        } else if let HookEvent::Death { .. } | HookEvent::Evade = event {
            self.in_combat = false;
            self.events.reset();
        }

        if let Some(handler) = self.hooks.get(kind) {
            let mut ctx = ScriptContext::new(
                self.actor,
                self.slot,
                &mut self.events,
                &mut *env.dispatcher,
                env.instance.as_deref_mut(),
            );
            handler(&mut self.script, &mut ctx, &event);
        }
    }
}
