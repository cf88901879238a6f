//! Demo content scripts.

use std::time::Duration;

use encounter::Position;
use runtime::{
    ActorAction, ActorId, HookEvent, HookKind, HookTable, Script, ScriptContext, ScriptRegistry,
    SpellId,
};
use scheduler::{DelayRange, EventSpec, GroupId, PhaseMask, TaskContext, TaskScheduler};

const FLAME_BREATH: SpellId = SpellId(18435);
const WING_BUFFET: SpellId = SpellId(18500);
const FIREBALL: SpellId = SpellId(18392);
const BELLOWING_ROAR: SpellId = SpellId(18431);
const SHIELD_BASH: SpellId = SpellId(11972);

const WHELP: u32 = 11262;

const SAY_AGGRO: u32 = 1;
const SAY_LIFTOFF: u32 = 2;
const SAY_LAND: u32 = 3;
const SAY_GUARD: u32 = 10;
const SAY_CALL_FOR_HELP: u32 = 11;

const GROUND: PhaseMask = PhaseMask::phase(1);
const AIR: PhaseMask = PhaseMask::phase(2);
const LANDED: PhaseMask = PhaseMask::phase(3);

const WHELP_WAVE: GroupId = GroupId(1);

const fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

pub fn registry() -> runtime::Result<ScriptRegistry> {
    let mut registry = ScriptRegistry::new();
    registry.register("boss_onyxia", Onyxia::default)?;
    registry.register("npc_lair_guard", LairGuard::new)?;
    Ok(registry)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnyxiaEvent {
    FlameBreath,
    WingBuffet,
    Fireball,
    SummonWhelps,
    BellowingRoar,
}

/// Three-phase dragon: melee on the ground, fireballs and whelps in the air,
/// fears after landing.
#[derive(Default)]
pub struct Onyxia {
    target: Option<ActorId>,
    stage: u8,
}

impl Script for Onyxia {
    type Event = OnyxiaEvent;

    fn hooks() -> HookTable<Self> {
        HookTable::new()
            .on(HookKind::EnterCombat, Self::engaged)
            .on(HookKind::Damaged, Self::damaged)
    }

    fn on_event(&mut self, event: OnyxiaEvent, ctx: &mut ScriptContext<'_, OnyxiaEvent>) {
        match event {
            OnyxiaEvent::FlameBreath => {
                ctx.cast(FLAME_BREATH, self.target);
                ctx.events()
                    .schedule(EventSpec::new(event, (secs(10), secs(15))).phases(GROUND | LANDED));
            }
            OnyxiaEvent::WingBuffet => {
                ctx.cast(WING_BUFFET, self.target);
                ctx.events()
                    .schedule(EventSpec::new(event, (secs(15), secs(30))).phases(GROUND | LANDED));
            }
            OnyxiaEvent::Fireball => ctx.cast(FIREBALL, self.target),
            OnyxiaEvent::SummonWhelps => {
                for offset in [-20.0, 20.0] {
                    ctx.dispatch(ActorAction::Summon {
                        entry: WHELP,
                        at: Position::new(offset, 40.0),
                    });
                }
            }
            OnyxiaEvent::BellowingRoar => ctx.cast(BELLOWING_ROAR, None),
        }
    }
}

impl Onyxia {
    fn engaged(&mut self, ctx: &mut ScriptContext<'_, OnyxiaEvent>, event: &HookEvent) {
        if let HookEvent::EnterCombat { target } = event {
            self.target = Some(*target);
        }
        self.stage = 1;
        ctx.dispatch(ActorAction::Talk(SAY_AGGRO));

        let events = ctx.events();
        events.set_phase(GROUND);
        events.schedule(EventSpec::new(OnyxiaEvent::FlameBreath, secs(2)).phases(GROUND | LANDED));
        events.schedule(EventSpec::new(OnyxiaEvent::WingBuffet, secs(4)).phases(GROUND | LANDED));
    }

    fn damaged(&mut self, ctx: &mut ScriptContext<'_, OnyxiaEvent>, event: &HookEvent) {
        let HookEvent::Damaged { health_pct, .. } = event else {
            return;
        };

        if self.stage == 1 && *health_pct <= 65 {
            self.stage = 2;
            ctx.dispatch(ActorAction::Talk(SAY_LIFTOFF));
            ctx.dispatch(ActorAction::MoveTo(Position::new(0.0, 20.0)));

            let events = ctx.events();
            events.set_phase(AIR);
            events.schedule(
                EventSpec::new(OnyxiaEvent::Fireball, secs(1))
                    .phases(AIR)
                    .repeat(DelayRange::between(secs(2), secs(3))),
            );
            events.schedule(
                EventSpec::new(OnyxiaEvent::SummonWhelps, secs(3))
                    .phases(AIR)
                    .group(WHELP_WAVE)
                    .repeat(secs(10)),
            );
        } else if self.stage == 2 && *health_pct <= 40 {
            self.stage = 3;
            ctx.dispatch(ActorAction::Talk(SAY_LAND));
            ctx.dispatch(ActorAction::MoveTo(Position::new(0.0, 0.0)));

            let events = ctx.events();
            events.cancel_event(&OnyxiaEvent::Fireball);
            events.cancel_group(WHELP_WAVE);
            events.set_phase(LANDED);
            events.schedule(
                EventSpec::new(OnyxiaEvent::BellowingRoar, secs(1))
                    .phases(LANDED)
                    .repeat((secs(15), secs(45))),
            );
        }
    }
}

#[derive(Default)]
pub struct GuardState {
    busy: bool,
    outbox: Vec<ActorAction>,
}

/// Patrolling add driven by closures instead of an event enum.
pub struct LairGuard {
    tasks: TaskScheduler<GuardState>,
    state: GuardState,
}

impl LairGuard {
    fn new() -> Self {
        let mut tasks = TaskScheduler::new();
        tasks.set_validator(|state: &GuardState| !state.busy);

        tasks.schedule(secs(1), |state: &mut GuardState, ctx: &mut TaskContext<GuardState>| {
            let waypoint = if ctx.repeat_count() % 2 == 0 {
                Position::new(30.0, -30.0)
            } else {
                Position::new(-30.0, -30.0)
            };
            state.outbox.push(ActorAction::MoveTo(waypoint));
            ctx.repeat(secs(4));
        });
        tasks.schedule(
            (secs(5), secs(8)),
            |state: &mut GuardState, ctx: &mut TaskContext<GuardState>| {
                state.outbox.push(ActorAction::Talk(SAY_GUARD));
                ctx.repeat((secs(20), secs(30)));
            },
        );

        Self {
            tasks,
            state: GuardState::default(),
        }
    }

    fn engaged(&mut self, _ctx: &mut ScriptContext<'_, ()>, _event: &HookEvent) {
        self.tasks.cancel_all();
        self.tasks.schedule(secs(2), |state: &mut GuardState, ctx: &mut TaskContext<GuardState>| {
            state.outbox.push(ActorAction::Cast {
                spell: SHIELD_BASH,
                target: None,
            });
            // the cast occupies the guard for the rest of this pass
            state.busy = true;
            ctx.repeat((secs(6), secs(9)));
        });
        self.tasks.schedule(secs(2), |state: &mut GuardState, _ctx: &mut TaskContext<GuardState>| {
            state.outbox.push(ActorAction::Talk(SAY_CALL_FOR_HELP));
        });
    }
}

impl Script for LairGuard {
    type Event = ();

    fn hooks() -> HookTable<Self> {
        HookTable::new().on(HookKind::EnterCombat, Self::engaged)
    }

    fn on_event(&mut self, _event: (), _ctx: &mut ScriptContext<'_, ()>) {}

    fn update(&mut self, dt: Duration, ctx: &mut ScriptContext<'_, ()>) {
        self.state.busy = ctx.is_busy();
        self.tasks.update(dt, &mut self.state);
        for action in self.state.outbox.drain(..) {
            ctx.dispatch(action);
        }
    }
}
