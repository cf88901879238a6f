//! Scripts and world doubles shared by the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use encounter::{Boundary, DoorId, DoorKind, EncounterLayout, Position, SlotLayout};
use runtime::{
    ActionDispatcher, ActionLog, ActorAction, ActorId, HookEvent, HookKind, HookTable, Script,
    ScriptContext, ScriptRegistry, SpellId,
};
use scheduler::{EventSpec, PhaseMask, TaskContext, TaskScheduler};

pub const TANK: ActorId = ActorId(1);
pub const RAZOR: ActorId = ActorId(100);
pub const VENT: ActorId = ActorId(200);

pub const CLEAVE: SpellId = SpellId(19983);
pub const WAR_STOMP: SpellId = SpellId(24375);
pub const FLAME_BURST: SpellId = SpellId(20200);

pub const ENTRANCE: DoorId = DoorId(1);
pub const EXIT: DoorId = DoorId(2);

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Dispatcher whose log stays readable after it moves into a simulation.
#[derive(Clone, Default)]
pub struct SharedLog(Arc<Mutex<ActionLog>>);

impl SharedLog {
    pub fn actions(&self) -> Vec<(ActorId, ActorAction)> {
        self.0.lock().unwrap().entries().to_vec()
    }

    pub fn casts_by(&self, actor: ActorId) -> Vec<SpellId> {
        self.actions()
            .into_iter()
            .filter(|(who, _)| *who == actor)
            .filter_map(|(_, action)| match action {
                ActorAction::Cast { spell, .. } => Some(spell),
                _ => None,
            })
            .collect()
    }

    pub fn set_busy(&self, actor: ActorId, busy: bool) {
        self.0.lock().unwrap().set_busy(actor, busy);
    }

    pub fn set_position(&self, actor: ActorId, pos: Position) {
        self.0.lock().unwrap().set_position(actor, pos);
    }
}

impl ActionDispatcher for SharedLog {
    fn dispatch(&mut self, actor: ActorId, action: ActorAction) {
        self.0.lock().unwrap().dispatch(actor, action);
    }

    fn is_busy(&self, actor: ActorId) -> bool {
        self.0.lock().unwrap().is_busy(actor)
    }

    fn position(&self, actor: ActorId) -> Option<Position> {
        self.0.lock().unwrap().position(actor)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RazorEvent {
    Cleave,
    WarStomp,
}

/// Boss with a cleave on a timer and a war stomp unlocked below half health.
#[derive(Default)]
pub struct Razorgore {
    pub enraged: bool,
}

impl Script for Razorgore {
    type Event = RazorEvent;

    fn hooks() -> HookTable<Self> {
        HookTable::new()
            .on(HookKind::EnterCombat, Self::engaged)
            .on(HookKind::Damaged, Self::damaged)
    }

    fn on_event(&mut self, event: RazorEvent, ctx: &mut ScriptContext<'_, RazorEvent>) {
        match event {
            RazorEvent::Cleave => {
                ctx.cast(CLEAVE, Some(TANK));
                ctx.events().schedule_event(RazorEvent::Cleave, ms(3_000));
            }
            RazorEvent::WarStomp => ctx.cast(WAR_STOMP, None),
        }
    }
}

impl Razorgore {
    fn engaged(&mut self, ctx: &mut ScriptContext<'_, RazorEvent>, _event: &HookEvent) {
        ctx.events().schedule_event(RazorEvent::Cleave, ms(2_000));
        ctx.events().schedule(
            EventSpec::new(RazorEvent::WarStomp, ms(1_000))
                .phases(PhaseMask::phase(2))
                .repeat(ms(5_000)),
        );
    }

    fn damaged(&mut self, ctx: &mut ScriptContext<'_, RazorEvent>, event: &HookEvent) {
        if let HookEvent::Damaged { health_pct, .. } = event
            && *health_pct <= 50
            && !self.enraged
        {
            self.enraged = true;
            ctx.events().set_phase(PhaseMask::phase(2));
        }
    }
}

#[derive(Default)]
pub struct VentState {
    pub busy: bool,
    pub bursts: u32,
    pub outbox: Vec<ActorAction>,
}

/// Trap driven by closures: erupts every second unless its caster is busy.
pub struct FlameVent {
    pub tasks: TaskScheduler<VentState>,
    pub state: VentState,
}

impl FlameVent {
    pub fn new() -> Self {
        let mut tasks = TaskScheduler::with_seed(3);
        tasks.set_validator(|state: &VentState| !state.busy);
        tasks.schedule(
            ms(1_000),
            |state: &mut VentState, ctx: &mut TaskContext<VentState>| {
                state.bursts += 1;
                state.outbox.push(ActorAction::Cast {
                    spell: FLAME_BURST,
                    target: None,
                });
                ctx.repeat(ms(1_000));
            },
        );
        Self {
            tasks,
            state: VentState::default(),
        }
    }
}

impl Script for FlameVent {
    type Event = ();

    fn on_event(&mut self, _event: (), _ctx: &mut ScriptContext<'_, ()>) {}

    fn update(&mut self, dt: Duration, ctx: &mut ScriptContext<'_, ()>) {
        self.state.busy = ctx.is_busy();
        self.tasks.update(dt, &mut self.state);
        for action in self.state.outbox.drain(..) {
            ctx.dispatch(action);
        }
    }
}

pub fn registry() -> ScriptRegistry {
    let mut registry = ScriptRegistry::new();
    registry
        .register("boss_razorgore", Razorgore::default)
        .unwrap();
    registry.register("go_flame_vent", FlameVent::new).unwrap();
    registry
}

pub fn lair_layout() -> EncounterLayout {
    EncounterLayout::new(
        "BWL",
        vec![
            SlotLayout::named("razorgore")
                .boundary(Boundary::circle(Position::new(0.0, 0.0), 80.0))
                .door(ENTRANCE, DoorKind::Room)
                .door(EXIT, DoorKind::Passage),
            SlotLayout::named("vaelastrasz"),
        ],
    )
    .attempts(encounter::AttemptPolicy::Limited(3))
}
