//! Per-script capability table.

use std::collections::BTreeMap;
use std::fmt;

use super::{HookEvent, HookKind};
use crate::controller::{Script, ScriptContext};

/// Handler for one hook kind.
pub type HookFn<S> = fn(&mut S, &mut ScriptContext<'_, <S as Script>::Event>, &HookEvent);

/// Maps hook kinds to the handlers a script implements.
///
/// Built once per script type by [`Script::hooks`]; the controller looks up
/// the incoming event's kind and calls the handler if there is one.
pub struct HookTable<S: Script> {
    slots: BTreeMap<HookKind, HookFn<S>>,
}

impl<S: Script> HookTable<S> {
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Registers `handler` for `kind`, replacing any earlier entry.
    #[must_use]
    pub fn on(mut self, kind: HookKind, handler: HookFn<S>) -> Self {
        self.slots.insert(kind, handler);
        self
    }

    pub fn get(&self, kind: HookKind) -> Option<HookFn<S>> {
        self.slots.get(&kind).copied()
    }

    pub fn implements(&self, kind: HookKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Implemented kinds in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = HookKind> + '_ {
        self.slots.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<S: Script> Default for HookTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Script> fmt::Debug for HookTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.slots.keys()).finish()
    }
}
