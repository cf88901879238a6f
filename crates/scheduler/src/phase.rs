//! Phase masks and group tags.

use std::fmt;

bitflags::bitflags! {
    /// Set of encounter phases, one bit per phase.
    ///
    /// A scheduler has one active set at a time. An entry declares the phases
    /// it may fire in; an empty mask or [`PhaseMask::ALL`] means "any phase".
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PhaseMask: u32 {
        const ALL = u32::MAX;
    }
}

impl PhaseMask {
    /// Highest phase number representable in a mask.
    pub const MAX_PHASE: u8 = 32;

    /// Mask with only phase `n` set. Phases are numbered from 1; `0` or
    /// anything above [`Self::MAX_PHASE`] yields an empty mask.
    pub const fn phase(n: u8) -> Self {
        if n == 0 || n > Self::MAX_PHASE {
            return Self::empty();
        }
        Self::from_bits_retain(1 << (n - 1))
    }

    /// True when an entry carrying `self` may fire while `active` is the
    /// scheduler's phase set.
    pub fn eligible_in(self, active: PhaseMask) -> bool {
        self.is_empty() || self.is_all() || self.intersects(active)
    }
}

/// Tag for bulk cancellation and delay of related entries.
///
/// Group `0` is [`GroupId::NONE`]: tagging an entry with it leaves the entry
/// ungrouped, and group operations on it touch nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

impl GroupId {
    pub const NONE: GroupId = GroupId(0);

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Tag to store on an entry, `None` for [`Self::NONE`].
    pub const fn tag(self) -> Option<GroupId> {
        if self.is_none() { None } else { Some(self) }
    }

    /// True when an entry tagged `tag` belongs to this group.
    pub fn matches(self, tag: Option<GroupId>) -> bool {
        !self.is_none() && tag == Some(self)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}
