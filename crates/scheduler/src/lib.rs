//! Timed scheduling primitives for encounter controllers.
//!
//! Every controller owns one scheduler and polls it once per simulation tick.
//! Two front-ends share the same [`timeline`] core:
//!
//! - [`EventScheduler`]: id-based events gated by a [`PhaseMask`], the
//!   controller surfaces due ids and maps them to actions
//! - [`TaskScheduler`]: boxed closures that may repeat themselves, gated by a
//!   global validator predicate
//!
//! Both are single-threaded and tick-driven. Callbacks may mutate the
//! scheduler that is dispatching them; anything scheduled during a pass only
//! becomes eligible on a later pass.

pub mod clock;
pub mod delay;
pub mod events;
pub mod phase;
pub mod tasks;

mod timeline;

pub use clock::Timestamp;
pub use delay::{DelayRange, DelayRoller};
pub use events::{EventScheduler, EventSpec};
pub use phase::{GroupId, PhaseMask};
pub use tasks::{TaskContext, TaskFn, TaskOptions, TaskScheduler};
