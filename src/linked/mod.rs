//! Linked editing over the slots of a freshly edited member.
//!
//! Every slot of one group is edited in lock-step. Groups may offer choices,
//! either a fixed list or one computed in the background; the latter show a
//! "Loading…" placeholder until their computation asks for a refresh.

pub mod adapter;
pub mod session;

pub use adapter::{
    select_adapter, AsyncChoices, ChoiceAdapter, ChoiceSource, RefreshHook, StaticChoices,
};
pub use session::{ExitPolicy, GroupView, LinkedEditSession, PositionGroup, TypeOutcome};
