//! Accessor and import bookkeeping that follows member edits.

pub mod accessor;
pub mod import;

pub use accessor::AccessorSynchronizer;
pub use import::{ImportPlan, ImportSynchronizer};
