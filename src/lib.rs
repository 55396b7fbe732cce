pub mod config;
pub mod core;
pub mod document;
pub mod editor;
pub mod language;
pub mod linked;
pub mod operation;
pub mod ordering;
pub mod parser;
pub mod proposal;
pub mod recipe;
pub mod symbols;
pub mod sync;
pub mod workspace;

pub use crate::core::{MemberPath, OrderKey, Result, TrellisError};
