pub mod error;
pub mod types;

pub use error::{Result, TrellisError};
pub use types::{MemberPath, OrderKey};
