pub mod buffer;
pub mod edit;
pub mod error;
pub mod journal;
pub mod position;
pub mod text;

pub use buffer::{Snapshot, TextBuffer};
pub use edit::{EditReceipt, TextEdit};
pub use error::EditError;
pub use journal::{Journal, JournalStep};
pub use position::{PositionId, TrackedPosition};
pub use text::{indent_code, line_end, line_start};
