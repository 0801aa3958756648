//! Application-Layer: Editor-Fassade, Commands und Command-Log.

pub mod command_log;
pub mod editor;
pub mod events;

pub use command_log::CommandLog;
pub use editor::TrackEditor;
pub use events::{CommandResult, EditCommand};
