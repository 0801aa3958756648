//! Gleisnetz-Editor Library.
//! Application-Layer über `track_network_engine`, exportiert für Tests und Wiederverwendung.

pub mod app;
pub mod shared;

pub use app::{CommandLog, CommandResult, EditCommand, TrackEditor};
pub use shared::EditorOptions;
pub use track_network_engine::{
    CommitError, CommitReport, EditMode, EditOutcome, PreviewSnapshot, TrackHandle, TrackId,
    TrackKind, VertexHandle, VertexId, World, WorldBounds,
};
