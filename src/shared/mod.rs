//! Geteilte Typen für layer-übergreifende Verträge.

pub mod options;

pub use options::EditorOptions;
pub use options::{SEGMENT_SIZE, SNAP_RADIUS, WORLD_HALF_EXTENT};
