//! Bearbeitungsmodell: Unit of Work, Import-Bridge, Regelwerke, Rollback und Commit.

pub mod arena;
pub mod bridge;
pub mod commit;
pub mod operations;
pub mod preview;
pub mod records;
pub mod reverter;
pub mod rules;
pub mod session;
pub mod topology;
pub mod unit_of_work;

pub use arena::{Arena, Handle};
pub use bridge::ImportBridge;
pub use commit::{CommitReport, commit};
pub use operations::RuleBook;
pub use preview::{PreviewSnapshot, PreviewTrack, PreviewVertex, SegmentDescriptor, ShapeDescriptor};
pub use records::{
    JunctionBinding, TrackHandle, TrackRecord, TrackRef, VertexHandle, VertexRecord,
};
pub use reverter::{RecordReverter, Reverter, Snapshotable, guarded};
pub use rules::{
    Condition, EditContext, EditMode, EditOutcome, Endpoint, Modifier, Predicate, Rule, RuleSet,
};
pub use session::{EditSession, EditSettings};
pub use topology::Anchor;
pub use unit_of_work::UnitOfWork;
