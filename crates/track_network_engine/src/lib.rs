//! `track_network_engine`: Geometrie-Transform-Engine für Gleisnetze.
//!
//! Bearbeitungen laufen auf einer [`UnitOfWork`] mit Arbeitskopien der
//! betroffenen Vertices und Tracks. Ein Regelwerk pro Bearbeitung wählt
//! anhand der lokalen Topologie den passenden Geometrie-Solver; scheitert er,
//! wird der Zustand per Memento zurückgesetzt. Erst der Commit schreibt in
//! die [`World`].
//!
//! # Beispiel
//! ```
//! use glam::DVec2;
//! use track_network_engine::{EditSession, EditSettings, World, WorldBounds};
//!
//! let mut world = World::new(WorldBounds::centered(1000.0), 100.0);
//! let mut session = EditSession::new(EditSettings::default());
//! let end = session.create_track(&world, DVec2::ZERO, DVec2::new(10.0, 0.0));
//! assert!(end.is_applied());
//! session.commit(&mut world)?;
//! assert_eq!(world.track_count(), 1);
//! # Ok::<(), track_network_engine::CommitError>(())
//! ```

pub mod core;
pub mod edit;
pub mod error;
pub mod geometry;

pub use core::{
    Junction, SegmentKey, SpatialMatch, Track, TrackId, TrackKind, TrackShape, Vertex, VertexId,
    World, WorldBounds,
};
pub use edit::{
    CommitReport, EditMode, EditOutcome, EditSession, EditSettings, PreviewSnapshot,
    TrackHandle, UnitOfWork, VertexHandle,
};
pub use error::{CommitError, CommitRejection, EditFailure, WorldWriteError};
pub use geometry::Tolerance;
