//! Persistentes Datenmodell: IDs, Gleisformen, Welt, Segment-Raster, Spatial-Index.

pub mod ids;
pub mod segments;
pub mod shape;
pub mod spatial;
pub mod world;

pub use ids::{IdCounters, TrackId, VertexId};
pub use segments::{SegmentGrid, SegmentKey, WorldBounds};
pub use shape::{TrackKind, TrackShape};
pub use spatial::{SpatialIndex, SpatialMatch};
pub use world::{Junction, Track, Vertex, World};
