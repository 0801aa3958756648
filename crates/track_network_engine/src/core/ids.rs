//! Persistente Identifikatoren für Vertices und Tracks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Persistente ID eines Vertex in der Welt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u64);

/// Persistente ID eines Tracks in der Welt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Monoton steigende ID-Zähler der Welt. IDs werden nie wiederverwendet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdCounters {
    next_vertex: u64,
    next_track: u64,
}

impl IdCounters {
    /// Vergibt die nächste Vertex-ID.
    pub fn next_vertex_id(&mut self) -> VertexId {
        self.next_vertex += 1;
        VertexId(self.next_vertex)
    }

    /// Vergibt die nächste Track-ID.
    pub fn next_track_id(&mut self) -> TrackId {
        self.next_track += 1;
        TrackId(self.next_track)
    }

    /// Vorschau der nächsten Vertex-ID ohne Vergabe.
    pub fn peek_vertex_id(&self) -> VertexId {
        VertexId(self.next_vertex + 1)
    }

    /// Vorschau der nächsten Track-ID ohne Vergabe.
    pub fn peek_track_id(&self) -> TrackId {
        TrackId(self.next_track + 1)
    }
}
