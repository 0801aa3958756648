//! Die persistente Welt: Vertices, Tracks, ID-Zähler, Segment-Raster und Spatial-Index.
//!
//! Die Engine liest die Welt nur über die Import-Bridge und schreibt sie nur
//! beim Commit.

use super::ids::{IdCounters, TrackId, VertexId};
use super::segments::{SegmentGrid, WorldBounds};
use super::shape::{TrackKind, TrackShape};
use super::spatial::{SpatialIndex, SpatialMatch};
use crate::error::WorldWriteError;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bindung eines Junction-Vertex an seinen Master-Track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub master: TrackId,
    /// Parameter entlang des Master-Tracks, strikt in (0, 1)
    pub parameter: f64,
}

/// Persistierter Vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub position: DVec2,
    /// Tangente in [0, 2π), Vergleich mod π
    pub tangent: f64,
    pub tracks: [Option<TrackId>; 2],
    pub junction: Option<Junction>,
}

impl Vertex {
    /// Anzahl angeschlossener Tracks (0 = frei, 1 = offen, 2 = geschlossen).
    pub fn track_count(&self) -> usize {
        self.tracks.iter().flatten().count()
    }

    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.iter().flatten().copied()
    }
}

/// Persistierter Track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub vertices: [VertexId; 2],
    pub shape: TrackShape,
}

impl Track {
    pub fn kind(&self) -> TrackKind {
        self.shape.kind()
    }

    /// Index des Endes, an dem `vertex` liegt.
    pub fn end_of(&self, vertex: VertexId) -> Option<usize> {
        self.vertices.iter().position(|v| *v == vertex)
    }
}

/// Autoritative Gleisnetz-Ablage.
#[derive(Debug, Clone)]
pub struct World {
    vertices: HashMap<VertexId, Vertex>,
    tracks: HashMap<TrackId, Track>,
    counters: IdCounters,
    bounds: WorldBounds,
    segments: SegmentGrid,
    spatial_index: SpatialIndex,
    spatial_dirty: bool,
}

impl World {
    /// Erstellt eine leere Welt.
    pub fn new(bounds: WorldBounds, segment_size: f64) -> Self {
        Self {
            vertices: HashMap::new(),
            tracks: HashMap::new(),
            counters: IdCounters::default(),
            bounds,
            segments: SegmentGrid::new(segment_size),
            spatial_index: SpatialIndex::empty(),
            spatial_dirty: false,
        }
    }

    pub fn find_vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn find_track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Prüft ob ein Punkt innerhalb der Welt-Grenzen liegt.
    pub fn is_within_world(&self, point: DVec2) -> bool {
        self.bounds.contains(point)
    }

    /// Segment-Belegung der Welt.
    pub fn segments(&self) -> &SegmentGrid {
        &self.segments
    }

    pub(crate) fn counters(&self) -> &IdCounters {
        &self.counters
    }

    pub(crate) fn counters_mut(&mut self) -> &mut IdCounters {
        &mut self.counters
    }

    /// Alle Junctions, die an `track` gebunden sind (nach ID sortiert).
    pub fn junctions_on(&self, track: TrackId) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self
            .vertices
            .values()
            .filter(|v| v.junction.is_some_and(|j| j.master == track))
            .map(|v| v.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Baut den Spatial-Index neu auf, falls sich Vertices geändert haben.
    pub fn ensure_spatial_index(&mut self) {
        if self.spatial_dirty {
            self.spatial_index =
                SpatialIndex::from_points(self.vertices.values().map(|v| (v.id, v.position)));
            self.spatial_dirty = false;
        }
    }

    /// Findet den nächstgelegenen Vertex.
    ///
    /// Ist der Index veraltet, wird linear über alle Vertices gesucht.
    pub fn nearest_vertex(&self, query: DVec2) -> Option<SpatialMatch> {
        if !self.spatial_dirty {
            return self.spatial_index.nearest(query);
        }
        self.vertices
            .values()
            .map(|v| SpatialMatch {
                vertex_id: v.id,
                distance: v.position.distance(query),
            })
            .min_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then(a.vertex_id.cmp(&b.vertex_id))
            })
    }

    /// Alle Vertices innerhalb eines Radius, nach Distanz sortiert.
    pub fn vertices_within(&self, query: DVec2, radius: f64) -> Vec<SpatialMatch> {
        if !self.spatial_dirty {
            return self.spatial_index.within_radius(query, radius);
        }
        let mut matches: Vec<SpatialMatch> = self
            .vertices
            .values()
            .map(|v| SpatialMatch {
                vertex_id: v.id,
                distance: v.position.distance(query),
            })
            .filter(|m| m.distance <= radius)
            .collect();
        matches.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.vertex_id.cmp(&b.vertex_id))
        });
        matches
    }

    // ── Schreibzugriffe (nur Commit) ───────────────────────────────────

    /// Schreibt einen Vertex (neu oder ersetzend).
    pub(crate) fn write_vertex(&mut self, vertex: Vertex) -> Result<(), WorldWriteError> {
        if !self.bounds.contains(vertex.position) {
            return Err(WorldWriteError::OutOfBounds { id: vertex.id });
        }
        if let Some(old) = self.vertices.get(&vertex.id) {
            self.segments.remove(old.id, old.position);
        }
        self.segments.insert(vertex.id, vertex.position);
        self.vertices.insert(vertex.id, vertex);
        self.spatial_dirty = true;
        Ok(())
    }

    /// Schreibt einen Track; beide Vertices müssen bereits existieren.
    pub(crate) fn write_track(&mut self, track: Track) -> Result<(), WorldWriteError> {
        for vertex in track.vertices {
            if !self.vertices.contains_key(&vertex) {
                return Err(WorldWriteError::MissingVertex {
                    track: track.id,
                    vertex,
                });
            }
        }
        self.tracks.insert(track.id, track);
        Ok(())
    }

    /// Entfernt einen Vertex (beim Einrasten verschmolzene Enden).
    pub(crate) fn remove_vertex(&mut self, id: VertexId) -> Result<Vertex, WorldWriteError> {
        let vertex = self
            .vertices
            .remove(&id)
            .ok_or(WorldWriteError::UnknownVertex(id))?;
        self.segments.remove(id, vertex.position);
        self.spatial_dirty = true;
        Ok(vertex)
    }
}
