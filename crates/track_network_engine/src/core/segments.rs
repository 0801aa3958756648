//! Welt-Grenzen und Segment-Raster für Lokalitätsabfragen.

use super::ids::VertexId;
use glam::DVec2;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Achsenparallele Grenzen der Welt (inklusive Rand).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl WorldBounds {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Quadratische Welt um den Ursprung mit halber Kantenlänge `half_extent`.
    pub fn centered(half_extent: f64) -> Self {
        Self::new(DVec2::splat(-half_extent), DVec2::splat(half_extent))
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.is_finite() && p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Schlüssel eines Raster-Segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentKey {
    pub x: i64,
    pub y: i64,
}

/// Festes Raster über der Welt; zählt, welche Vertices in welchem Segment liegen.
#[derive(Debug, Clone)]
pub struct SegmentGrid {
    segment_size: f64,
    cells: IndexMap<SegmentKey, IndexSet<VertexId>>,
}

impl SegmentGrid {
    /// Erstellt ein leeres Raster. Nicht-positive Größen fallen auf 1 m zurück.
    pub fn new(segment_size: f64) -> Self {
        let segment_size = if segment_size.is_finite() && segment_size > 0.0 {
            segment_size
        } else {
            log::warn!("Ungueltige Segmentgroesse {segment_size}, verwende 1.0");
            1.0
        };
        Self {
            segment_size,
            cells: IndexMap::new(),
        }
    }

    pub fn segment_size(&self) -> f64 {
        self.segment_size
    }

    /// Segment, in dem ein Punkt liegt.
    pub fn key_for(&self, p: DVec2) -> SegmentKey {
        SegmentKey {
            x: (p.x / self.segment_size).floor() as i64,
            y: (p.y / self.segment_size).floor() as i64,
        }
    }

    pub fn insert(&mut self, id: VertexId, p: DVec2) {
        let key = self.key_for(p);
        self.cells.entry(key).or_default().insert(id);
    }

    pub fn remove(&mut self, id: VertexId, p: DVec2) {
        let key = self.key_for(p);
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.shift_remove(&id);
            if cell.is_empty() {
                self.cells.shift_remove(&key);
            }
        }
    }

    /// Anzahl Vertices pro belegtem Segment.
    pub fn occupancy(&self) -> impl Iterator<Item = (SegmentKey, usize)> + '_ {
        self.cells.iter().map(|(key, cell)| (*key, cell.len()))
    }

    /// Vertices in einem Segment (in Einfüge-Reihenfolge).
    pub fn vertices_in(&self, key: SegmentKey) -> impl Iterator<Item = VertexId> + '_ {
        self.cells.get(&key).into_iter().flatten().copied()
    }

    /// Anzahl belegter Segmente.
    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }
}
