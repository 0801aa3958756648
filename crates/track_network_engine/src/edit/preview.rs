//! Vorschau-Export einer Unit of Work als reine, serialisierbare Daten.
//!
//! Der Snapshot enthält keine Handles; Tracks verweisen über Indizes in die
//! Vertex-Liste. Konsumenten (Renderer, andere Threads) lesen ihn nur.

use super::records::VertexHandle;
use super::unit_of_work::UnitOfWork;
use crate::core::TrackShape;
use crate::geometry::{CurveSegment, Tolerance};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Vertex in der Vorschau.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewVertex {
    pub position: [f64; 2],
    pub tangent: f64,
    /// Persistente ID, falls importiert
    pub persisted: Option<u64>,
    pub track_count: usize,
    pub junction: bool,
}

/// Teilstück eines Doppelbogens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentDescriptor {
    Line {
        from: [f64; 2],
        to: [f64; 2],
    },
    Arc {
        center: [f64; 2],
        radius: f64,
        start_angle: f64,
        sweep: f64,
    },
}

impl From<&CurveSegment> for SegmentDescriptor {
    fn from(segment: &CurveSegment) -> Self {
        match segment {
            CurveSegment::Line { from, to } => SegmentDescriptor::Line {
                from: from.to_array(),
                to: to.to_array(),
            },
            CurveSegment::Arc(arc) => SegmentDescriptor::Arc {
                center: arc.center.to_array(),
                radius: arc.radius,
                start_angle: arc.start_angle,
                sweep: arc.sweep,
            },
        }
    }
}

/// Geometrie eines Tracks in der Vorschau.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeDescriptor {
    Straight {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Arc {
        center: [f64; 2],
        radius: f64,
        start_angle: f64,
        sweep: f64,
        min: [f64; 2],
        max: [f64; 2],
        /// Schnitt der End-Tangenten, bei Halbkreisen die Bogenmitte
        control: [f64; 2],
    },
    Free {
        first: SegmentDescriptor,
        second: SegmentDescriptor,
        junction: [f64; 2],
        controls: [[f64; 2]; 2],
    },
}

impl From<&TrackShape> for ShapeDescriptor {
    fn from(shape: &TrackShape) -> Self {
        match shape {
            TrackShape::Straight { from, to } => ShapeDescriptor::Straight {
                x1: from.x,
                y1: from.y,
                x2: to.x,
                y2: to.y,
            },
            TrackShape::Curved(arc) => ShapeDescriptor::Arc {
                center: arc.center.to_array(),
                radius: arc.radius,
                start_angle: arc.start_angle,
                sweep: arc.sweep,
                min: arc.bounds.min.to_array(),
                max: arc.bounds.max.to_array(),
                control: shape.control_point(&Tolerance::default()).to_array(),
            },
            TrackShape::Free(curve) => ShapeDescriptor::Free {
                first: (&curve.first).into(),
                second: (&curve.second).into(),
                junction: curve.junction.to_array(),
                controls: curve.controls.map(|c| c.to_array()),
            },
        }
    }
}

/// Track in der Vorschau.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewTrack {
    /// Indizes in [`PreviewSnapshot::vertices`]
    pub vertices: [usize; 2],
    pub persisted: Option<u64>,
    pub shape: ShapeDescriptor,
}

/// Unveränderlicher Schnappschuss einer Unit of Work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewSnapshot {
    pub vertices: Vec<PreviewVertex>,
    pub tracks: Vec<PreviewTrack>,
}

impl PreviewSnapshot {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.tracks.is_empty()
    }
}

impl UnitOfWork {
    /// Exportiert alle Records in Einfüge-Reihenfolge.
    pub fn export_preview(&self) -> PreviewSnapshot {
        let mut index: IndexMap<VertexHandle, usize> = IndexMap::new();
        let vertices = self
            .vertices()
            .enumerate()
            .map(|(i, (handle, record))| {
                index.insert(handle, i);
                PreviewVertex {
                    position: record.position.to_array(),
                    tangent: record.tangent,
                    persisted: record.origin.map(|id| id.0),
                    track_count: record.track_count(),
                    junction: record.is_junction(),
                }
            })
            .collect();

        let tracks = self
            .tracks()
            .filter_map(|(_, record)| {
                let a = index.get(&record.vertices[0])?;
                let b = index.get(&record.vertices[1])?;
                Some(PreviewTrack {
                    vertices: [*a, *b],
                    persisted: record.origin.map(|id| id.0),
                    shape: (&record.shape).into(),
                })
            })
            .collect();

        PreviewSnapshot { vertices, tracks }
    }
}
