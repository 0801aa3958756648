//! Gleisform eines Tracks: Gerade, Kreisbogen oder Doppelbogen.
//!
//! Eine Form ist orientiert und läuft von `vertices[0]` nach `vertices[1]`
//! des besitzenden Tracks. Richtungen sind Fahrtrichtungen in [0, 2π).

use crate::geometry::{
    ArcMetadata, Bounds, CurveSegment, FreeCurve, Tolerance, heading_of, intersection,
    line_from_point_and_tangent, opposite,
};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Typ eines Tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    Straight,
    Curved,
    Free,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TrackKind::Straight => "straight",
            TrackKind::Curved => "curved",
            TrackKind::Free => "free",
        };
        f.write_str(name)
    }
}

/// Geometrie eines Tracks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TrackShape {
    /// Gerade, vollständig durch die Endpunkte bestimmt
    Straight { from: DVec2, to: DVec2 },
    /// Einzelner Kreisbogen
    Curved(ArcMetadata),
    /// Zwei tangential verbundene Bögen
    Free(FreeCurve),
}

impl TrackShape {
    /// Erzeugt eine Form aus einem Kurven-Teilstück.
    pub fn from_segment(segment: CurveSegment) -> Self {
        match segment {
            CurveSegment::Line { from, to } => TrackShape::Straight { from, to },
            CurveSegment::Arc(arc) => TrackShape::Curved(arc),
        }
    }

    pub fn kind(&self) -> TrackKind {
        match self {
            TrackShape::Straight { .. } => TrackKind::Straight,
            TrackShape::Curved(_) => TrackKind::Curved,
            TrackShape::Free(_) => TrackKind::Free,
        }
    }

    /// Metadaten `{x1, y1, x2, y2}` einer Geraden.
    pub fn straight_metadata(&self) -> Option<[f64; 4]> {
        match self {
            TrackShape::Straight { from, to } => Some([from.x, from.y, to.x, to.y]),
            _ => None,
        }
    }

    pub fn start_point(&self) -> DVec2 {
        match self {
            TrackShape::Straight { from, .. } => *from,
            TrackShape::Curved(arc) => arc.start_point(),
            TrackShape::Free(curve) => curve.first.start_point(),
        }
    }

    pub fn end_point(&self) -> DVec2 {
        match self {
            TrackShape::Straight { to, .. } => *to,
            TrackShape::Curved(arc) => arc.end_point(),
            TrackShape::Free(curve) => curve.second.end_point(),
        }
    }

    /// Endpunkt am Slot `end` (0 = Start, 1 = Ende).
    pub fn endpoint(&self, end: usize) -> DVec2 {
        if end == 0 {
            self.start_point()
        } else {
            self.end_point()
        }
    }

    /// Fahrtrichtung beim Verlassen des Startpunkts.
    pub fn start_heading(&self) -> f64 {
        match self {
            TrackShape::Straight { from, to } => heading_of(*to - *from),
            TrackShape::Curved(arc) => arc.start_heading(),
            TrackShape::Free(curve) => curve.first.start_heading(),
        }
    }

    /// Fahrtrichtung beim Erreichen des Endpunkts.
    pub fn end_heading(&self) -> f64 {
        match self {
            TrackShape::Straight { from, to } => heading_of(*to - *from),
            TrackShape::Curved(arc) => arc.end_heading(),
            TrackShape::Free(curve) => curve.second.end_heading(),
        }
    }

    /// Richtung, in der der Track den Endpunkt `end` verlässt (in den Track hinein).
    pub fn outward_heading(&self, end: usize) -> f64 {
        if end == 0 {
            self.start_heading()
        } else {
            opposite(self.end_heading())
        }
    }

    /// Dieselbe Form in Gegenrichtung.
    pub fn reversed(&self) -> TrackShape {
        match self {
            TrackShape::Straight { from, to } => TrackShape::Straight {
                from: *to,
                to: *from,
            },
            TrackShape::Curved(arc) => TrackShape::Curved(arc.reversed()),
            TrackShape::Free(curve) => TrackShape::Free(curve.reversed()),
        }
    }

    pub fn point_at(&self, t: f64) -> DVec2 {
        match self {
            TrackShape::Straight { from, to } => from.lerp(*to, t),
            TrackShape::Curved(arc) => arc.point_at(t),
            TrackShape::Free(curve) => curve.point_at(t),
        }
    }

    pub fn heading_at(&self, t: f64) -> f64 {
        match self {
            TrackShape::Straight { .. } => self.start_heading(),
            TrackShape::Curved(arc) => arc.heading_at(t),
            TrackShape::Free(curve) => curve.heading_at(t),
        }
    }

    /// Parameter des nächstgelegenen Punkts auf der Form.
    pub fn nearest_parameter(&self, p: DVec2, tolerance: &Tolerance) -> f64 {
        match self {
            TrackShape::Straight { from, to } => CurveSegment::Line {
                from: *from,
                to: *to,
            }
            .nearest_parameter(p, tolerance),
            TrackShape::Curved(arc) => CurveSegment::Arc(*arc).nearest_parameter(p, tolerance),
            TrackShape::Free(curve) => curve.nearest_parameter(p, tolerance),
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            TrackShape::Straight { from, to } => from.distance(*to),
            TrackShape::Curved(arc) => arc.length(),
            TrackShape::Free(curve) => curve.length(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            TrackShape::Straight { from, to } => {
                let mut bounds = Bounds::from_point(*from);
                bounds.include(*to);
                bounds
            }
            TrackShape::Curved(arc) => arc.bounds,
            TrackShape::Free(curve) => curve.first.bounds().union(&curve.second.bounds()),
        }
    }

    /// Kontrollpunkt für Seiten-Tests.
    ///
    /// Gerade: Mittelpunkt. Bogen: Schnitt der End-Tangenten (Halbkreis:
    /// Bogenmitte). Doppelbogen: Verbindungspunkt.
    pub fn control_point(&self, tolerance: &Tolerance) -> DVec2 {
        match self {
            TrackShape::Straight { from, to } => (*from + *to) * 0.5,
            TrackShape::Curved(arc) => {
                let start = line_from_point_and_tangent(arc.start_point(), arc.start_heading());
                let end = line_from_point_and_tangent(arc.end_point(), arc.end_heading());
                match intersection(&start, &end, tolerance.linear) {
                    Some(p) if arc.sweep.abs() < std::f64::consts::PI => p,
                    _ => arc.midpoint(),
                }
            }
            TrackShape::Free(curve) => curve.junction,
        }
    }
}
