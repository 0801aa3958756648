//! Geschlossene Kurven-Solver: Bogen an Tangente, Bogen zwischen zwei
//! Tangenten, Doppelbogen (Biarc) und Projektion auf die Tangenten-Linie.

use super::angle::{direction, heading_of, same_heading};
use super::arc::{ArcMetadata, Bounds, arc_metadata};
use super::circle::circle_through;
use super::line::line_from_point_and_tangent;
use super::tolerance::Tolerance;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Ein Teilstück einer Kurve: Bogen oder (im Grenzfall) Gerade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CurveSegment {
    Line { from: DVec2, to: DVec2 },
    Arc(ArcMetadata),
}

impl CurveSegment {
    pub fn start_point(&self) -> DVec2 {
        match self {
            CurveSegment::Line { from, .. } => *from,
            CurveSegment::Arc(arc) => arc.start_point(),
        }
    }

    pub fn end_point(&self) -> DVec2 {
        match self {
            CurveSegment::Line { to, .. } => *to,
            CurveSegment::Arc(arc) => arc.end_point(),
        }
    }

    pub fn start_heading(&self) -> f64 {
        match self {
            CurveSegment::Line { from, to } => heading_of(*to - *from),
            CurveSegment::Arc(arc) => arc.start_heading(),
        }
    }

    pub fn end_heading(&self) -> f64 {
        match self {
            CurveSegment::Line { from, to } => heading_of(*to - *from),
            CurveSegment::Arc(arc) => arc.end_heading(),
        }
    }

    pub fn point_at(&self, t: f64) -> DVec2 {
        match self {
            CurveSegment::Line { from, to } => from.lerp(*to, t),
            CurveSegment::Arc(arc) => arc.point_at(t),
        }
    }

    pub fn heading_at(&self, t: f64) -> f64 {
        match self {
            CurveSegment::Line { .. } => self.start_heading(),
            CurveSegment::Arc(arc) => arc.heading_at(t),
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            CurveSegment::Line { from, to } => from.distance(*to),
            CurveSegment::Arc(arc) => arc.length(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            CurveSegment::Line { from, to } => {
                let mut b = Bounds::from_point(*from);
                b.include(*to);
                b
            }
            CurveSegment::Arc(arc) => arc.bounds,
        }
    }

    pub fn reversed(&self) -> CurveSegment {
        match self {
            CurveSegment::Line { from, to } => CurveSegment::Line {
                from: *to,
                to: *from,
            },
            CurveSegment::Arc(arc) => CurveSegment::Arc(arc.reversed()),
        }
    }

    /// Parameter des nächstgelegenen Punkts (geklemmt auf [0, 1]).
    pub fn nearest_parameter(&self, p: DVec2, tolerance: &Tolerance) -> f64 {
        match self {
            CurveSegment::Line { from, to } => {
                let d = *to - *from;
                let len_sq = d.length_squared();
                if len_sq <= tolerance.linear {
                    return 0.0;
                }
                ((p - *from).dot(d) / len_sq).clamp(0.0, 1.0)
            }
            CurveSegment::Arc(arc) => {
                use super::circle::{Circle, circle_line_intersection};
                use super::line::line_from_points;

                if p.distance(arc.center) <= tolerance.linear {
                    return 0.0;
                }
                let circle = Circle {
                    center: arc.center,
                    radius: arc.radius,
                };
                let ray = line_from_points(arc.center, p);
                let nearest = circle_line_intersection(&circle, &ray, tolerance.linear)
                    .into_iter()
                    .min_by(|a, b| a.distance(p).total_cmp(&b.distance(p)));
                match nearest {
                    Some(q) => arc.parameter_of_angle(heading_of(q - arc.center)),
                    None => 0.0,
                }
            }
        }
    }
}

/// Doppelbogen aus zwei tangential verbundenen Teilstücken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeCurve {
    pub first: CurveSegment,
    pub second: CurveSegment,
    /// Verbindungspunkt beider Teilstücke
    pub junction: DVec2,
    /// Schnittpunkte der Tangenten-Arme (Konstruktions-Kontrollpunkte)
    pub controls: [DVec2; 2],
}

impl FreeCurve {
    pub fn length(&self) -> f64 {
        self.first.length() + self.second.length()
    }

    pub fn reversed(&self) -> FreeCurve {
        FreeCurve {
            first: self.second.reversed(),
            second: self.first.reversed(),
            junction: self.junction,
            controls: [self.controls[1], self.controls[0]],
        }
    }

    /// Aufteilung des globalen Parameters auf eines der Teilstücke.
    fn split(&self, t: f64) -> (&CurveSegment, f64) {
        let total = self.length();
        let first_len = self.first.length();
        if total <= 0.0 {
            return (&self.first, 0.0);
        }
        let along = t.clamp(0.0, 1.0) * total;
        if along <= first_len && first_len > 0.0 {
            (&self.first, along / first_len)
        } else {
            let second_len = self.second.length();
            let local = if second_len > 0.0 {
                (along - first_len) / second_len
            } else {
                1.0
            };
            (&self.second, local.clamp(0.0, 1.0))
        }
    }

    pub fn point_at(&self, t: f64) -> DVec2 {
        let (segment, local) = self.split(t);
        segment.point_at(local)
    }

    pub fn heading_at(&self, t: f64) -> f64 {
        let (segment, local) = self.split(t);
        segment.heading_at(local)
    }

    pub fn nearest_parameter(&self, p: DVec2, tolerance: &Tolerance) -> f64 {
        let total = self.length();
        if total <= 0.0 {
            return 0.0;
        }
        let first_len = self.first.length();
        let t1 = self.first.nearest_parameter(p, tolerance);
        let t2 = self.second.nearest_parameter(p, tolerance);
        let d1 = self.first.point_at(t1).distance(p);
        let d2 = self.second.point_at(t2).distance(p);
        if d1 <= d2 {
            t1 * first_len / total
        } else {
            (first_len + t2 * self.second.length()) / total
        }
    }
}

/// Kurve ab `p1` mit Fahrtrichtung `heading` durch `p2`.
///
/// Mittelpunkt = Normale in `p1` ∩ Mittelsenkrechte der Sehne. Liegt `p2`
/// auf der Tangenten-Linie vor `p1`, entsteht eine Gerade. Liegt `p2`
/// dahinter oder fällt mit `p1` zusammen, gibt es keine Lösung.
pub fn arc_from_heading(
    p1: DVec2,
    heading: f64,
    p2: DVec2,
    tolerance: &Tolerance,
) -> Option<CurveSegment> {
    let chord = p2 - p1;
    if chord.length() <= tolerance.linear {
        return None;
    }
    let forward = direction(heading);
    let normal = line_from_point_and_tangent(p1, heading + FRAC_PI_2);
    match circle_through(&normal, p1, p2, tolerance.linear) {
        Some(circle) => {
            let control = p1 + forward * chord.length();
            let arc = arc_metadata(p1, p2, circle.center, control, tolerance.linear);
            Some(CurveSegment::Arc(arc))
        }
        None if chord.dot(forward) > 0.0 => Some(CurveSegment::Line { from: p1, to: p2 }),
        None => None,
    }
}

/// Einzelner Bogen mit vorgegebener Start- und Ankunftsrichtung.
///
/// Existiert nur, wenn der an `h1` angelegte Bogen durch `p2` dort mit
/// `h2` ankommt.
pub fn arc_between_tangents(
    p1: DVec2,
    h1: f64,
    p2: DVec2,
    h2: f64,
    tolerance: &Tolerance,
) -> Option<CurveSegment> {
    let segment = arc_from_heading(p1, h1, p2, tolerance)?;
    same_heading(segment.end_heading(), h2, tolerance.angular).then_some(segment)
}

/// Doppelbogen von `p1` (Abfahrtsrichtung `h1`) nach `p2` (Ankunftsrichtung `h2`).
///
/// Beide Tangenten-Arme erhalten dieselbe Länge `d`:
///
/// ```text
/// d = (−v·t + √((v·t)² + 2(1 − t1·t2)·|v|²)) / (2(1 − t1·t2)),   t = t1 + t2
/// ```
///
/// Für parallele, gleichgerichtete Tangenten (Nenner → 0) gilt der Grenzwert
/// `d = |v|² / (4·v·t2)`. Der Verbindungspunkt liegt in der Mitte der beiden
/// Kontrollpunkte `p1 + d·t1` und `p2 − d·t2`.
pub fn free_curve(
    p1: DVec2,
    h1: f64,
    p2: DVec2,
    h2: f64,
    tolerance: &Tolerance,
) -> Option<FreeCurve> {
    let v = p2 - p1;
    if v.length() <= tolerance.linear {
        return None;
    }
    let d = biarc_arm_length(v, direction(h1), direction(h2), tolerance)?;
    let t1 = direction(h1);
    let t2 = direction(h2);
    let q1 = p1 + t1 * d;
    let q2 = p2 - t2 * d;
    let junction = (q1 + q2) * 0.5;
    let junction_heading = if q1.distance(q2) <= tolerance.linear {
        h1
    } else {
        heading_of(q2 - q1)
    };

    let first = arc_from_heading(p1, h1, junction, tolerance)?;
    let second = arc_from_heading(junction, junction_heading, p2, tolerance)?;
    Some(FreeCurve {
        first,
        second,
        junction,
        controls: [q1, q2],
    })
}

/// Länge der Tangenten-Arme eines Doppelbogens (siehe [`free_curve`]).
///
/// Rationalisierte Form `d = |v|² / (v·t + √((v·t)² + 2(1 − t1·t2)·|v|²))`,
/// die beim Übergang zu parallelen Tangenten stetig bleibt.
pub fn biarc_arm_length(v: DVec2, t1: DVec2, t2: DVec2, tolerance: &Tolerance) -> Option<f64> {
    let parallel = t1.perp_dot(t2).abs() <= tolerance.angular && t1.dot(t2) > 0.0;
    let d = if parallel {
        let vt2 = v.dot(t2);
        if vt2 <= tolerance.linear {
            return None;
        }
        v.length_squared() / (4.0 * vt2)
    } else {
        let vt = v.dot(t1 + t2);
        let denom = 2.0 * (1.0 - t1.dot(t2));
        let q = vt + (vt * vt + denom * v.length_squared()).sqrt();
        if q <= tolerance.linear {
            return None;
        }
        v.length_squared() / q
    };
    (d.is_finite() && d > tolerance.linear).then_some(d)
}

/// Projiziert `cursor` auf die Tangenten-Linie durch `anchor`.
///
/// Gibt den projizierten Punkt und den vorzeichenbehafteten Abstand entlang
/// `heading` zurück (negativ = hinter dem Anker).
pub fn project_onto_rail(anchor: DVec2, heading: f64, cursor: DVec2) -> (DVec2, f64) {
    let dir = direction(heading);
    let t = (cursor - anchor).dot(dir);
    (anchor + dir * t, t)
}
