//! Kreise: Konstruktion über eine Mittelpunkt-Hilfsgerade und Geradenschnitte.

use super::line::{Line, intersection, perpendicular_bisector};
use glam::DVec2;

/// Kreis mit Mittelpunkt und Radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: DVec2,
    pub radius: f64,
}

/// Kreis durch `p1` und `p2`, dessen Mittelpunkt auf `center_hint` liegt.
///
/// Der Mittelpunkt ist der Schnitt der Hilfsgeraden mit der Mittelsenkrechten
/// von `p1 → p2`. `None` wenn beide parallel sind.
pub fn circle_through(center_hint: &Line, p1: DVec2, p2: DVec2, epsilon: f64) -> Option<Circle> {
    let bisector = perpendicular_bisector(p1, p2);
    let center = intersection(center_hint, &bisector, epsilon)?;
    Some(Circle {
        center,
        radius: center.distance(p1),
    })
}

/// Schnittpunkte eines Kreises mit einer Geraden (0, 1 oder 2 Punkte).
pub fn circle_line_intersection(circle: &Circle, line: &Line, epsilon: f64) -> Vec<DVec2> {
    let d = line.signed_distance(circle.center);
    if d.abs() > circle.radius + epsilon {
        return Vec::new();
    }
    let foot = circle.center - line.normal() * d;
    let h = (circle.radius * circle.radius - d * d).max(0.0).sqrt();
    if h <= epsilon {
        return vec![foot];
    }
    let dir = line.direction();
    vec![foot + dir * h, foot - dir * h]
}
