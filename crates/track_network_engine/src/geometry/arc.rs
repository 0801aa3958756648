//! Kreisbögen: Metadaten (Bounding-Box, Startwinkel, Sweep) und Abfragen.

use super::angle::{ccw_difference, direction, heading_of, normalize_angle};
use super::line::side_test;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, TAU};

/// Achsenparallele Bounding-Box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    /// Bounding-Box eines einzelnen Punkts.
    pub fn from_point(p: DVec2) -> Self {
        Self { min: p, max: p }
    }

    /// Erweitert die Box um einen Punkt.
    pub fn include(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Vereinigung zweier Boxen.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Metadaten eines Kreisbogens.
///
/// Der Bogen beginnt bei `start_angle` und läuft um `sweep` Radiant
/// (positiv = gegen den Uhrzeigersinn). `start_angle` liegt in [0, 2π),
/// `|sweep|` in [0, 2π).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcMetadata {
    pub center: DVec2,
    pub radius: f64,
    pub start_angle: f64,
    pub sweep: f64,
    pub bounds: Bounds,
}

impl ArcMetadata {
    /// Erstellt Metadaten und berechnet die Bounding-Box.
    pub fn new(center: DVec2, radius: f64, start_angle: f64, sweep: f64) -> Self {
        let mut arc = Self {
            center,
            radius,
            start_angle: normalize_angle(start_angle),
            sweep,
            bounds: Bounds::from_point(center),
        };
        arc.bounds = arc.compute_bounds();
        arc
    }

    /// Endwinkel (nicht normalisiert).
    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep
    }

    /// `true` wenn der Bogen gegen den Uhrzeigersinn läuft.
    pub fn is_ccw(&self) -> bool {
        self.sweep >= 0.0
    }

    /// Punkt bei Parameter `t ∈ [0, 1]`.
    pub fn point_at(&self, t: f64) -> DVec2 {
        self.center + direction(self.start_angle + self.sweep * t) * self.radius
    }

    pub fn start_point(&self) -> DVec2 {
        self.point_at(0.0)
    }

    pub fn end_point(&self) -> DVec2 {
        self.point_at(1.0)
    }

    pub fn midpoint(&self) -> DVec2 {
        self.point_at(0.5)
    }

    /// Fahrtrichtung bei Parameter `t`.
    pub fn heading_at(&self, t: f64) -> f64 {
        let turn = if self.is_ccw() { FRAC_PI_2 } else { -FRAC_PI_2 };
        normalize_angle(self.start_angle + self.sweep * t + turn)
    }

    pub fn start_heading(&self) -> f64 {
        self.heading_at(0.0)
    }

    pub fn end_heading(&self) -> f64 {
        self.heading_at(1.0)
    }

    /// Bogenlänge.
    pub fn length(&self) -> f64 {
        self.radius * self.sweep.abs()
    }

    /// Derselbe Bogen in Gegenrichtung.
    pub fn reversed(&self) -> ArcMetadata {
        ArcMetadata::new(self.center, self.radius, self.end_angle(), -self.sweep)
    }

    /// Prüft ob ein Polarwinkel (bezogen auf den Mittelpunkt) im Bogen liegt.
    pub fn contains_angle(&self, angle: f64) -> bool {
        if self.is_ccw() {
            ccw_difference(self.start_angle, angle) <= self.sweep
        } else {
            ccw_difference(angle, self.start_angle) <= -self.sweep
        }
    }

    /// Parameter `t ∈ [0, 1]` eines Polarwinkels, auf die Bogenenden geklemmt.
    pub fn parameter_of_angle(&self, angle: f64) -> f64 {
        if self.sweep.abs() <= f64::EPSILON {
            return 0.0;
        }
        if self.contains_angle(angle) {
            let travelled = if self.is_ccw() {
                ccw_difference(self.start_angle, angle)
            } else {
                ccw_difference(angle, self.start_angle)
            };
            return (travelled / self.sweep.abs()).clamp(0.0, 1.0);
        }
        // Außerhalb: näheres Ende wählen
        let p = self.center + direction(angle) * self.radius;
        if p.distance(self.start_point()) <= p.distance(self.end_point()) {
            0.0
        } else {
            1.0
        }
    }

    fn compute_bounds(&self) -> Bounds {
        let mut bounds = Bounds::from_point(self.start_point());
        bounds.include(self.end_point());
        for quadrant in 0..4 {
            let angle = quadrant as f64 * FRAC_PI_2;
            if self.contains_angle(angle) {
                bounds.include(self.center + direction(angle) * self.radius);
            }
        }
        bounds
    }
}

/// Berechnet die Bogen-Metadaten von `p1` nach `p2` um `center`.
///
/// Von den beiden möglichen Umlaufrichtungen wird diejenige gewählt, deren
/// Bogenmitte auf derselben Seite der Sehne liegt wie `control`, einem Punkt
/// auf der Tangente des angrenzenden Gleises. Liegt `control` auf der Sehne,
/// läuft der Bogen gegen den Uhrzeigersinn.
pub fn arc_metadata(
    p1: DVec2,
    p2: DVec2,
    center: DVec2,
    control: DVec2,
    epsilon: f64,
) -> ArcMetadata {
    let radius = center.distance(p1);
    let a1 = heading_of(p1 - center);
    let a2 = heading_of(p2 - center);
    let ccw_sweep = ccw_difference(a1, a2);
    let cw_sweep = if ccw_sweep > 0.0 { ccw_sweep - TAU } else { 0.0 };

    let reference = side_test(p1, p2, control);
    let sweep = if reference.abs() <= epsilon {
        ccw_sweep
    } else {
        let ccw_mid = center + direction(a1 + ccw_sweep * 0.5) * radius;
        let ccw_side = side_test(p1, p2, ccw_mid);
        if ccw_side.signum() == reference.signum() {
            ccw_sweep
        } else {
            cw_sweep
        }
    };

    ArcMetadata::new(center, radius, a1, sweep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::DMat2;

    fn rotate_about(p: DVec2, center: DVec2, angle: f64) -> DVec2 {
        center + DMat2::from_angle(angle) * (p - center)
    }

    #[test]
    fn sweep_rotates_first_point_onto_second() {
        let center = DVec2::new(2.0, -1.0);
        let p1 = center + direction(0.3) * 5.0;
        let p2 = center + direction(2.4) * 5.0;
        for control in [DVec2::new(10.0, 10.0), DVec2::new(-10.0, -10.0)] {
            let arc = arc_metadata(p1, p2, center, control, 1e-10);
            let rotated = rotate_about(p1, center, arc.sweep);
            assert_abs_diff_eq!(rotated.x, p2.x, epsilon = 1e-9);
            assert_abs_diff_eq!(rotated.y, p2.y, epsilon = 1e-9);
            // Bogenmitte liegt auf der Seite des Kontrollpunkts
            let mid_side = side_test(p1, p2, arc.midpoint());
            assert_eq!(mid_side.signum(), side_test(p1, p2, control).signum());
        }
    }

    #[test]
    fn control_decides_half_circle_direction() {
        let center = DVec2::ZERO;
        let p1 = DVec2::new(1.0, 0.0);
        let p2 = DVec2::new(-1.0, 0.0);
        let below = arc_metadata(p1, p2, center, DVec2::new(0.0, -3.0), 1e-10);
        assert!(below.midpoint().y < 0.0);
        let above = arc_metadata(p1, p2, center, DVec2::new(0.0, 3.0), 1e-10);
        assert!(above.midpoint().y > 0.0);
        // Kontrollpunkt auf der Sehne: gegen den Uhrzeigersinn
        let on_chord = arc_metadata(p1, p2, center, DVec2::new(0.5, 0.0), 1e-10);
        assert!(on_chord.is_ccw());
    }

    #[test]
    fn bounds_contain_quadrant_extremes() {
        let arc = ArcMetadata::new(DVec2::ZERO, 2.0, -0.5, 1.0);
        assert_abs_diff_eq!(arc.bounds.max.x, 2.0, epsilon = 1e-12);
        let quarter = ArcMetadata::new(DVec2::ZERO, 1.0, 0.1, 0.2);
        assert!(quarter.bounds.max.x < 1.0);
    }

    #[test]
    fn reversed_swaps_endpoints_and_headings() {
        let arc = ArcMetadata::new(DVec2::new(1.0, 1.0), 3.0, 0.2, -1.3);
        let rev = arc.reversed();
        assert_abs_diff_eq!(rev.start_point().distance(arc.end_point()), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rev.end_point().distance(arc.start_point()), 0.0, epsilon = 1e-12);
        assert!(crate::geometry::angle::same_heading(
            rev.start_heading(),
            crate::geometry::angle::opposite(arc.end_heading()),
            1e-12
        ));
    }

    #[test]
    fn parameter_of_angle_inside_and_outside() {
        let arc = ArcMetadata::new(DVec2::ZERO, 1.0, 0.0, FRAC_PI_2);
        assert_abs_diff_eq!(arc.parameter_of_angle(FRAC_PI_2 / 2.0), 0.5, epsilon = 1e-12);
        assert_eq!(arc.parameter_of_angle(-0.1), 0.0);
        assert_eq!(arc.parameter_of_angle(FRAC_PI_2 + 0.1), 1.0);
    }
}
