//! Geraden in allgemeiner Form `a·x + b·y + c = 0` mit normierter Normalen.

use super::angle::direction;
use glam::DVec2;

/// Gerade in allgemeiner Form. `(a, b)` ist die Einheitsnormale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Line {
    /// Erstellt eine Gerade und normiert die Normale.
    ///
    /// Eine Null-Normale bleibt unverändert; Schnitte mit ihr liefern `None`.
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        let norm = a.hypot(b);
        if norm > 0.0 {
            Self {
                a: a / norm,
                b: b / norm,
                c: c / norm,
            }
        } else {
            Self { a, b, c }
        }
    }

    /// Einheitsnormale der Geraden.
    pub fn normal(&self) -> DVec2 {
        DVec2::new(self.a, self.b)
    }

    /// Richtungsvektor der Geraden (Normale um -90° gedreht).
    pub fn direction(&self) -> DVec2 {
        DVec2::new(self.b, -self.a)
    }

    /// Vorzeichenbehafteter Abstand eines Punkts zur Geraden.
    pub fn signed_distance(&self, p: DVec2) -> f64 {
        self.a * p.x + self.b * p.y + self.c
    }

    /// Lotfußpunkt von `p` auf der Geraden.
    pub fn project(&self, p: DVec2) -> DVec2 {
        p - self.normal() * self.signed_distance(p)
    }
}

/// Gerade durch zwei Punkte.
pub fn line_from_points(p: DVec2, q: DVec2) -> Line {
    let d = q - p;
    let a = -d.y;
    let b = d.x;
    Line::new(a, b, -(a * p.x + b * p.y))
}

/// Gerade durch `p` mit Richtungswinkel `tangent` (Radiant).
pub fn line_from_point_and_tangent(p: DVec2, tangent: f64) -> Line {
    let n = direction(tangent).perp();
    Line::new(n.x, n.y, -n.dot(p))
}

/// Schnittpunkt zweier Geraden; `None` wenn parallel innerhalb `epsilon`.
pub fn intersection(l1: &Line, l2: &Line, epsilon: f64) -> Option<DVec2> {
    let det = l1.a * l2.b - l2.a * l1.b;
    if det.abs() < epsilon {
        return None;
    }
    let x = (l1.b * l2.c - l2.b * l1.c) / det;
    let y = (l2.a * l1.c - l1.a * l2.c) / det;
    Some(DVec2::new(x, y))
}

/// Senkrechte zu `line` durch `p`.
pub fn perpendicular_through(line: &Line, p: DVec2) -> Line {
    let a = -line.b;
    let b = line.a;
    Line::new(a, b, -(a * p.x + b * p.y))
}

/// Mittelsenkrechte der Strecke `p → q`.
pub fn perpendicular_bisector(p: DVec2, q: DVec2) -> Line {
    let d = q - p;
    let m = (p + q) * 0.5;
    Line::new(d.x, d.y, -d.dot(m))
}

/// 2D-Kreuzprodukt: > 0 wenn `p` links von `a → b` liegt, < 0 rechts.
pub fn side_test(a: DVec2, b: DVec2, p: DVec2) -> f64 {
    (b - a).perp_dot(p - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn intersection_of_axes_is_origin_shifted() {
        let horizontal = line_from_points(DVec2::new(0.0, 2.0), DVec2::new(5.0, 2.0));
        let vertical = line_from_point_and_tangent(DVec2::new(3.0, -1.0), std::f64::consts::FRAC_PI_2);
        let p = intersection(&horizontal, &vertical, 1e-10).expect("Schnittpunkt erwartet");
        assert_abs_diff_eq!(p.x, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn parallel_lines_have_no_intersection() {
        let l1 = line_from_point_and_tangent(DVec2::ZERO, FRAC_PI_4);
        let l2 = line_from_point_and_tangent(DVec2::new(0.0, 1.0), FRAC_PI_4);
        assert!(intersection(&l1, &l2, 1e-10).is_none());
    }

    #[test]
    fn perpendicular_passes_through_point() {
        let line = line_from_points(DVec2::ZERO, DVec2::new(4.0, 4.0));
        let p = DVec2::new(0.0, 4.0);
        let perp = perpendicular_through(&line, p);
        assert_abs_diff_eq!(perp.signed_distance(p), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(perp.normal().dot(line.normal()), 0.0, epsilon = 1e-12);
        let foot = intersection(&line, &perp, 1e-10).expect("Lotfußpunkt erwartet");
        assert_abs_diff_eq!(foot.x, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(foot.y, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn bisector_is_equidistant() {
        let p = DVec2::new(1.0, 1.0);
        let q = DVec2::new(7.0, -3.0);
        let bisector = perpendicular_bisector(p, q);
        let on_line = bisector.project(DVec2::new(10.0, 10.0));
        assert_abs_diff_eq!(on_line.distance(p), on_line.distance(q), epsilon = 1e-9);
    }

    #[test]
    fn side_test_sign() {
        let a = DVec2::ZERO;
        let b = DVec2::new(1.0, 0.0);
        assert!(side_test(a, b, DVec2::new(0.5, 1.0)) > 0.0);
        assert!(side_test(a, b, DVec2::new(0.5, -1.0)) < 0.0);
    }
}
