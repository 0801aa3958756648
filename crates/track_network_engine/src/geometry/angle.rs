//! Winkel-Hilfsfunktionen. Alle Ergebnisse liegen in [0, 2π).

use glam::DVec2;
use std::f64::consts::{PI, TAU};

/// Normalisiert einen Winkel nach [0, 2π).
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid kann für winzige negative Werte exakt TAU liefern
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Richtungswinkel eines Vektors in [0, 2π).
pub fn heading_of(v: DVec2) -> f64 {
    normalize_angle(v.y.atan2(v.x))
}

/// Einheitsvektor in Richtung `angle`.
pub fn direction(angle: f64) -> DVec2 {
    DVec2::new(angle.cos(), angle.sin())
}

/// Gegen den Uhrzeigersinn gemessene Differenz `from → to` in [0, 2π).
pub fn ccw_difference(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// Vorzeichenbehaftete kürzeste Differenz `from → to` in (-π, π].
pub fn signed_difference(from: f64, to: f64) -> f64 {
    let d = ccw_difference(from, to);
    if d > PI { d - TAU } else { d }
}

/// Prüft ob zwei Richtungen (mod 2π) übereinstimmen.
pub fn same_heading(a: f64, b: f64, epsilon: f64) -> bool {
    signed_difference(a, b).abs() <= epsilon
}

/// Prüft ob zwei Tangenten (mod π) übereinstimmen.
pub fn tangents_parallel(a: f64, b: f64, epsilon: f64) -> bool {
    let d = (a - b).rem_euclid(PI);
    d <= epsilon || PI - d <= epsilon
}

/// Gegenrichtung eines Winkels.
pub fn opposite(angle: f64) -> f64 {
    normalize_angle(angle + PI)
}
