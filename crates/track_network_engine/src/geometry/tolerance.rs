//! Toleranzen für Gleichheits-Tests in der Geometrie.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Standard-Toleranz für Längen, Parallelität und Determinanten.
pub const LINEAR_EPSILON: f64 = 1e-10;
/// Standard-Toleranz für Tangenten-Vergleiche (Radiant).
pub const ANGULAR_EPSILON: f64 = 1e-9;

/// Zur Laufzeit einstellbare Toleranzen.
///
/// Strengere Werte als die Defaults führen bei abgeleiteten Bögen zu
/// instabilen Entscheidungen, deshalb sind beide Werte konfigurierbar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Absolute Toleranz für Abstände und Determinanten
    pub linear: f64,
    /// Toleranz für Winkelvergleiche (Radiant)
    pub angular: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            linear: LINEAR_EPSILON,
            angular: ANGULAR_EPSILON,
        }
    }
}

impl Tolerance {
    /// Prüft ob ein Wert innerhalb der linearen Toleranz null ist.
    pub fn is_zero(&self, value: f64) -> bool {
        value.abs() <= self.linear
    }

    /// Prüft ob zwei Punkte zusammenfallen.
    ///
    /// Die Toleranz skaliert mit dem Betrag der Koordinaten, da Endpunkte von
    /// Bögen aus `center + r·dir(θ)` rekonstruiert werden.
    pub fn points_coincide(&self, a: DVec2, b: DVec2) -> bool {
        let scale = 1.0_f64.max(a.abs().max_element()).max(b.abs().max_element());
        a.distance(b) <= self.linear * scale * 1e3
    }

    /// Winkel-Toleranz für Nachbedingungen.
    ///
    /// Tangenten rekonstruierter Bögen tragen Rundungsfehler aus `atan2` und
    /// der Mittelpunkt-Konstruktion, daher 1000-fach gelockert.
    pub fn continuity_angle(&self) -> f64 {
        self.angular * 1e3
    }
}
