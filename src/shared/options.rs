//! Zentrale Konfiguration für den Gleisnetz-Editor.
//!
//! `EditorOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};
use track_network_engine::geometry::{ANGULAR_EPSILON, LINEAR_EPSILON};
use track_network_engine::{EditSettings, Tolerance, World, WorldBounds};

// ── Welt ────────────────────────────────────────────────────────────

/// Halbe Kantenlänge der Standard-Welt (Meter).
pub const WORLD_HALF_EXTENT: f64 = 2048.0;
/// Kantenlänge eines Raster-Segments (Meter).
pub const SEGMENT_SIZE: f64 = 64.0;

// ── Tools ───────────────────────────────────────────────────────────

/// Snap-Radius (Meter): Endpunkte innerhalb dieses Radius rasten auf offene Enden ein.
pub const SNAP_RADIUS: f64 = 0.5;
/// Knick gegenüber der Sehne beim Umwandeln freistehender Tracks in Bögen (Grad).
pub const CONVERSION_BEND_DEG: f64 = 15.0;

/// Laufzeit-Optionen des Editors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorOptions {
    // ── Geometrie ────────────────────────────────────────────────
    /// Absolute Toleranz für Abstände und Determinanten
    #[serde(default = "default_linear_tolerance")]
    pub linear_tolerance: f64,
    /// Toleranz für Tangenten-Vergleiche (Radiant)
    #[serde(default = "default_angular_tolerance")]
    pub angular_tolerance: f64,

    // ── Tools ────────────────────────────────────────────────────
    pub snap_radius: f64,
    pub conversion_bend_deg: f64,

    // ── Welt ─────────────────────────────────────────────────────
    /// Untere linke Ecke der Welt
    pub world_min: [f64; 2],
    /// Obere rechte Ecke der Welt
    pub world_max: [f64; 2],
    pub segment_size: f64,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            linear_tolerance: LINEAR_EPSILON,
            angular_tolerance: ANGULAR_EPSILON,

            snap_radius: SNAP_RADIUS,
            conversion_bend_deg: CONVERSION_BEND_DEG,

            world_min: [-WORLD_HALF_EXTENT; 2],
            world_max: [WORLD_HALF_EXTENT; 2],
            segment_size: SEGMENT_SIZE,
        }
    }
}

/// Serde-Default für `linear_tolerance` (ältere TOML-Dateien ohne Toleranzen).
fn default_linear_tolerance() -> f64 {
    LINEAR_EPSILON
}

fn default_angular_tolerance() -> f64 {
    ANGULAR_EPSILON
}

impl EditorOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("track_network_editor"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("track_network_editor.toml")
    }

    pub fn world_bounds(&self) -> WorldBounds {
        WorldBounds::new(self.world_min.into(), self.world_max.into())
    }

    /// Leere Welt mit den konfigurierten Grenzen.
    pub fn build_world(&self) -> World {
        World::new(self.world_bounds(), self.segment_size)
    }

    /// Übersetzt die Optionen in Sitzungs-Einstellungen der Engine.
    pub fn to_settings(&self) -> EditSettings {
        EditSettings {
            tolerance: Tolerance {
                linear: self.linear_tolerance,
                angular: self.angular_tolerance,
            },
            snap_radius: self.snap_radius,
            conversion_bend: self.conversion_bend_deg.to_radians(),
        }
    }
}
