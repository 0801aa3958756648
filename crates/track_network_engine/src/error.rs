//! Fehlertypen der Engine.

use crate::core::{TrackId, VertexId};

/// Grund, warum eine anwendbare Bearbeitung nicht ausgeführt werden konnte.
///
/// Die Unit of Work ist nach einem solchen Fehler unverändert.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditFailure {
    /// Zielposition liegt außerhalb der Welt.
    #[error("Position ({x:.3}, {y:.3}) liegt ausserhalb der Welt")]
    OutOfBounds { x: f64, y: f64 },

    /// Neue Tangente passt nicht zum bestehenden Anschluss.
    #[error("Tangente passt nicht zum Anschluss bei ({x:.3}, {y:.3})")]
    TangentMismatch { x: f64, y: f64 },

    /// Kein Solver liefert eine Form mit den geforderten Tangenten.
    #[error("keine geometrische Loesung: {reason}")]
    Infeasible { reason: &'static str },

    /// Nachbarschaft konnte nicht vollständig importiert werden.
    #[error("Kontext unvollstaendig: {reason}")]
    MissingContext { reason: &'static str },

    /// Nachbedingung (Tangenten-Stetigkeit, Endpunkt-Drift) verletzt.
    #[error("Tangenten-Stetigkeit verletzt: {detail}")]
    ContinuityBroken { detail: String },
}

impl EditFailure {
    pub(crate) fn infeasible(reason: &'static str) -> Self {
        EditFailure::Infeasible { reason }
    }
}

/// Fehler beim Schreiben eines einzelnen Datensatzes in die Welt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldWriteError {
    #[error("Vertex {id} liegt ausserhalb der Welt")]
    OutOfBounds { id: VertexId },

    #[error("Track {track} verweist auf unbekannten Vertex {vertex}")]
    MissingVertex { track: TrackId, vertex: VertexId },

    #[error("Vertex {0} existiert nicht")]
    UnknownVertex(VertexId),
}

/// Commit vor jeder Änderung abgelehnt. Die Welt ist unverändert.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommitRejection {
    /// Importierter Vertex existiert nicht mehr in der Welt.
    #[error("importierter Vertex {0} existiert nicht mehr")]
    StaleVertex(VertexId),

    /// Importierter Track existiert nicht mehr in der Welt.
    #[error("importierter Track {0} existiert nicht mehr")]
    StaleTrack(TrackId),

    #[error("Vertex bei ({x:.3}, {y:.3}) liegt ausserhalb der Welt")]
    OutOfBounds { x: f64, y: f64 },

    /// Ein Vertex-Slot verweist auf einen nicht importierten Track.
    #[error("Vertex verweist auf nicht importierten Track {0}")]
    DanglingReference(TrackId),

    /// Neu vergebene ID ist bereits belegt.
    #[error("ID-Kollision: {0} bereits vergeben")]
    IdCollision(String),

    /// Endzustand verletzt die Tangenten-Stetigkeit.
    #[error("Tangenten-Stetigkeit verletzt: {0}")]
    Discontinuous(String),
}

/// Fehler beim Übernehmen einer Unit of Work in die Welt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommitError {
    /// Nichts wurde geschrieben; erneuter Versuch ist sicher.
    #[error("Commit abgelehnt: {0}")]
    Rejected(#[from] CommitRejection),

    /// Schreiben in die Arbeitskopie brach nach `applied` Datensätzen ab.
    /// Die Welt bleibt unverändert.
    #[error("Commit nach {applied} Datensaetzen abgebrochen: {source}")]
    WriteFailed {
        applied: usize,
        #[source]
        source: WorldWriteError,
    },
}

impl CommitError {
    /// `true` wenn die Validierung ablehnte. Ein Schreibfehler wiederholt sich
    /// mit derselben Unit of Work.
    pub fn is_retry_safe(&self) -> bool {
        matches!(self, CommitError::Rejected(_))
    }
}
