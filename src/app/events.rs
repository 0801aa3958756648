//! Bearbeitungs-Commands und ihre Ergebnisse.

use glam::DVec2;
use track_network_engine::{EditMode, TrackHandle, TrackKind, VertexHandle};

/// Ein Bearbeitungs-Command auf der aktiven Sitzung.
///
/// Handles beziehen sich auf die Unit of Work der laufenden Sitzung und
/// verlieren nach Commit oder Verwerfen ihre Gültigkeit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditCommand {
    /// Track zwischen zwei Punkten anlegen
    CreateTrack { from: DVec2, to: DVec2 },
    /// Track an einem offenen Ende fortsetzen
    ExtendTrack {
        vertex: VertexHandle,
        target: DVec2,
        mode: EditMode,
    },
    MoveVertex {
        vertex: VertexHandle,
        target: DVec2,
        mode: EditMode,
    },
    ConvertTrack { track: TrackHandle, kind: TrackKind },
    /// Zwei offene Gerade-Enden verbinden
    BindVertices {
        first: VertexHandle,
        second: VertexHandle,
    },
    /// Offenes Ende auf das nächste offene Ende eines Tracks einrasten
    SnapTrack {
        vertex: VertexHandle,
        track: TrackHandle,
    },
    CreateJunction { track: TrackHandle, at: DVec2 },
}

impl EditCommand {
    /// Kurzname für Log-Ausgaben.
    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::CreateTrack { .. } => "create_track",
            EditCommand::ExtendTrack { .. } => "extend_track",
            EditCommand::MoveVertex { .. } => "move_vertex",
            EditCommand::ConvertTrack { .. } => "convert_track",
            EditCommand::BindVertices { .. } => "bind_vertices",
            EditCommand::SnapTrack { .. } => "snap_track",
            EditCommand::CreateJunction { .. } => "create_junction",
        }
    }
}

/// Ergebnis eines angewendeten Commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandResult {
    /// Neuer oder betroffener Vertex
    Vertex(VertexHandle),
    /// Neuer Track
    Track(TrackHandle),
    Done,
}
