//! Editor-Fassade: Welt, aktive Sitzung, Command-Log und veröffentlichte Vorschau.

use super::{CommandLog, CommandResult, EditCommand};
use crate::shared::EditorOptions;
use glam::DVec2;
use std::sync::Arc;
use track_network_engine::{
    CommitError, CommitReport, EditMode, EditOutcome, EditSession, PreviewSnapshot, TrackHandle,
    TrackId, TrackKind, VertexHandle, VertexId, World,
};

/// Orchestriert Bearbeitungen auf einer Welt.
///
/// Die erste Bearbeitung eröffnet eine Sitzung; `commit` oder `discard`
/// beenden sie. Nach jeder angewendeten Bearbeitung wird ein neuer
/// unveränderlicher Vorschau-Snapshot veröffentlicht.
pub struct TrackEditor {
    world: World,
    session: Option<EditSession>,
    options: EditorOptions,
    command_log: CommandLog,
    preview: Arc<PreviewSnapshot>,
}

impl TrackEditor {
    /// Editor mit leerer Welt aus den Optionen.
    pub fn new(options: EditorOptions) -> Self {
        let world = options.build_world();
        Self::with_world(world, options)
    }

    pub fn with_world(world: World, options: EditorOptions) -> Self {
        Self {
            world,
            session: None,
            options,
            command_log: CommandLog::new(),
            preview: Arc::new(PreviewSnapshot::default()),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn command_log(&self) -> &CommandLog {
        &self.command_log
    }

    /// Zuletzt veröffentlichter Vorschau-Snapshot.
    pub fn preview(&self) -> Arc<PreviewSnapshot> {
        Arc::clone(&self.preview)
    }

    /// Aktive Sitzung, falls eine eröffnet wurde.
    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// `true` solange eine Sitzung ungespeicherte Änderungen hält.
    pub fn has_pending_edits(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Aktive Sitzung, bei Bedarf neu eröffnet.
    fn session_mut<'a>(
        session: &'a mut Option<EditSession>,
        options: &EditorOptions,
    ) -> &'a mut EditSession {
        session.get_or_insert_with(|| {
            log::debug!("Neue Bearbeitungs-Sitzung eroeffnet");
            EditSession::new(options.to_settings())
        })
    }

    fn publish_preview(&mut self) {
        let snapshot = self
            .session
            .as_ref()
            .map(EditSession::export_preview)
            .unwrap_or_default();
        self.preview = Arc::new(snapshot);
    }

    /// Handle für einen persistierten Vertex der Welt.
    pub fn vertex_handle(&mut self, id: VertexId) -> Option<VertexHandle> {
        let session = Self::session_mut(&mut self.session, &self.options);
        let handle = session.vertex_handle(&self.world, id);
        self.publish_preview();
        handle
    }

    /// Handle für einen persistierten Track der Welt.
    pub fn track_handle(&mut self, id: TrackId) -> Option<TrackHandle> {
        let session = Self::session_mut(&mut self.session, &self.options);
        let handle = session.track_handle(&self.world, id);
        self.publish_preview();
        handle
    }

    /// Führt einen Command auf der aktiven Sitzung aus.
    ///
    /// Nur angewendete Commands landen im Log.
    pub fn handle_command(&mut self, command: EditCommand) -> EditOutcome<CommandResult> {
        let session = Self::session_mut(&mut self.session, &self.options);
        let world = &self.world;

        let outcome = match command {
            EditCommand::CreateTrack { from, to } => session
                .create_track(world, from, to)
                .map(CommandResult::Vertex),
            EditCommand::ExtendTrack {
                vertex,
                target,
                mode,
            } => session
                .extend_track(world, vertex, target, mode)
                .map(CommandResult::Track),
            EditCommand::MoveVertex {
                vertex,
                target,
                mode,
            } => session
                .move_vertex(world, vertex, target, mode)
                .map(|()| CommandResult::Vertex(vertex)),
            EditCommand::ConvertTrack { track, kind } => session
                .convert_track(world, track, kind)
                .map(|()| CommandResult::Track(track)),
            EditCommand::BindVertices { first, second } => session
                .bind_vertices(world, first, second)
                .map(CommandResult::Track),
            EditCommand::SnapTrack { vertex, track } => session
                .snap_track(world, vertex, track)
                .map(|()| CommandResult::Done),
            EditCommand::CreateJunction { track, at } => session
                .create_junction(world, track, at)
                .map(CommandResult::Vertex),
        };

        match &outcome {
            EditOutcome::Applied(_) => {
                log::debug!("{} angewendet", command.name());
                self.command_log.record(command);
                self.publish_preview();
            }
            EditOutcome::NotApplicable => log::debug!("{} nicht anwendbar", command.name()),
            EditOutcome::Failed(_) => {}
        }
        outcome
    }

    pub fn create_track(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Option<VertexHandle> {
        let command = EditCommand::CreateTrack {
            from: DVec2::new(x1, y1),
            to: DVec2::new(x2, y2),
        };
        match self.handle_command(command).applied()? {
            CommandResult::Vertex(vertex) => Some(vertex),
            _ => None,
        }
    }

    pub fn extend_track(
        &mut self,
        vertex: VertexHandle,
        x: f64,
        y: f64,
        mode: EditMode,
    ) -> Option<TrackHandle> {
        let command = EditCommand::ExtendTrack {
            vertex,
            target: DVec2::new(x, y),
            mode,
        };
        match self.handle_command(command).applied()? {
            CommandResult::Track(track) => Some(track),
            _ => None,
        }
    }

    pub fn move_vertex(&mut self, vertex: VertexHandle, x: f64, y: f64, mode: EditMode) -> bool {
        self.handle_command(EditCommand::MoveVertex {
            vertex,
            target: DVec2::new(x, y),
            mode,
        })
        .is_applied()
    }

    pub fn convert_track(&mut self, track: TrackHandle, kind: TrackKind) -> bool {
        self.handle_command(EditCommand::ConvertTrack { track, kind })
            .is_applied()
    }

    pub fn bind_vertices(&mut self, first: VertexHandle, second: VertexHandle) -> bool {
        self.handle_command(EditCommand::BindVertices { first, second })
            .is_applied()
    }

    pub fn snap_track(&mut self, vertex: VertexHandle, track: TrackHandle) -> bool {
        self.handle_command(EditCommand::SnapTrack { vertex, track })
            .is_applied()
    }

    pub fn create_junction(&mut self, track: TrackHandle, x: f64, y: f64) -> Option<VertexHandle> {
        let command = EditCommand::CreateJunction {
            track,
            at: DVec2::new(x, y),
        };
        match self.handle_command(command).applied()? {
            CommandResult::Vertex(vertex) => Some(vertex),
            _ => None,
        }
    }

    /// Übernimmt die aktive Sitzung in die Welt.
    ///
    /// Ohne Sitzung ist der Bericht leer. Nach einer Ablehnung bleibt die
    /// Sitzung samt Handles erhalten.
    pub fn commit(&mut self) -> Result<CommitReport, CommitError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(CommitReport::default());
        };
        let report = session.commit(&mut self.world)?;
        self.session = None;
        self.command_log.clear();
        self.publish_preview();
        Ok(report)
    }

    /// Verwirft die aktive Sitzung.
    pub fn discard(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.discard();
        }
        self.command_log.clear();
        self.publish_preview();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> TrackEditor {
        TrackEditor::new(EditorOptions::default())
    }

    #[test]
    fn applied_commands_are_logged_and_published() {
        let mut editor = editor();
        let end = editor
            .create_track(0.0, 0.0, 10.0, 0.0)
            .expect("Track erwartet");
        assert_eq!(editor.command_log().len(), 1);
        assert!(editor.has_pending_edits());

        let preview = editor.preview();
        assert_eq!(preview.vertices.len(), 2);
        assert_eq!(preview.tracks.len(), 1);

        // Ein gehaltener Snapshot bleibt unverändert
        assert!(editor
            .extend_track(end, 20.0, 0.0, EditMode::Default)
            .is_some());
        assert_eq!(preview.tracks.len(), 1);
        assert_eq!(editor.preview().tracks.len(), 2);
        assert_eq!(editor.command_log().len(), 2);
    }

    #[test]
    fn not_applicable_command_is_not_logged() {
        let mut editor = editor();
        let end = editor
            .create_track(0.0, 0.0, 10.0, 0.0)
            .expect("Track erwartet");
        let before = editor.preview();

        // Ein Vertex kann nicht mit sich selbst verbunden werden
        let outcome = editor.handle_command(EditCommand::BindVertices {
            first: end,
            second: end,
        });
        assert_eq!(outcome, EditOutcome::NotApplicable);
        assert_eq!(editor.command_log().len(), 1);
        assert!(Arc::ptr_eq(&before, &editor.preview()));
    }

    #[test]
    fn commit_writes_world_and_ends_session() {
        let mut editor = editor();
        editor.create_track(0.0, 0.0, 10.0, 0.0);
        let report = editor.commit().expect("Commit");
        assert_eq!(report.created_tracks, 1);
        assert_eq!(editor.world().track_count(), 1);
        assert!(!editor.has_pending_edits());
        assert!(editor.preview().is_empty());
        assert!(editor.command_log().is_empty());
    }

    #[test]
    fn persisted_records_are_editable_after_commit() {
        let mut editor = editor();
        editor.create_track(0.0, 0.0, 10.0, 0.0);
        editor.commit().expect("Commit");

        let id = editor
            .world()
            .vertices()
            .find(|v| v.position == DVec2::new(10.0, 0.0))
            .map(|v| v.id)
            .expect("Vertex");
        let vertex = editor.vertex_handle(id).expect("Handle");
        assert!(editor.extend_track(vertex, 20.0, 5.0, EditMode::Alternate).is_some());

        let report = editor.commit().expect("Commit");
        assert_eq!(report.created_tracks, 1);
        assert_eq!(editor.world().track_count(), 2);
    }

    #[test]
    fn handle_from_committed_session_does_not_touch_new_session() {
        let mut editor = editor();
        let old = editor
            .create_track(0.0, 0.0, 10.0, 0.0)
            .expect("Track erwartet");
        editor.commit().expect("Commit");

        editor.create_track(100.0, 100.0, 110.0, 100.0);
        let before = editor.preview();
        assert!(!editor.move_vertex(old, 50.0, 50.0, EditMode::Default));
        assert!(Arc::ptr_eq(&before, &editor.preview()));
        assert_eq!(editor.command_log().len(), 1);

        let positions: Vec<_> = before.vertices.iter().map(|v| v.position).collect();
        assert!(!positions.contains(&[50.0, 50.0]));
    }

    #[test]
    fn commit_without_session_is_empty() {
        let mut editor = editor();
        assert_eq!(editor.commit(), Ok(CommitReport::default()));
    }

    #[test]
    fn discard_drops_pending_edits() {
        let mut editor = editor();
        editor.create_track(0.0, 0.0, 10.0, 0.0);
        editor.discard();
        assert!(!editor.has_pending_edits());
        assert!(editor.preview().is_empty());
        assert_eq!(editor.world().vertex_count(), 0);
    }
}
