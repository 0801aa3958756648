//! Bearbeitungs-Sitzung: besitzt die Unit of Work und führt die Regelwerke aus.

use super::bridge::ImportBridge;
use super::commit::{CommitReport, commit};
use super::operations::RuleBook;
use super::preview::PreviewSnapshot;
use super::records::{TrackHandle, VertexHandle};
use super::rules::{EditContext, EditMode, EditOutcome, Endpoint};
use super::unit_of_work::UnitOfWork;
use crate::core::{TrackId, TrackKind, VertexId, World};
use crate::error::{CommitError, EditFailure};
use crate::geometry::Tolerance;
use glam::DVec2;

/// Laufzeit-Einstellungen einer Sitzung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditSettings {
    pub tolerance: Tolerance,
    /// Fangradius für Endpunkte beim Anlegen von Tracks (Meter)
    pub snap_radius: f64,
    /// Knick gegenüber der Sehne beim Umwandeln eines freien Tracks in einen Bogen
    pub conversion_bend: f64,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            snap_radius: 0.5,
            conversion_bend: 15f64.to_radians(),
        }
    }
}

/// Eine Sitzung bearbeitet genau eine Unit of Work, bis sie übernommen
/// oder verworfen wird.
pub struct EditSession {
    uow: UnitOfWork,
    settings: EditSettings,
    rules: RuleBook,
}

impl EditSession {
    pub fn new(settings: EditSettings) -> Self {
        Self {
            uow: UnitOfWork::new(),
            settings,
            rules: RuleBook::default(),
        }
    }

    pub fn settings(&self) -> &EditSettings {
        &self.settings
    }

    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.uow
    }

    pub fn is_empty(&self) -> bool {
        self.uow.is_empty()
    }

    /// Handle für einen persistierten Vertex; importiert ihn samt Nachbarschaft.
    pub fn vertex_handle(&mut self, world: &World, id: VertexId) -> Option<VertexHandle> {
        let bridge = ImportBridge::new(world);
        let handle = bridge.import_vertex(&mut self.uow, id)?;
        bridge.import_neighborhood(&mut self.uow, handle);
        Some(handle)
    }

    /// Handle für einen persistierten Track; importiert beide Endpunkte samt Nachbarschaft.
    pub fn track_handle(&mut self, world: &World, id: TrackId) -> Option<TrackHandle> {
        let bridge = ImportBridge::new(world);
        let handle = bridge.import_track(&mut self.uow, id)?;
        for vertex in self.uow.track(handle).vertices {
            bridge.import_neighborhood(&mut self.uow, vertex);
        }
        Some(handle)
    }

    fn context(&self, world: &World) -> EditContext {
        EditContext::new(world.bounds())
    }

    /// Vorhandener Endpunkt im Fangradius oder neue Position.
    ///
    /// Gesucht wird zuerst in der Unit of Work, dann in der Welt. Nur
    /// Vertices mit höchstens einem Track kommen in Frage.
    fn resolve_endpoint(&mut self, world: &World, p: DVec2) -> Endpoint {
        let radius = self.settings.snap_radius;
        let staged = self
            .uow
            .vertices()
            .filter(|(_, v)| v.track_count() <= 1 && v.position.distance(p) <= radius)
            .min_by(|a, b| {
                a.1.position
                    .distance(p)
                    .total_cmp(&b.1.position.distance(p))
            })
            .map(|(h, _)| h);
        if let Some(handle) = staged {
            return Endpoint::Existing(handle);
        }

        let candidate = world.vertices_within(p, radius).into_iter().find(|m| {
            self.uow.find_vertex(m.vertex_id).is_none()
                && !self.uow.retired_vertices().contains(&m.vertex_id)
                && world
                    .find_vertex(m.vertex_id)
                    .is_some_and(|v| v.track_count() <= 1)
        });
        match candidate.and_then(|m| self.vertex_handle(world, m.vertex_id)) {
            Some(handle) => Endpoint::Existing(handle),
            None => Endpoint::Fresh(p),
        }
    }

    /// Legt einen Track zwischen zwei Punkten an. Liefert den Vertex am
    /// zweiten Punkt.
    pub fn create_track(&mut self, world: &World, from: DVec2, to: DVec2) -> EditOutcome<VertexHandle> {
        let first = self.resolve_endpoint(world, from);
        let second = self.resolve_endpoint(world, to);
        let ctx = self.context(world).with_vertex(first).with_vertex(second);

        let bridge = ImportBridge::new(world);
        let outcome = self
            .rules
            .create
            .dispatch(&mut self.uow, &bridge, ctx, &self.settings);
        let uow = &self.uow;
        outcome.map(|ends| match second {
            Endpoint::Existing(handle) => handle,
            Endpoint::Fresh(p) => {
                if uow.vertex(ends[1]).position == p {
                    ends[1]
                } else {
                    ends[0]
                }
            }
        })
    }

    /// Setzt den Track an `vertex` in Richtung `target` fort.
    pub fn extend_track(
        &mut self,
        world: &World,
        vertex: VertexHandle,
        target: DVec2,
        mode: EditMode,
    ) -> EditOutcome<TrackHandle> {
        let ctx = self
            .context(world)
            .with_vertex(Endpoint::Existing(vertex))
            .with_point(target)
            .with_mode(mode);
        let bridge = ImportBridge::new(world);
        self.rules
            .extend
            .dispatch(&mut self.uow, &bridge, ctx, &self.settings)
    }

    /// Verschiebt einen Vertex. Ein Ziel außerhalb der Welt scheitert vor
    /// jeder Regel-Prüfung.
    pub fn move_vertex(
        &mut self,
        world: &World,
        vertex: VertexHandle,
        target: DVec2,
        mode: EditMode,
    ) -> EditOutcome<()> {
        if !world.is_within_world(target) {
            return EditOutcome::Failed(EditFailure::OutOfBounds {
                x: target.x,
                y: target.y,
            });
        }
        let ctx = self
            .context(world)
            .with_vertex(Endpoint::Existing(vertex))
            .with_point(target)
            .with_mode(mode);
        // Verschieben auf die eigene Position ändert nichts, sofern die Regel greift
        if self
            .rules
            .move_vertex
            .accepts(&self.uow, &ctx, &self.settings.tolerance)
            && self.uow.get_vertex(vertex).is_some_and(|v| v.position == target)
        {
            return EditOutcome::Applied(());
        }
        let bridge = ImportBridge::new(world);
        self.rules
            .move_vertex
            .dispatch(&mut self.uow, &bridge, ctx, &self.settings)
    }

    /// Wandelt einen Track in einen anderen Typ um.
    pub fn convert_track(&mut self, world: &World, track: TrackHandle, kind: TrackKind) -> EditOutcome<()> {
        let mut ctx = self
            .context(world)
            .with_track(track)
            .with_target_kind(kind);
        ctx.subject = Some(track);
        let bridge = ImportBridge::new(world);
        self.rules
            .convert
            .dispatch(&mut self.uow, &bridge, ctx, &self.settings)
    }

    /// Verbindet zwei offene Gerade-Enden.
    pub fn bind_vertices(&mut self, world: &World, a: VertexHandle, b: VertexHandle) -> EditOutcome<TrackHandle> {
        let ctx = self
            .context(world)
            .with_vertex(Endpoint::Existing(a))
            .with_vertex(Endpoint::Existing(b));
        let bridge = ImportBridge::new(world);
        self.rules
            .bind
            .dispatch(&mut self.uow, &bridge, ctx, &self.settings)
    }

    /// Rastet das offene Ende `vertex` auf das nächste offene Ende von `track` ein.
    pub fn snap_track(&mut self, world: &World, vertex: VertexHandle, track: TrackHandle) -> EditOutcome<()> {
        let ctx = self
            .context(world)
            .with_vertex(Endpoint::Existing(vertex))
            .with_track(track);
        let bridge = ImportBridge::new(world);
        self.rules
            .snap
            .dispatch(&mut self.uow, &bridge, ctx, &self.settings)
    }

    /// Legt eine Junction auf `track` am Punkt nächst `at` an.
    pub fn create_junction(&mut self, world: &World, track: TrackHandle, at: DVec2) -> EditOutcome<VertexHandle> {
        let ctx = self.context(world).with_track(track).with_point(at);
        let bridge = ImportBridge::new(world);
        self.rules
            .junction
            .dispatch(&mut self.uow, &bridge, ctx, &self.settings)
    }

    pub fn export_preview(&self) -> PreviewSnapshot {
        self.uow.export_preview()
    }

    /// Übernimmt die Unit of Work in die Welt und beginnt eine leere.
    ///
    /// Nach einer Ablehnung bleibt die Unit of Work erhalten.
    pub fn commit(&mut self, world: &mut World) -> Result<CommitReport, CommitError> {
        let report = commit(&self.uow, world, &self.settings.tolerance)?;
        self.uow = UnitOfWork::new();
        Ok(report)
    }

    /// Verwirft alle Änderungen.
    pub fn discard(&mut self) {
        if !self.uow.is_empty() {
            log::debug!(
                "Unit of Work verworfen ({} Vertices, {} Tracks)",
                self.uow.vertex_count(),
                self.uow.track_count()
            );
        }
        self.uow = UnitOfWork::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorldBounds;

    fn world() -> World {
        World::new(WorldBounds::centered(1000.0), 100.0)
    }

    #[test]
    fn create_then_commit_round_trip() {
        let mut world = world();
        let mut session = EditSession::new(EditSettings::default());
        let end = session
            .create_track(&world, DVec2::ZERO, DVec2::new(10.0, 0.0))
            .applied()
            .expect("Track erwartet");
        assert_eq!(session.unit_of_work().vertex(end).position, DVec2::new(10.0, 0.0));

        let report = session.commit(&mut world).expect("Commit");
        assert_eq!(report.created_tracks, 1);
        assert!(session.is_empty());
        let track = world.tracks().next().expect("Track");
        assert_eq!(
            track.shape,
            crate::core::TrackShape::Straight {
                from: DVec2::ZERO,
                to: DVec2::new(10.0, 0.0)
            }
        );
    }

    #[test]
    fn create_snaps_onto_persisted_open_end() {
        let mut world = world();
        let mut session = EditSession::new(EditSettings::default());
        session
            .create_track(&world, DVec2::ZERO, DVec2::new(10.0, 0.0))
            .applied()
            .expect("Track erwartet");
        session.commit(&mut world).expect("Commit");

        // Start knapp neben dem offenen Ende: wird gefangen und fortgesetzt
        let end = session
            .create_track(&world, DVec2::new(10.2, 0.1), DVec2::new(20.0, 0.0))
            .applied()
            .expect("Fortsetzung erwartet");
        assert_eq!(session.unit_of_work().vertex(end).position, DVec2::new(20.0, 0.0));
        let report = session.commit(&mut world).expect("Commit");
        assert_eq!(report.created_vertices, 1);
        assert_eq!(report.updated_vertices, 1);
        assert_eq!(world.vertex_count(), 3);
    }

    #[test]
    fn move_out_of_world_fails_before_dispatch() {
        let world = world();
        let mut session = EditSession::new(EditSettings::default());
        let end = session
            .create_track(&world, DVec2::ZERO, DVec2::new(10.0, 0.0))
            .applied()
            .expect("Track erwartet");
        let before = session.export_preview();
        let outcome = session.move_vertex(&world, end, DVec2::new(5000.0, 0.0), EditMode::Default);
        assert!(matches!(outcome, EditOutcome::Failed(EditFailure::OutOfBounds { .. })));
        assert_eq!(session.export_preview(), before);
    }

    #[test]
    fn handles_of_committed_session_are_unknown_afterwards() {
        let mut world = world();
        let mut session = EditSession::new(EditSettings::default());
        let old = session
            .create_track(&world, DVec2::ZERO, DVec2::new(10.0, 0.0))
            .applied()
            .expect("Track erwartet");
        session.commit(&mut world).expect("Commit");

        session
            .create_track(&world, DVec2::new(100.0, 100.0), DVec2::new(110.0, 100.0))
            .applied()
            .expect("Track erwartet");
        let before = session.export_preview();
        let outcome = session.move_vertex(&world, old, DVec2::new(50.0, 50.0), EditMode::Default);
        assert_eq!(outcome, EditOutcome::NotApplicable);
        assert_eq!(session.export_preview(), before);
    }

    #[test]
    fn handles_of_discarded_session_are_unknown_afterwards() {
        let world = world();
        let mut session = EditSession::new(EditSettings::default());
        let old = session
            .create_track(&world, DVec2::ZERO, DVec2::new(10.0, 0.0))
            .applied()
            .expect("Track erwartet");
        session.discard();
        session.create_track(&world, DVec2::new(20.0, 0.0), DVec2::new(30.0, 0.0));
        assert_eq!(
            session.extend_track(&world, old, DVec2::new(40.0, 5.0), EditMode::Default),
            EditOutcome::NotApplicable
        );
    }

    #[test]
    fn junction_moved_onto_itself_is_not_applicable() {
        let world = world();
        let mut session = EditSession::new(EditSettings::default());
        let end = session
            .create_track(&world, DVec2::ZERO, DVec2::new(20.0, 0.0))
            .applied()
            .expect("Track erwartet");
        let master = session
            .unit_of_work()
            .vertex(end)
            .staged_tracks()
            .next()
            .expect("Track am Vertex");
        let junction = session
            .create_junction(&world, master, DVec2::new(10.0, 0.0))
            .applied()
            .expect("Junction erwartet");
        let at = session.unit_of_work().vertex(junction).position;

        let outcome = session.move_vertex(&world, junction, at, EditMode::Default);
        assert_eq!(outcome, EditOutcome::NotApplicable);
        // Ein gewöhnlicher Vertex auf seiner Position bleibt ein No-op
        assert_eq!(
            session.move_vertex(&world, end, DVec2::new(20.0, 0.0), EditMode::Default),
            EditOutcome::Applied(())
        );
    }

    #[test]
    fn discard_leaves_world_untouched() {
        let world = world();
        let mut session = EditSession::new(EditSettings::default());
        session.create_track(&world, DVec2::ZERO, DVec2::new(10.0, 0.0));
        session.discard();
        assert!(session.is_empty());
        assert_eq!(world.vertex_count(), 0);
    }
}
