//! Übernahme einer Unit of Work in die Welt.
//!
//! Zuerst wird vollständig validiert, ohne die Welt zu berühren. Erst danach
//! werden IDs vergeben und die Datensätze geschrieben: Vertices, dann
//! Tracks, dann entfernte Vertices. Geschrieben wird in eine Arbeitskopie
//! der Welt, die nur bei Erfolg übernommen wird.

use super::records::{TrackHandle, TrackRef, VertexHandle};
use super::topology::check_continuity;
use super::unit_of_work::UnitOfWork;
use crate::core::{Junction, Track, TrackId, Vertex, VertexId, World};
use crate::error::{CommitError, CommitRejection, EditFailure};
use crate::geometry::Tolerance;
use indexmap::IndexMap;

/// Ergebnis eines erfolgreichen Commits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReport {
    pub created_vertices: usize,
    pub created_tracks: usize,
    pub updated_vertices: usize,
    pub updated_tracks: usize,
    pub removed_vertices: usize,
    /// Persistente ID jedes Vertex-Records der Unit of Work
    pub vertex_ids: IndexMap<VertexHandle, VertexId>,
    /// Persistente ID jedes Track-Records der Unit of Work
    pub track_ids: IndexMap<TrackHandle, TrackId>,
}

impl CommitReport {
    pub fn written(&self) -> usize {
        self.created_vertices + self.created_tracks + self.updated_vertices + self.updated_tracks
    }
}

/// Fertig aufgelöste Schreibliste.
#[derive(Debug, Clone, Default)]
pub(crate) struct CommitPatch {
    pub vertices: Vec<Vertex>,
    pub tracks: Vec<Track>,
    pub removed: Vec<VertexId>,
}

/// Validiert `uow` gegen `world` und schreibt sie.
///
/// Bei jedem Fehler ist die Welt unverändert, auch die ID-Zähler.
pub fn commit(
    uow: &UnitOfWork,
    world: &mut World,
    tolerance: &Tolerance,
) -> Result<CommitReport, CommitError> {
    if let Err(rejection) = validate(uow, world, tolerance) {
        log::warn!("Commit abgelehnt: {rejection}");
        return Err(rejection.into());
    }

    let report = on_staged_copy(world, |staged| {
        let (patch, report) = build_patch(uow, staged);
        apply_patch(staged, patch)?;
        Ok(report)
    })
    .inspect_err(|err| log::warn!("{err}; Welt unveraendert"))?;
    log::info!(
        "Commit: {} Vertices neu, {} geaendert, {} Tracks neu, {} geaendert, {} entfernt",
        report.created_vertices,
        report.updated_vertices,
        report.created_tracks,
        report.updated_tracks,
        report.removed_vertices
    );
    Ok(report)
}

fn validate(uow: &UnitOfWork, world: &World, tolerance: &Tolerance) -> Result<(), CommitRejection> {
    // Veraltete Importe
    for (_, vertex) in uow.vertices() {
        if let Some(id) = vertex.origin
            && world.find_vertex(id).is_none()
        {
            return Err(CommitRejection::StaleVertex(id));
        }
    }
    for (_, track) in uow.tracks() {
        if let Some(id) = track.origin
            && world.find_track(id).is_none()
        {
            return Err(CommitRejection::StaleTrack(id));
        }
    }
    for id in uow.retired_vertices() {
        if world.find_vertex(*id).is_none() {
            return Err(CommitRejection::StaleVertex(*id));
        }
    }

    for (_, vertex) in uow.vertices() {
        if !world.is_within_world(vertex.position) {
            return Err(CommitRejection::OutOfBounds {
                x: vertex.position.x,
                y: vertex.position.y,
            });
        }
    }

    // ID-only-Verweise sind nur an unveränderten Vertices zulässig
    for (_, vertex) in uow.vertices() {
        let unchanged = vertex
            .origin
            .and_then(|id| world.find_vertex(id))
            .is_some_and(|old| old.position == vertex.position && old.tangent == vertex.tangent);
        if unchanged {
            continue;
        }
        let dangling = vertex
            .slots
            .iter()
            .flatten()
            .chain(vertex.junction.as_ref().map(|j| &j.master))
            .find_map(|r| match r {
                TrackRef::Persisted(id) => Some(*id),
                TrackRef::Staged(_) => None,
            });
        if let Some(id) = dangling {
            return Err(CommitRejection::DanglingReference(id));
        }
    }
    for id in uow.retired_vertices() {
        if let Some(old) = world.find_vertex(*id)
            && let Some(track) = old.track_ids().find(|t| uow.find_track(*t).is_none())
        {
            return Err(CommitRejection::DanglingReference(track));
        }
    }

    let new_vertices = uow.vertices().filter(|(_, v)| v.origin.is_none()).count() as u64;
    let new_tracks = uow.tracks().filter(|(_, t)| t.origin.is_none()).count() as u64;
    let first_vertex = world.counters().peek_vertex_id().0;
    let first_track = world.counters().peek_track_id().0;
    if let Some(id) = (first_vertex..first_vertex + new_vertices)
        .map(VertexId)
        .find(|id| world.find_vertex(*id).is_some())
    {
        return Err(CommitRejection::IdCollision(id.to_string()));
    }
    if let Some(id) = (first_track..first_track + new_tracks)
        .map(TrackId)
        .find(|id| world.find_track(*id).is_some())
    {
        return Err(CommitRejection::IdCollision(id.to_string()));
    }

    let all: Vec<VertexHandle> = uow.vertices().map(|(h, _)| h).collect();
    check_continuity(uow, &all, tolerance).map_err(|failure| match failure {
        EditFailure::ContinuityBroken { detail } => CommitRejection::Discontinuous(detail),
        other => CommitRejection::Discontinuous(other.to_string()),
    })
}

/// Vergibt IDs für neue Records und baut die Schreibliste.
///
/// Unveränderte importierte Records werden übersprungen.
fn build_patch(uow: &UnitOfWork, world: &mut World) -> (CommitPatch, CommitReport) {
    let mut report = CommitReport::default();
    for (handle, vertex) in uow.vertices() {
        let id = match vertex.origin {
            Some(id) => id,
            None => world.counters_mut().next_vertex_id(),
        };
        report.vertex_ids.insert(handle, id);
    }
    for (handle, track) in uow.tracks() {
        let id = match track.origin {
            Some(id) => id,
            None => world.counters_mut().next_track_id(),
        };
        report.track_ids.insert(handle, id);
    }

    let track_id = |r: TrackRef| match r {
        TrackRef::Staged(handle) => report.track_ids[&handle],
        TrackRef::Persisted(id) => id,
    };

    let mut patch = CommitPatch::default();
    let mut created = [0usize; 2];
    let mut updated = [0usize; 2];
    for (handle, record) in uow.vertices() {
        let vertex = Vertex {
            id: report.vertex_ids[&handle],
            position: record.position,
            tangent: record.tangent,
            tracks: record.slots.map(|slot| slot.map(track_id)),
            junction: record.junction.map(|j| Junction {
                master: track_id(j.master),
                parameter: j.parameter,
            }),
        };
        match record.origin.and_then(|id| world.find_vertex(id)) {
            Some(old) if *old == vertex => continue,
            Some(_) => updated[0] += 1,
            None => created[0] += 1,
        }
        patch.vertices.push(vertex);
    }
    for (handle, record) in uow.tracks() {
        let track = Track {
            id: report.track_ids[&handle],
            vertices: record.vertices.map(|v| report.vertex_ids[&v]),
            shape: record.shape,
        };
        match record.origin.and_then(|id| world.find_track(id)) {
            Some(old) if *old == track => continue,
            Some(_) => updated[1] += 1,
            None => created[1] += 1,
        }
        patch.tracks.push(track);
    }
    patch.removed = uow.retired_vertices().to_vec();

    report.created_vertices = created[0];
    report.created_tracks = created[1];
    report.updated_vertices = updated[0];
    report.updated_tracks = updated[1];
    report.removed_vertices = patch.removed.len();
    (patch, report)
}

/// Führt `write` auf einer Kopie der Welt aus und ersetzt die Welt nur bei Erfolg.
fn on_staged_copy<R>(
    world: &mut World,
    write: impl FnOnce(&mut World) -> Result<R, CommitError>,
) -> Result<R, CommitError> {
    let mut staged = world.clone();
    let result = write(&mut staged)?;
    staged.ensure_spatial_index();
    *world = staged;
    Ok(result)
}

/// Schreibt eine Schreibliste. Bricht beim ersten Fehler ab.
pub(crate) fn apply_patch(world: &mut World, patch: CommitPatch) -> Result<(), CommitError> {
    let mut applied = 0;
    let partial = |applied, source| CommitError::WriteFailed { applied, source };
    for vertex in patch.vertices {
        world.write_vertex(vertex).map_err(|e| partial(applied, e))?;
        applied += 1;
    }
    for track in patch.tracks {
        world.write_track(track).map_err(|e| partial(applied, e))?;
        applied += 1;
    }
    for id in patch.removed {
        world.remove_vertex(id).map_err(|e| partial(applied, e))?;
        applied += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TrackShape, WorldBounds};
    use crate::edit::bridge::ImportBridge;
    use crate::edit::topology::apply_shape;
    use crate::error::WorldWriteError;
    use glam::DVec2;

    fn world() -> World {
        World::new(WorldBounds::centered(100.0), 10.0)
    }

    fn straight_uow(a: DVec2, b: DVec2) -> UnitOfWork {
        let mut uow = UnitOfWork::new();
        let va = uow.add_vertex(a, 0.0);
        let vb = uow.add_vertex(b, 0.0);
        let shape = TrackShape::Straight { from: a, to: b };
        let t = uow.add_track([va, vb], shape);
        apply_shape(&mut uow, t, shape);
        uow
    }

    #[test]
    fn new_records_get_fresh_ids() {
        let mut world = world();
        let uow = straight_uow(DVec2::ZERO, DVec2::new(10.0, 0.0));
        let report = commit(&uow, &mut world, &Tolerance::default()).expect("Commit");

        assert_eq!(report.created_vertices, 2);
        assert_eq!(report.created_tracks, 1);
        assert_eq!(world.vertex_count(), 2);
        let track = world.find_track(TrackId(1)).expect("T1");
        assert_eq!(track.vertices, [VertexId(1), VertexId(2)]);
        let v2 = world.find_vertex(VertexId(2)).expect("V2");
        assert_eq!(v2.tracks, [Some(TrackId(1)), None]);
        assert_eq!(world.nearest_vertex(DVec2::new(9.0, 1.0)).map(|m| m.vertex_id), Some(VertexId(2)));
    }

    #[test]
    fn reimported_unchanged_records_are_skipped() {
        let mut world = world();
        commit(
            &straight_uow(DVec2::ZERO, DVec2::new(10.0, 0.0)),
            &mut world,
            &Tolerance::default(),
        )
        .expect("Commit");

        let bridge = ImportBridge::new(&world);
        let mut uow = UnitOfWork::new();
        bridge.import_track(&mut uow, TrackId(1)).expect("T1");
        let report = commit(&uow, &mut world, &Tolerance::default()).expect("Commit");
        assert_eq!(report.written(), 0);
    }

    #[test]
    fn out_of_bounds_vertex_rejects_without_writing() {
        let mut world = world();
        let uow = straight_uow(DVec2::ZERO, DVec2::new(150.0, 0.0));
        let err = commit(&uow, &mut world, &Tolerance::default()).expect_err("Ablehnung");
        assert!(err.is_retry_safe());
        assert!(matches!(
            err,
            CommitError::Rejected(CommitRejection::OutOfBounds { .. })
        ));
        assert_eq!(world.vertex_count(), 0);
        assert_eq!(world.counters().peek_vertex_id(), VertexId(1));
    }

    #[test]
    fn discontinuous_state_is_rejected() {
        let mut world = world();
        let mut uow = straight_uow(DVec2::ZERO, DVec2::new(10.0, 0.0));
        let (b, _) = uow.vertices().nth(1).expect("b");
        uow.vertex_mut(b).position = DVec2::new(12.0, 0.0);
        let err = commit(&uow, &mut world, &Tolerance::default()).expect_err("Ablehnung");
        assert!(matches!(
            err,
            CommitError::Rejected(CommitRejection::Discontinuous(_))
        ));
    }

    fn broken_patch() -> CommitPatch {
        CommitPatch {
            vertices: vec![Vertex {
                id: VertexId(3),
                position: DVec2::new(20.0, 0.0),
                tangent: 0.0,
                tracks: [Some(TrackId(2)), None],
                junction: None,
            }],
            tracks: vec![Track {
                id: TrackId(2),
                vertices: [VertexId(3), VertexId(9)],
                shape: TrackShape::Straight {
                    from: DVec2::new(20.0, 0.0),
                    to: DVec2::new(30.0, 0.0),
                },
            }],
            removed: Vec::new(),
        }
    }

    #[test]
    fn write_error_mid_patch_stops_at_first_failure() {
        let mut world = world();
        let err = apply_patch(&mut world, broken_patch()).expect_err("Abbruch erwartet");
        assert!(!err.is_retry_safe());
        assert_eq!(
            err,
            CommitError::WriteFailed {
                applied: 1,
                source: WorldWriteError::MissingVertex {
                    track: TrackId(2),
                    vertex: VertexId(9)
                }
            }
        );
    }

    #[test]
    fn write_error_mid_patch_leaves_world_unchanged() {
        let mut world = world();
        commit(
            &straight_uow(DVec2::ZERO, DVec2::new(10.0, 0.0)),
            &mut world,
            &Tolerance::default(),
        )
        .expect("Commit");
        let next_vertex = world.counters().peek_vertex_id();
        let next_track = world.counters().peek_track_id();

        let result = on_staged_copy(&mut world, |staged| {
            staged.counters_mut().next_vertex_id();
            staged.counters_mut().next_track_id();
            apply_patch(staged, broken_patch())
        });
        assert!(matches!(result, Err(CommitError::WriteFailed { applied: 1, .. })));

        // Der bereits geschriebene Vertex der Kopie ist nicht sichtbar
        assert_eq!(world.vertex_count(), 2);
        assert_eq!(world.track_count(), 1);
        assert!(world.find_vertex(VertexId(3)).is_none());
        assert_eq!(world.counters().peek_vertex_id(), next_vertex);
        assert_eq!(world.counters().peek_track_id(), next_track);
        assert_eq!(
            world.nearest_vertex(DVec2::new(19.0, 0.0)).map(|m| m.vertex_id),
            Some(VertexId(2))
        );
    }
}
