//! Memento-basierter Rollback.

use super::records::{TrackHandle, TrackRecord, VertexHandle, VertexRecord};
use super::topology::check_continuity;
use super::unit_of_work::UnitOfWork;
use crate::error::EditFailure;
use crate::geometry::Tolerance;
use indexmap::IndexSet;

/// Typen, deren leichtgewichtiger Zustand gesichert und wiederhergestellt werden kann.
pub trait Snapshotable {
    type Memento: Clone;

    fn snapshot(&self) -> Self::Memento;
    fn restore(&mut self, memento: &Self::Memento);
}

/// Sammelt Mementos in Erfassungs-Reihenfolge.
pub struct Reverter<K, T: Snapshotable> {
    entries: Vec<(K, T::Memento)>,
}

impl<K, T: Snapshotable> Default for Reverter<K, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Copy + PartialEq, T: Snapshotable> Reverter<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sichert den Zustand von `value` unter `key`; zweite Erfassung wird ignoriert.
    pub fn capture(&mut self, key: K, value: &T) {
        if !self.entries.iter().any(|(k, _)| *k == key) {
            self.entries.push((key, value.snapshot()));
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Übergibt alle Mementos in Erfassungs-Reihenfolge an `restore`.
    pub fn restore_all(&self, mut restore: impl FnMut(K, &T::Memento)) {
        for (key, memento) in &self.entries {
            restore(*key, memento);
        }
    }
}

/// Reverter über alle Vertex- und Track-Records einer Unit of Work.
pub struct RecordReverter {
    vertices: Reverter<VertexHandle, VertexRecord>,
    tracks: Reverter<TrackHandle, TrackRecord>,
    watermarks: (usize, usize),
}

impl RecordReverter {
    /// Beginnt eine Erfassung; Records, die danach angelegt werden, gelten als neu.
    pub fn begin(uow: &UnitOfWork) -> Self {
        Self {
            vertices: Reverter::new(),
            tracks: Reverter::new(),
            watermarks: uow.watermarks(),
        }
    }

    pub fn capture_vertex(&mut self, uow: &UnitOfWork, handle: VertexHandle) {
        if let Some(record) = uow.get_vertex(handle) {
            self.vertices.capture(handle, record);
        }
    }

    pub fn capture_track(&mut self, uow: &UnitOfWork, handle: TrackHandle) {
        if let Some(record) = uow.get_track(handle) {
            self.tracks.capture(handle, record);
        }
    }

    /// Sichert einen Vertex und alles, was eine Operation an ihm verändern kann:
    /// Tracks bis zur zweiten Nachbarschaft, deren Vertices sowie Junctions
    /// auf diesen Tracks mit ihren Abzweigen.
    pub fn capture_around(&mut self, uow: &UnitOfWork, vertex: VertexHandle) {
        let mut vertices: IndexSet<VertexHandle> = IndexSet::new();
        let mut tracks: IndexSet<TrackHandle> = IndexSet::new();
        vertices.insert(vertex);

        for _ in 0..2 {
            let frontier: Vec<VertexHandle> = vertices.iter().copied().collect();
            for v in frontier {
                let Some(record) = uow.get_vertex(v) else {
                    continue;
                };
                for track in record.staged_tracks() {
                    if tracks.insert(track) {
                        vertices.extend(uow.track(track).vertices);
                    }
                }
            }
        }
        let mut junction_tracks = Vec::new();
        for track in tracks.iter().copied() {
            for junction in uow.junctions_on(track) {
                vertices.insert(junction);
                for branch in uow.vertex(junction).staged_tracks() {
                    junction_tracks.push(branch);
                    vertices.extend(uow.track(branch).vertices);
                }
            }
        }
        tracks.extend(junction_tracks);

        for v in vertices {
            self.capture_vertex(uow, v);
        }
        for t in tracks {
            self.capture_track(uow, t);
        }
    }

    /// Alle erfassten und seitdem neu angelegten Vertices.
    pub fn touched_vertices(&self, uow: &UnitOfWork) -> Vec<VertexHandle> {
        let mut touched: Vec<VertexHandle> = self
            .vertices
            .keys()
            .filter(|v| uow.contains_vertex(*v))
            .collect();
        touched.extend(uow.vertices_after(self.watermarks.0));
        touched
    }

    /// Stellt jeden erfassten Record wieder her und verwirft neu angelegte.
    pub fn rollback(&self, uow: &mut UnitOfWork) {
        uow.discard_after(self.watermarks);
        self.vertices.restore_all(|handle, memento| {
            if let Some(record) = uow.get_vertex_mut(handle) {
                record.restore(memento);
            }
        });
        self.tracks.restore_all(|handle, memento| {
            if let Some(record) = uow.get_track_mut(handle) {
                record.restore(memento);
            }
        });
        log::debug!(
            "Rollback: {} Vertices, {} Tracks wiederhergestellt",
            self.vertices.len(),
            self.tracks.len()
        );
    }
}

/// Führt `body` geschützt aus.
///
/// Vor dem Aufruf wird die Umgebung jedes Vertex in `scope` gesichert. Liefert
/// `body` einen Fehler oder verletzt der Endzustand die Tangenten-Stetigkeit,
/// werden alle Mementos wiederhergestellt und der Fehler gemeldet.
pub fn guarded<T>(
    uow: &mut UnitOfWork,
    scope: &[VertexHandle],
    tolerance: &Tolerance,
    body: impl FnOnce(&mut UnitOfWork) -> Result<T, EditFailure>,
) -> Result<T, EditFailure> {
    let mut reverter = RecordReverter::begin(uow);
    for vertex in scope {
        reverter.capture_around(uow, *vertex);
    }

    let result = body(uow).and_then(|value| {
        let touched = reverter.touched_vertices(uow);
        check_continuity(uow, &touched, tolerance).map(|()| value)
    });

    if let Err(failure) = &result {
        log::warn!("Bearbeitung zurueckgerollt: {failure}");
        reverter.rollback(uow);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TrackShape;
    use glam::DVec2;

    #[test]
    fn generic_reverter_restores_in_capture_order() {
        #[derive(Debug, PartialEq)]
        struct Counter(i32);
        impl Snapshotable for Counter {
            type Memento = i32;
            fn snapshot(&self) -> i32 {
                self.0
            }
            fn restore(&mut self, memento: &i32) {
                self.0 = *memento;
            }
        }

        let mut values = vec![Counter(1), Counter(2)];
        let mut reverter: Reverter<usize, Counter> = Reverter::new();
        reverter.capture(0, &values[0]);
        reverter.capture(1, &values[1]);
        values[0].0 = 10;
        reverter.capture(0, &values[0]);
        values[0].0 = 20;
        values[1].0 = 30;

        let mut order = Vec::new();
        reverter.restore_all(|k, memento| {
            order.push(k);
            values[k].restore(memento);
        });
        assert_eq!(order, vec![0, 1]);
        assert_eq!(values, vec![Counter(1), Counter(2)]);
    }

    #[test]
    fn guarded_failure_restores_records_and_drops_new_ones() {
        let mut uow = UnitOfWork::new();
        let a = uow.add_vertex(DVec2::ZERO, 0.0);
        let b = uow.add_vertex(DVec2::new(10.0, 0.0), 0.0);
        uow.add_track(
            [a, b],
            TrackShape::Straight {
                from: DVec2::ZERO,
                to: DVec2::new(10.0, 0.0),
            },
        );
        let before = uow.clone();

        let result: Result<(), EditFailure> = guarded(&mut uow, &[b], &Tolerance::default(), |uow| {
            uow.vertex_mut(b).position = DVec2::new(50.0, 50.0);
            let c = uow.add_vertex(DVec2::new(60.0, 0.0), 0.0);
            uow.vertex_mut(c).tangent = 1.0;
            Err(EditFailure::infeasible("Test"))
        });

        assert!(result.is_err());
        assert_eq!(uow.vertex(b), before.vertex(b));
        assert_eq!(uow.vertex_count(), 2);
    }

    #[test]
    fn guarded_postcondition_catches_endpoint_drift() {
        let mut uow = UnitOfWork::new();
        let a = uow.add_vertex(DVec2::ZERO, 0.0);
        let b = uow.add_vertex(DVec2::new(10.0, 0.0), 0.0);
        uow.add_track(
            [a, b],
            TrackShape::Straight {
                from: DVec2::ZERO,
                to: DVec2::new(10.0, 0.0),
            },
        );

        let result = guarded(&mut uow, &[b], &Tolerance::default(), |uow| {
            // Vertex verschoben, Track nicht nachgeführt
            uow.vertex_mut(b).position = DVec2::new(12.0, 0.0);
            Ok(())
        });

        assert!(matches!(result, Err(EditFailure::ContinuityBroken { .. })));
        assert_eq!(uow.vertex(b).position, DVec2::new(10.0, 0.0));
    }
}
