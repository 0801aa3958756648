//! Arbeitskopien von Vertices und Tracks innerhalb einer Unit of Work.

use super::arena::Handle;
use super::reverter::Snapshotable;
use crate::core::{TrackId, TrackKind, TrackShape, VertexId};
use glam::DVec2;

pub type VertexHandle = Handle<VertexRecord>;
pub type TrackHandle = Handle<TrackRecord>;

/// Verweis eines Vertex-Slots auf einen Track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackRef {
    /// Track liegt bereits in der Unit of Work
    Staged(TrackHandle),
    /// Nur die ID ist bekannt; der Track wurde noch nicht importiert
    Persisted(TrackId),
}

impl TrackRef {
    pub fn staged(&self) -> Option<TrackHandle> {
        match self {
            TrackRef::Staged(handle) => Some(*handle),
            TrackRef::Persisted(_) => None,
        }
    }
}

/// Bindung eines Junction-Vertex an seinen Master-Track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JunctionBinding {
    pub master: TrackRef,
    pub parameter: f64,
}

/// Arbeitskopie eines Vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRecord {
    /// Persistente ID bei importierten Records, `None` bei neuen
    pub origin: Option<VertexId>,
    pub position: DVec2,
    pub tangent: f64,
    pub slots: [Option<TrackRef>; 2],
    pub junction: Option<JunctionBinding>,
}

impl VertexRecord {
    /// Neuer, freier Vertex.
    pub fn new(position: DVec2, tangent: f64) -> Self {
        Self {
            origin: None,
            position,
            tangent,
            slots: [None, None],
            junction: None,
        }
    }

    pub fn track_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_junction(&self) -> bool {
        self.junction.is_some()
    }

    /// Bereits importierte Tracks an diesem Vertex.
    pub fn staged_tracks(&self) -> impl Iterator<Item = TrackHandle> + '_ {
        self.slots.iter().flatten().filter_map(TrackRef::staged)
    }

    /// `true` wenn ein Slot noch auf einen nicht importierten Track zeigt.
    pub fn has_unresolved(&self) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|r| matches!(r, TrackRef::Persisted(_)))
            || self
                .junction
                .is_some_and(|j| matches!(j.master, TrackRef::Persisted(_)))
    }

    /// Hängt einen Track an den ersten freien Slot.
    ///
    /// # Panics
    /// Wenn beide Slots belegt sind.
    pub fn attach(&mut self, track: TrackRef) {
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(track),
            None => panic!("Vertex hat bereits zwei Tracks"),
        }
    }

    /// Löst einen Track aus seinem Slot.
    pub fn detach(&mut self, track: TrackRef) {
        for slot in self.slots.iter_mut() {
            if *slot == Some(track) {
                *slot = None;
            }
        }
    }

    /// Ersetzt einen Verweis (z.B. ID-only → importiert).
    pub fn replace(&mut self, old: TrackRef, new: TrackRef) {
        for slot in self.slots.iter_mut().flatten() {
            if *slot == old {
                *slot = new;
            }
        }
        if let Some(binding) = self.junction.as_mut()
            && binding.master == old
        {
            binding.master = new;
        }
    }
}

/// Arbeitskopie eines Tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    pub origin: Option<TrackId>,
    pub vertices: [VertexHandle; 2],
    pub shape: TrackShape,
}

impl TrackRecord {
    pub fn kind(&self) -> TrackKind {
        self.shape.kind()
    }

    /// Index des Endes, an dem `vertex` liegt.
    pub fn end_of(&self, vertex: VertexHandle) -> Option<usize> {
        self.vertices.iter().position(|v| *v == vertex)
    }

    /// Vertex am anderen Ende.
    pub fn other_vertex(&self, vertex: VertexHandle) -> Option<VertexHandle> {
        self.end_of(vertex).map(|end| self.vertices[1 - end])
    }
}

// ── Mementos ───────────────────────────────────────────────────────────

/// Wert-Schnappschuss eines Vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexMemento {
    pub position: DVec2,
    pub tangent: f64,
    pub slots: [Option<TrackRef>; 2],
    pub junction_parameter: Option<f64>,
}

/// Wert-Schnappschuss eines Tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMemento {
    pub vertices: [VertexHandle; 2],
    pub shape: TrackShape,
}

impl Snapshotable for VertexRecord {
    type Memento = VertexMemento;

    fn snapshot(&self) -> VertexMemento {
        VertexMemento {
            position: self.position,
            tangent: self.tangent,
            slots: self.slots,
            junction_parameter: self.junction.map(|j| j.parameter),
        }
    }

    fn restore(&mut self, memento: &VertexMemento) {
        self.position = memento.position;
        self.tangent = memento.tangent;
        self.slots = memento.slots;
        if let (Some(binding), Some(parameter)) = (self.junction.as_mut(), memento.junction_parameter)
        {
            binding.parameter = parameter;
        }
    }
}

impl Snapshotable for TrackRecord {
    type Memento = TrackMemento;

    fn snapshot(&self) -> TrackMemento {
        TrackMemento {
            vertices: self.vertices,
            shape: self.shape,
        }
    }

    fn restore(&mut self, memento: &TrackMemento) {
        self.vertices = memento.vertices;
        self.shape = memento.shape;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::arena::Arena;

    #[test]
    #[should_panic(expected = "bereits zwei Tracks")]
    fn third_track_on_vertex_panics() {
        let mut vertex = VertexRecord::new(DVec2::ZERO, 0.0);
        vertex.attach(TrackRef::Persisted(TrackId(1)));
        vertex.attach(TrackRef::Persisted(TrackId(2)));
        vertex.attach(TrackRef::Persisted(TrackId(3)));
    }

    #[test]
    fn replace_rewrites_slots_and_junction_binding() {
        let mut vertex = VertexRecord::new(DVec2::ZERO, 0.0);
        vertex.attach(TrackRef::Persisted(TrackId(4)));
        vertex.junction = Some(JunctionBinding {
            master: TrackRef::Persisted(TrackId(4)),
            parameter: 0.5,
        });
        assert!(vertex.has_unresolved());

        let mut vertices = Arena::<VertexRecord>::new();
        let a = vertices.insert(VertexRecord::new(DVec2::ZERO, 0.0));
        let b = vertices.insert(VertexRecord::new(DVec2::X, 0.0));
        let mut tracks = Arena::<TrackRecord>::new();
        let handle = tracks.insert(TrackRecord {
            origin: Some(TrackId(4)),
            vertices: [a, b],
            shape: TrackShape::Straight {
                from: DVec2::ZERO,
                to: DVec2::X,
            },
        });
        vertex.replace(TrackRef::Persisted(TrackId(4)), TrackRef::Staged(handle));
        assert!(!vertex.has_unresolved());
        assert_eq!(vertex.staged_tracks().collect::<Vec<_>>(), vec![handle]);
    }

    #[test]
    fn memento_restores_geometry_and_slots() {
        let mut vertex = VertexRecord::new(DVec2::new(1.0, 2.0), 0.3);
        let memento = vertex.snapshot();
        vertex.position = DVec2::new(9.0, 9.0);
        vertex.tangent = 1.0;
        vertex.attach(TrackRef::Persisted(TrackId(1)));
        vertex.restore(&memento);
        assert_eq!(vertex, VertexRecord::new(DVec2::new(1.0, 2.0), 0.3));
    }
}
