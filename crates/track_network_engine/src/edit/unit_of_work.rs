//! Unit of Work: geordnete Arbeitskopien aller von einer Bearbeitung berührten Records.

use super::arena::Arena;
use super::records::{TrackHandle, TrackRecord, TrackRef, VertexHandle, VertexRecord};
use crate::core::{TrackId, TrackShape, VertexId};
use glam::DVec2;
use indexmap::IndexMap;

/// Transaktionale Arbeitskopie eines Teils des Gleisnetzes.
///
/// Jeder Track verweist nur auf Vertices derselben Unit of Work.
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
    vertices: Arena<VertexRecord>,
    tracks: Arena<TrackRecord>,
    imported_vertices: IndexMap<VertexId, VertexHandle>,
    imported_tracks: IndexMap<TrackId, TrackHandle>,
    retired_vertices: Vec<VertexId>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Legt einen neuen, freien Vertex an.
    pub fn add_vertex(&mut self, position: DVec2, tangent: f64) -> VertexHandle {
        self.vertices.insert(VertexRecord::new(position, tangent))
    }

    /// Legt einen neuen Track an und hängt ihn an beide Vertices.
    ///
    /// # Panics
    /// Wenn ein Vertex nicht in dieser Unit of Work liegt oder bereits zwei
    /// Tracks trägt.
    pub fn add_track(&mut self, vertices: [VertexHandle; 2], shape: TrackShape) -> TrackHandle {
        assert!(
            vertices[0] != vertices[1],
            "Track braucht zwei verschiedene Vertices"
        );
        let handle = self.tracks.insert(TrackRecord {
            origin: None,
            vertices,
            shape,
        });
        for vertex in vertices {
            self.vertices[vertex].attach(TrackRef::Staged(handle));
        }
        handle
    }

    /// Übernimmt einen importierten Vertex.
    pub(crate) fn insert_imported_vertex(&mut self, record: VertexRecord) -> VertexHandle {
        let id = record.origin;
        let handle = self.vertices.insert(record);
        if let Some(id) = id {
            self.imported_vertices.insert(id, handle);
        }
        handle
    }

    /// Übernimmt einen importierten Track und ersetzt alle ID-only-Verweise auf ihn.
    pub(crate) fn insert_imported_track(&mut self, record: TrackRecord) -> TrackHandle {
        let id = record.origin;
        let handle = self.tracks.insert(record);
        if let Some(id) = id {
            self.imported_tracks.insert(id, handle);
            let old = TrackRef::Persisted(id);
            let new = TrackRef::Staged(handle);
            for vertex in self.vertices.handles() {
                self.vertices[vertex].replace(old, new);
            }
        }
        handle
    }

    /// Handle eines importierten Vertex.
    pub fn find_vertex(&self, id: VertexId) -> Option<VertexHandle> {
        self.imported_vertices.get(&id).copied()
    }

    /// Handle eines importierten Tracks.
    pub fn find_track(&self, id: TrackId) -> Option<TrackHandle> {
        self.imported_tracks.get(&id).copied()
    }

    pub fn vertex(&self, handle: VertexHandle) -> &VertexRecord {
        &self.vertices[handle]
    }

    pub fn vertex_mut(&mut self, handle: VertexHandle) -> &mut VertexRecord {
        &mut self.vertices[handle]
    }

    pub fn track(&self, handle: TrackHandle) -> &TrackRecord {
        &self.tracks[handle]
    }

    pub fn track_mut(&mut self, handle: TrackHandle) -> &mut TrackRecord {
        &mut self.tracks[handle]
    }

    pub fn get_vertex(&self, handle: VertexHandle) -> Option<&VertexRecord> {
        self.vertices.get(handle)
    }

    pub fn get_track(&self, handle: TrackHandle) -> Option<&TrackRecord> {
        self.tracks.get(handle)
    }

    pub fn get_vertex_mut(&mut self, handle: VertexHandle) -> Option<&mut VertexRecord> {
        self.vertices.get_mut(handle)
    }

    pub fn get_track_mut(&mut self, handle: TrackHandle) -> Option<&mut TrackRecord> {
        self.tracks.get_mut(handle)
    }

    pub fn contains_vertex(&self, handle: VertexHandle) -> bool {
        self.vertices.contains(handle)
    }

    pub fn contains_track(&self, handle: TrackHandle) -> bool {
        self.tracks.contains(handle)
    }

    /// Vertices in Einfüge-Reihenfolge.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexHandle, &VertexRecord)> {
        self.vertices.iter()
    }

    /// Tracks in Einfüge-Reihenfolge.
    pub fn tracks(&self) -> impl Iterator<Item = (TrackHandle, &TrackRecord)> {
        self.tracks.iter()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.tracks.is_empty() && self.retired_vertices.is_empty()
    }

    /// Persistente IDs der beim Einrasten verschmolzenen Vertices.
    pub fn retired_vertices(&self) -> &[VertexId] {
        &self.retired_vertices
    }

    /// Löst einen Track-Verweis auf einen Record auf.
    pub fn resolve(&self, track: TrackRef) -> Option<TrackHandle> {
        match track {
            TrackRef::Staged(handle) => self.tracks.contains(handle).then_some(handle),
            TrackRef::Persisted(id) => self.find_track(id),
        }
    }

    /// Einziger Track eines offenen Vertex.
    pub fn sole_track(&self, vertex: VertexHandle) -> Option<TrackHandle> {
        let record = self.vertices.get(vertex)?;
        if record.track_count() != 1 {
            return None;
        }
        record.slots.iter().flatten().find_map(|r| self.resolve(*r))
    }

    /// Der andere Track an `vertex` (neben `excluding`).
    pub fn other_track(
        &self,
        vertex: VertexHandle,
        excluding: Option<TrackHandle>,
    ) -> Option<TrackRef> {
        self.vertex(vertex)
            .slots
            .iter()
            .flatten()
            .copied()
            .find(|r| excluding.is_none_or(|ex| self.resolve(*r) != Some(ex)))
    }

    /// Junctions, deren Master-Track `master` ist.
    pub fn junctions_on(&self, master: TrackHandle) -> Vec<VertexHandle> {
        self.vertices
            .iter()
            .filter(|(_, v)| {
                v.junction
                    .is_some_and(|j| self.resolve(j.master) == Some(master))
            })
            .map(|(h, _)| h)
            .collect()
    }

    /// Entfernt einen Vertex ohne Tracks aus der Unit of Work.
    ///
    /// Einzige Ausnahme von der Append-only-Mitgliedschaft: beim Einrasten
    /// verschmolzene Enden. Persistierte Vertices werden beim Commit gelöscht.
    ///
    /// # Panics
    /// Wenn der Vertex noch Tracks trägt.
    pub fn retire_vertex(&mut self, handle: VertexHandle) {
        assert_eq!(
            self.vertex(handle).track_count(),
            0,
            "nur Vertices ohne Tracks koennen entfernt werden"
        );
        if let Some(record) = self.vertices.remove(handle)
            && let Some(id) = record.origin
        {
            self.imported_vertices.shift_remove(&id);
            self.retired_vertices.push(id);
        }
    }

    // ── Rollback-Unterstützung ─────────────────────────────────────────

    pub(crate) fn watermarks(&self) -> (usize, usize) {
        (self.vertices.watermark(), self.tracks.watermark())
    }

    pub(crate) fn discard_after(&mut self, watermarks: (usize, usize)) {
        self.vertices.discard_after(watermarks.0);
        self.tracks.discard_after(watermarks.1);
    }

    pub(crate) fn vertices_after(&self, watermark: usize) -> Vec<VertexHandle> {
        self.vertices.handles_after(watermark)
    }
}
