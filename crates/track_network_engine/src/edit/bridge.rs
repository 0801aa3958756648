//! Import-Bridge: einzige Komponente, die die Welt liest.
//!
//! Holt persistierte Records als Arbeitskopien in die Unit of Work und ersetzt
//! dabei ID-only-Verweise, sodass die referenzielle Integrität vor jeder
//! Operation wiederhergestellt ist.

use super::records::{JunctionBinding, TrackHandle, TrackRecord, TrackRef, VertexHandle, VertexRecord};
use super::rules::{EditContext, Endpoint};
use super::unit_of_work::UnitOfWork;
use crate::core::{TrackId, VertexId, World};

/// Lesender Zugriff auf die Welt für eine Unit of Work.
#[derive(Debug, Clone, Copy)]
pub struct ImportBridge<'w> {
    world: &'w World,
}

impl<'w> ImportBridge<'w> {
    pub fn new(world: &'w World) -> Self {
        Self { world }
    }

    pub fn world(&self) -> &'w World {
        self.world
    }

    /// Importiert einen Vertex (idempotent).
    pub fn import_vertex(&self, uow: &mut UnitOfWork, id: VertexId) -> Option<VertexHandle> {
        if let Some(handle) = uow.find_vertex(id) {
            return Some(handle);
        }
        if uow.retired_vertices().contains(&id) {
            return None;
        }
        let vertex = self.world.find_vertex(id)?;

        let to_ref = |track: TrackId| match uow.find_track(track) {
            Some(handle) => TrackRef::Staged(handle),
            None => TrackRef::Persisted(track),
        };
        let record = VertexRecord {
            origin: Some(id),
            position: vertex.position,
            tangent: vertex.tangent,
            slots: vertex.tracks.map(|slot| slot.map(to_ref)),
            junction: vertex.junction.map(|j| JunctionBinding {
                master: to_ref(j.master),
                parameter: j.parameter,
            }),
        };
        log::debug!("Vertex {id} importiert");
        Some(uow.insert_imported_vertex(record))
    }

    /// Importiert einen Track samt beiden Endpunkten (idempotent).
    pub fn import_track(&self, uow: &mut UnitOfWork, id: TrackId) -> Option<TrackHandle> {
        if let Some(handle) = uow.find_track(id) {
            return Some(handle);
        }
        let track = self.world.find_track(id)?;
        let a = self.import_vertex(uow, track.vertices[0])?;
        let b = self.import_vertex(uow, track.vertices[1])?;
        let handle = uow.insert_imported_track(TrackRecord {
            origin: Some(id),
            vertices: [a, b],
            shape: track.shape,
        });
        log::debug!("Track {id} importiert");
        Some(handle)
    }

    /// Importiert die Nachbarschaft eines Vertex.
    ///
    /// Umfasst alle Tracks des Vertex, die Tracks der gegenüberliegenden
    /// Vertices, den Master-Track einer Junction sowie alle Junctions (mit
    /// Abzweig-Tracks) auf den importierten Tracks.
    pub fn import_neighborhood(&self, uow: &mut UnitOfWork, vertex: VertexHandle) {
        let mut tracks: Vec<TrackHandle> = Vec::new();
        for track in self.import_tracks_of(uow, vertex) {
            tracks.push(track);
            if let Some(far) = uow.track(track).other_vertex(vertex) {
                tracks.extend(self.import_tracks_of(uow, far));
            }
        }
        if let Some(binding) = uow.vertex(vertex).junction
            && let TrackRef::Persisted(master) = binding.master
            && let Some(master) = self.import_track(uow, master)
        {
            tracks.push(master);
        }

        for track in tracks {
            let Some(id) = uow.track(track).origin else {
                continue;
            };
            for junction in self.world.junctions_on(id) {
                if let Some(handle) = self.import_vertex(uow, junction) {
                    self.import_tracks_of(uow, handle);
                }
            }
        }
    }

    /// Stellt die Integrität für einen Bearbeitungs-Kontext her.
    pub fn resolve_context(&self, uow: &mut UnitOfWork, ctx: &EditContext) {
        for endpoint in &ctx.vertices {
            if let Endpoint::Existing(handle) = endpoint
                && uow.contains_vertex(*handle)
            {
                self.import_neighborhood(uow, *handle);
            }
        }
        for track in &ctx.tracks {
            if !uow.contains_track(*track) {
                continue;
            }
            for vertex in uow.track(*track).vertices {
                self.import_neighborhood(uow, vertex);
            }
        }
    }

    fn import_tracks_of(&self, uow: &mut UnitOfWork, vertex: VertexHandle) -> Vec<TrackHandle> {
        let slots = uow.vertex(vertex).slots;
        slots
            .into_iter()
            .flatten()
            .filter_map(|slot| match slot {
                TrackRef::Staged(handle) => Some(handle),
                TrackRef::Persisted(id) => self.import_track(uow, id),
            })
            .collect()
    }
}
