//! Die Bearbeitungen als Regelwerke.
//!
//! Jedes Untermodul liefert ein [`RuleSet`] mit seinen Cases. Die
//! Registrierungs-Reihenfolge der Regeln ist zugleich der Tie-Break.

pub mod bind;
pub mod convert;
pub mod create;
pub mod extend;
pub mod junction;
pub mod move_vertex;
pub mod snap;

use super::records::{TrackHandle, VertexHandle};
use super::rules::{EditContext, RuleSet};
use super::topology::{Anchor, rederive_junctions};
use super::unit_of_work::UnitOfWork;
use crate::error::EditFailure;
use crate::geometry::{Tolerance, direction, opposite};

/// Alle Regelwerke einer Sitzung.
pub struct RuleBook {
    pub create: RuleSet<[VertexHandle; 2]>,
    pub extend: RuleSet<TrackHandle>,
    pub move_vertex: RuleSet<()>,
    pub convert: RuleSet<()>,
    pub bind: RuleSet<TrackHandle>,
    pub snap: RuleSet<()>,
    pub junction: RuleSet<VertexHandle>,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            create: create::rules(),
            extend: extend::rules(),
            move_vertex: move_vertex::rules(),
            convert: convert::rules(),
            bind: bind::rules(),
            snap: snap::rules(),
            junction: junction::rules(),
        }
    }
}

/// Abfahrts-Richtung eines verankerten Slots.
pub(crate) fn fixed_heading(
    uow: &UnitOfWork,
    ctx: &EditContext,
    slot: usize,
) -> Result<f64, EditFailure> {
    match ctx.anchor(uow, slot) {
        Anchor::Fixed(heading) => Ok(heading),
        Anchor::Unresolved => Err(EditFailure::MissingContext {
            reason: "Nachbar-Track nicht importiert",
        }),
        Anchor::Free => Err(EditFailure::infeasible("Vertex gibt keine Richtung vor")),
    }
}

/// Eigene Tangente eines Vertex als Anker für `track`, ausgerichtet wie die
/// bisherige Abfahrt in den Track.
pub(crate) fn pinned_anchor(uow: &UnitOfWork, vertex: VertexHandle, track: TrackHandle) -> Anchor {
    let record = uow.track(track);
    let Some(end) = record.end_of(vertex) else {
        return Anchor::Unresolved;
    };
    let outward = record.shape.outward_heading(end);
    let tangent = uow.vertex(vertex).tangent;
    if direction(tangent).dot(direction(outward)) >= 0.0 {
        Anchor::Fixed(tangent)
    } else {
        Anchor::Fixed(opposite(tangent))
    }
}

/// Leitet die Junctions auf allen gegebenen Tracks neu ab.
pub(crate) fn settle(
    uow: &mut UnitOfWork,
    tracks: &[TrackHandle],
    tolerance: &Tolerance,
) -> Result<(), EditFailure> {
    for track in tracks {
        rederive_junctions(uow, *track, tolerance)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support;
