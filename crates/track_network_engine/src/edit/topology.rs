//! Topologie-Hilfen: Anker an Track-Enden, Neuberechnung von Formen und
//! Stetigkeits-Prüfung.
//!
//! Richtungen an Track-Enden sind hier immer *Abfahrts*-Richtungen: die
//! Richtung, in der ein Track das Ende verlässt. Zwei Tracks an einem
//! geschlossenen Vertex haben entgegengesetzte Abfahrts-Richtungen.

use super::records::{TrackHandle, VertexHandle};
use super::unit_of_work::UnitOfWork;
use crate::core::{TrackKind, TrackShape};
use crate::error::EditFailure;
use crate::geometry::{
    Tolerance, arc_between_tangents, arc_from_heading, direction, free_curve, heading_of,
    opposite, same_heading, tangents_parallel,
};
use glam::DVec2;

/// Richtungsvorgabe an einem Track-Ende durch die Umgebung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Keine Vorgabe: freier oder offener Vertex
    Free,
    /// Abfahrts-Richtung ist vorgegeben
    Fixed(f64),
    /// Nachbar-Track ist noch nicht importiert
    Unresolved,
}

impl Anchor {
    pub fn heading(&self) -> Option<f64> {
        match self {
            Anchor::Fixed(heading) => Some(*heading),
            _ => None,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Anchor::Free)
    }
}

/// Anker eines Vertex für einen Track, der ihn verlässt.
///
/// `excluding` ist der Track, der gerade neu berechnet wird. Bei Junctions
/// zeigt `reference` grob in die gewünschte Abfahrts-Richtung und wählt
/// zwischen den beiden Richtungen der Master-Tangente.
pub fn anchor_heading(
    uow: &UnitOfWork,
    vertex: VertexHandle,
    excluding: Option<TrackHandle>,
    reference: DVec2,
) -> Anchor {
    let record = uow.vertex(vertex);
    if let Some(binding) = record.junction {
        if uow.resolve(binding.master).is_none() {
            return Anchor::Unresolved;
        }
        let axis = record.tangent;
        return if reference.dot(direction(axis)) >= 0.0 {
            Anchor::Fixed(axis)
        } else {
            Anchor::Fixed(opposite(axis))
        };
    }

    let Some(other) = uow.other_track(vertex, excluding) else {
        return Anchor::Free;
    };
    let Some(track) = uow.resolve(other) else {
        return Anchor::Unresolved;
    };
    let record = uow.track(track);
    match record.end_of(vertex) {
        Some(end) => Anchor::Fixed(opposite(record.shape.outward_heading(end))),
        None => Anchor::Unresolved,
    }
}

/// Ein Ende einer neu zu berechnenden Form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitEnd {
    pub position: DVec2,
    pub anchor: Anchor,
    /// Bisherige Abfahrts-Richtung, falls das Ende nicht verankert ist
    pub hint: Option<f64>,
}

impl FitEnd {
    pub fn free(position: DVec2) -> Self {
        Self {
            position,
            anchor: Anchor::Free,
            hint: None,
        }
    }

    fn preferred_heading(&self) -> Option<f64> {
        self.anchor.heading().or(self.hint)
    }
}

/// Berechnet eine Form vom Typ `kind` zwischen zwei Enden.
///
/// Verankerte Enden werden exakt eingehalten; passt keine Form des
/// gewünschten Typs, ist das Ergebnis `Infeasible` bzw. `TangentMismatch`.
pub fn fit_shape(
    kind: TrackKind,
    a: &FitEnd,
    b: &FitEnd,
    tolerance: &Tolerance,
) -> Result<TrackShape, EditFailure> {
    if a.anchor == Anchor::Unresolved || b.anchor == Anchor::Unresolved {
        return Err(EditFailure::MissingContext {
            reason: "Nachbar-Track nicht importiert",
        });
    }
    let chord = b.position - a.position;
    if chord.length() <= tolerance.linear {
        return Err(EditFailure::infeasible("Endpunkte fallen zusammen"));
    }

    match kind {
        TrackKind::Straight => {
            let heading = heading_of(chord);
            for (end, expected) in [(a, heading), (b, opposite(heading))] {
                if let Some(anchor) = end.anchor.heading()
                    && !same_heading(anchor, expected, tolerance.angular)
                {
                    return Err(EditFailure::TangentMismatch {
                        x: end.position.x,
                        y: end.position.y,
                    });
                }
            }
            Ok(TrackShape::Straight {
                from: a.position,
                to: b.position,
            })
        }
        TrackKind::Curved => {
            let (pa, pb) = (a.position, b.position);
            let segment = match (a.anchor.heading(), b.anchor.heading()) {
                (Some(ha), Some(hb)) => arc_between_tangents(pa, ha, pb, opposite(hb), tolerance),
                (Some(ha), None) => arc_from_heading(pa, ha, pb, tolerance),
                (None, Some(hb)) => arc_from_heading(pb, hb, pa, tolerance).map(|s| s.reversed()),
                (None, None) => match (a.hint, b.hint) {
                    (Some(ha), _) => arc_from_heading(pa, ha, pb, tolerance),
                    (None, Some(hb)) => {
                        arc_from_heading(pb, hb, pa, tolerance).map(|s| s.reversed())
                    }
                    (None, None) => None,
                },
            };
            segment
                .map(TrackShape::from_segment)
                .ok_or(EditFailure::infeasible("kein Einzelbogen zwischen den Enden"))
        }
        TrackKind::Free => {
            let ha = a.preferred_heading().unwrap_or(heading_of(chord));
            let hb = b.preferred_heading().unwrap_or(heading_of(-chord));
            free_curve(a.position, ha, b.position, opposite(hb), tolerance)
                .map(TrackShape::Free)
                .ok_or(EditFailure::infeasible("kein Doppelbogen zwischen den Enden"))
        }
    }
}

/// Schreibt eine neue Form und führt die Tangenten der Endpunkte nach.
///
/// Junction-Tangenten gehören dem Master-Track und bleiben unverändert.
pub fn apply_shape(uow: &mut UnitOfWork, track: TrackHandle, shape: TrackShape) {
    let vertices = uow.track(track).vertices;
    uow.track_mut(track).shape = shape;
    for (end, vertex) in vertices.into_iter().enumerate() {
        let record = uow.vertex_mut(vertex);
        if !record.is_junction() {
            record.tangent = if end == 0 {
                shape.start_heading()
            } else {
                shape.end_heading()
            };
        }
    }
}

/// Berechnet einen Track anhand der aktuellen Endpunkt-Positionen neu.
///
/// Das Ende an `release` gilt als frei (es wurde gerade bewegt). Mit
/// `promote` wird ein überbestimmter Bogen zum Doppelbogen.
pub fn refit_track(
    uow: &mut UnitOfWork,
    track: TrackHandle,
    release: Option<VertexHandle>,
    promote: bool,
    tolerance: &Tolerance,
) -> Result<(), EditFailure> {
    let overrides: Vec<(VertexHandle, Anchor)> =
        release.map(|v| (v, Anchor::Free)).into_iter().collect();
    refit_track_with(uow, track, &overrides, promote, tolerance)
}

/// Wie [`refit_track`], aber mit expliziten Ankern für einzelne Enden.
pub fn refit_track_with(
    uow: &mut UnitOfWork,
    track: TrackHandle,
    overrides: &[(VertexHandle, Anchor)],
    promote: bool,
    tolerance: &Tolerance,
) -> Result<(), EditFailure> {
    let record = uow.track(track).clone();
    let ends = [0, 1].map(|end| {
        let vertex = record.vertices[end];
        let position = uow.vertex(vertex).position;
        if let Some((_, anchor)) = overrides.iter().find(|(v, _)| *v == vertex) {
            return FitEnd {
                position,
                anchor: *anchor,
                hint: None,
            };
        }
        let current = record.shape.outward_heading(end);
        FitEnd {
            position,
            anchor: anchor_heading(uow, vertex, Some(track), direction(current)),
            hint: Some(current),
        }
    });

    let shape = match fit_shape(record.kind(), &ends[0], &ends[1], tolerance) {
        Err(EditFailure::Infeasible { .. }) if promote && record.kind() == TrackKind::Curved => {
            log::debug!("Bogen ueberbestimmt, wird zum Doppelbogen");
            fit_shape(TrackKind::Free, &ends[0], &ends[1], tolerance)?
        }
        result => result?,
    };
    apply_shape(uow, track, shape);
    Ok(())
}

/// Berechnet die Nachbar-Tracks an beiden Enden von `track` neu und
/// liefert sie zurück.
///
/// An Junction-Enden ist die Richtung durch den Master vorgegeben, dort
/// wird nichts weitergereicht.
pub fn refit_neighbours(
    uow: &mut UnitOfWork,
    track: TrackHandle,
    tolerance: &Tolerance,
) -> Result<Vec<TrackHandle>, EditFailure> {
    let mut refit = Vec::new();
    for vertex in uow.track(track).vertices {
        if uow.vertex(vertex).is_junction() {
            continue;
        }
        let Some(other) = uow.other_track(vertex, Some(track)) else {
            continue;
        };
        let Some(neighbour) = uow.resolve(other) else {
            return Err(EditFailure::MissingContext {
                reason: "Nachbar-Track nicht importiert",
            });
        };
        refit_track(uow, neighbour, None, true, tolerance)?;
        refit.push(neighbour);
    }
    Ok(refit)
}

/// Leitet Position und Tangente aller Junctions auf `master` neu ab und
/// berechnet deren Abzweige.
pub fn rederive_junctions(
    uow: &mut UnitOfWork,
    master: TrackHandle,
    tolerance: &Tolerance,
) -> Result<(), EditFailure> {
    let shape = uow.track(master).shape;
    for junction in uow.junctions_on(master) {
        let Some(binding) = uow.vertex(junction).junction else {
            continue;
        };
        let record = uow.vertex_mut(junction);
        record.position = shape.point_at(binding.parameter);
        record.tangent = shape.heading_at(binding.parameter);

        let branches: Vec<TrackHandle> = uow.vertex(junction).staged_tracks().collect();
        for branch in branches {
            refit_track(uow, branch, None, true, tolerance)?;
        }
    }
    Ok(())
}

/// Prüft Endpunkt-Drift und Tangenten-Stetigkeit an den gegebenen Vertices.
pub fn check_continuity(
    uow: &UnitOfWork,
    vertices: &[VertexHandle],
    tolerance: &Tolerance,
) -> Result<(), EditFailure> {
    let angle = tolerance.continuity_angle();
    for &vertex in vertices {
        let Some(record) = uow.get_vertex(vertex) else {
            continue;
        };

        let mut outward = Vec::with_capacity(2);
        for track in record.staged_tracks() {
            let Some(track_record) = uow.get_track(track) else {
                return Err(broken(record.position, "Slot verweist auf entfernten Track"));
            };
            let Some(end) = track_record.end_of(vertex) else {
                return Err(broken(record.position, "Track kennt den Vertex nicht"));
            };
            let shape = &track_record.shape;
            if !tolerance.points_coincide(shape.endpoint(end), record.position) {
                return Err(broken(record.position, "Track-Ende driftet vom Vertex"));
            }
            let heading = shape.outward_heading(end);
            if !tangents_parallel(heading, record.tangent, angle) {
                return Err(broken(record.position, "Tangente weicht vom Track ab"));
            }
            outward.push(heading);
        }
        if let [first, second] = outward[..]
            && !record.is_junction()
            && !same_heading(first, opposite(second), angle)
        {
            return Err(broken(record.position, "Tracks knicken am Vertex"));
        }

        if let Some(binding) = record.junction
            && let Some(master) = uow.resolve(binding.master)
        {
            let shape = &uow.track(master).shape;
            if !tolerance.points_coincide(shape.point_at(binding.parameter), record.position)
                || !tangents_parallel(shape.heading_at(binding.parameter), record.tangent, angle)
            {
                return Err(broken(record.position, "Junction liegt nicht auf dem Master"));
            }
        }
    }
    Ok(())
}

fn broken(position: DVec2, detail: &str) -> EditFailure {
    EditFailure::ContinuityBroken {
        detail: format!("{detail} bei ({:.3}, {:.3})", position.x, position.y),
    }
}
