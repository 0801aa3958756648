//! Track-Typ umwandeln und Nachbarn nachführen.

use super::settle;
use crate::core::{TrackKind, TrackShape};
use crate::edit::records::TrackHandle;
use crate::edit::reverter::guarded;
use crate::edit::rules::{Condition, EditContext, Predicate, Rule, RuleSet};
use crate::edit::session::EditSettings;
use crate::edit::topology::{
    Anchor, FitEnd, anchor_heading, apply_shape, fit_shape, refit_neighbours,
};
use crate::edit::unit_of_work::UnitOfWork;
use crate::error::EditFailure;
use crate::geometry::{CurveSegment, arc_from_heading, direction, heading_of};

fn target(kind: TrackKind) -> Condition {
    Condition::test(Predicate::TargetKindIs(kind))
}

pub fn rules() -> RuleSet<()> {
    RuleSet::new(
        "convert_track",
        Condition::test(Predicate::TargetKindDiffers { slot: 0 }),
    )
    .rule(Rule::new(
        "unresolved_context",
        Condition::test(Predicate::TrackMissingContext { slot: 0 }),
        unresolved,
    ))
    .rule(Rule::new(
        "to_straight",
        Condition::all([
            target(TrackKind::Straight),
            Condition::not(Condition::test(Predicate::NeighborKindIs(
                TrackKind::Straight,
            ))),
        ]),
        to_straight,
    ))
    .rule(Rule::new("to_curved", target(TrackKind::Curved), to_curved))
    .rule(Rule::new("to_free", target(TrackKind::Free), to_free))
}

fn unresolved(
    _uow: &mut UnitOfWork,
    _ctx: &EditContext,
    _settings: &EditSettings,
) -> Result<(), EditFailure> {
    Err(EditFailure::MissingContext {
        reason: "Nachbarschaft des Tracks unvollständig",
    })
}

/// Anker beider Enden, gesehen vom umzuwandelnden Track.
fn end_anchors(uow: &UnitOfWork, track: TrackHandle) -> Result<[Anchor; 2], EditFailure> {
    let record = uow.track(track);
    let anchors = [0, 1].map(|end| {
        let reference = direction(record.shape.outward_heading(end));
        anchor_heading(uow, record.vertices[end], Some(track), reference)
    });
    if anchors.contains(&Anchor::Unresolved) {
        return Err(EditFailure::MissingContext {
            reason: "Nachbar-Track nicht importiert",
        });
    }
    Ok(anchors)
}

fn neighbour_is_straight(uow: &UnitOfWork, track: TrackHandle, end: usize) -> bool {
    let vertex = uow.track(track).vertices[end];
    !uow.vertex(vertex).is_junction()
        && uow
            .other_track(vertex, Some(track))
            .and_then(|r| uow.resolve(r))
            .is_some_and(|n| uow.track(n).kind() == TrackKind::Straight)
}

fn replace_shape(
    uow: &mut UnitOfWork,
    track: TrackHandle,
    shape: TrackShape,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    let tolerance = &settings.tolerance;
    let vertices = uow.track(track).vertices;
    guarded(uow, &vertices, tolerance, |uow| {
        apply_shape(uow, track, shape);
        let neighbours = refit_neighbours(uow, track, tolerance)?;
        settle(uow, &[track], tolerance)?;
        settle(uow, &neighbours, tolerance)?;
        log::debug!("Track in {} umgewandelt", shape.kind());
        Ok(())
    })
}

fn to_straight(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    let track = ctx.require_track(0)?;
    end_anchors(uow, track)?;
    let [a, b] = uow.track(track).vertices;
    let shape = TrackShape::Straight {
        from: uow.vertex(a).position,
        to: uow.vertex(b).position,
    };
    replace_shape(uow, track, shape, settings)
}

/// Einzelbogen, verankert am Ende mit gerader Nachbarschaft (sonst am
/// ersten verankerten Ende). Ohne Anker wird die Sehne um den
/// Umwandlungs-Winkel geknickt.
fn to_curved(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    let track = ctx.require_track(0)?;
    let tolerance = &settings.tolerance;
    let anchors = end_anchors(uow, track)?;
    let [a, b] = uow.track(track).vertices;
    let (p0, p1) = (uow.vertex(a).position, uow.vertex(b).position);

    let order = if neighbour_is_straight(uow, track, 1) && !neighbour_is_straight(uow, track, 0) {
        [1, 0]
    } else {
        [0, 1]
    };
    let base = order.into_iter().find_map(|end| anchors[end].heading().map(|h| (end, h)));
    let segment = match base {
        Some((0, heading)) => arc_from_heading(p0, heading, p1, tolerance),
        Some((_, heading)) => arc_from_heading(p1, heading, p0, tolerance).map(|s| s.reversed()),
        None => arc_from_heading(
            p0,
            heading_of(p1 - p0) + settings.conversion_bend,
            p1,
            tolerance,
        ),
    };
    let arc = match segment {
        Some(CurveSegment::Arc(arc)) => arc,
        Some(CurveSegment::Line { .. }) => {
            return Err(EditFailure::infeasible("Bogen entartet zur Geraden"));
        }
        None => return Err(EditFailure::infeasible("kein Bogen zwischen den Enden")),
    };
    replace_shape(uow, track, TrackShape::Curved(arc), settings)
}

fn to_free(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    let track = ctx.require_track(0)?;
    let anchors = end_anchors(uow, track)?;
    let record = uow.track(track);
    let ends = [0, 1].map(|end| FitEnd {
        position: uow.vertex(record.vertices[end]).position,
        anchor: anchors[end],
        hint: Some(record.shape.outward_heading(end)),
    });
    let shape = fit_shape(TrackKind::Free, &ends[0], &ends[1], &settings.tolerance)?;
    replace_shape(uow, track, shape, settings)
}
