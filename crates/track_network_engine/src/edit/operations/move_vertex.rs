//! Freien, offenen oder geschlossenen Vertex verschieben.
//!
//! Angrenzende Tracks werden an ihren anderen Endpunkten verankert neu
//! berechnet. Im alternativen Modus gleitet der Vertex auf seiner
//! Tangenten-Schiene und behält seine Richtung.

use super::{pinned_anchor, settle};
use crate::core::TrackKind;
use crate::edit::records::{TrackHandle, VertexHandle};
use crate::edit::reverter::guarded;
use crate::edit::rules::{Condition, EditContext, EditMode, Modifier, Predicate, Rule, RuleSet};
use crate::edit::session::EditSettings;
use crate::edit::topology::{refit_track, refit_track_with};
use crate::edit::unit_of_work::UnitOfWork;
use crate::error::EditFailure;

fn count(n: usize) -> Condition {
    Condition::test(Predicate::VertexTrackCount { slot: 0, count: n })
}

fn alternate() -> Condition {
    Condition::test(Predicate::ModeIs(EditMode::Alternate))
}

pub fn rules() -> RuleSet<()> {
    let initial = Condition::not(Condition::test(Predicate::VertexIsJunction { slot: 0 }));
    let rail = Modifier::ProjectOntoRail { slot: 0, point: 0 };

    RuleSet::new("move_vertex", initial)
        .rule(Rule::new("move_free", count(0), move_free))
        .rule(
            Rule::new(
                "slide_on_rail",
                Condition::all([alternate(), count(1)]),
                slide,
            )
            .with_modifier(rail),
        )
        .rule(Rule::new("move_open", count(1), move_open))
        .rule(
            Rule::new(
                "slide_closed_on_rail",
                Condition::all([alternate(), count(2)]),
                slide,
            )
            .with_modifier(rail),
        )
        .rule(Rule::new("move_closed", count(2), move_closed))
}

fn staged_tracks(uow: &UnitOfWork, vertex: VertexHandle) -> Result<Vec<TrackHandle>, EditFailure> {
    let record = uow.vertex(vertex);
    if record.has_unresolved() {
        return Err(EditFailure::MissingContext {
            reason: "Track am Vertex nicht importiert",
        });
    }
    Ok(record.staged_tracks().collect())
}

fn move_free(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    let vertex = ctx.require(0)?;
    let target = ctx.point(0)?;
    ctx.ensure_within(target)?;
    guarded(uow, &[vertex], &settings.tolerance, |uow| {
        uow.vertex_mut(vertex).position = target;
        Ok(())
    })
}

fn move_open(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    let vertex = ctx.require(0)?;
    let target = ctx.point(0)?;
    ctx.ensure_within(target)?;
    let tracks = staged_tracks(uow, vertex)?;
    let tolerance = &settings.tolerance;
    guarded(uow, &[vertex], tolerance, |uow| {
        uow.vertex_mut(vertex).position = target;
        for track in &tracks {
            refit_track(uow, *track, Some(vertex), false, tolerance)?;
        }
        settle(uow, &tracks, tolerance)
    })
}

fn move_closed(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    let vertex = ctx.require(0)?;
    let target = ctx.point(0)?;
    ctx.ensure_within(target)?;
    let mut tracks = staged_tracks(uow, vertex)?;
    // Eine Gerade bestimmt die Richtung am Vertex, der andere Track folgt
    tracks.sort_by_key(|t| uow.track(*t).kind() != TrackKind::Straight);
    let tolerance = &settings.tolerance;
    guarded(uow, &[vertex], tolerance, |uow| {
        uow.vertex_mut(vertex).position = target;
        let mut release = Some(vertex);
        for track in &tracks {
            refit_track(uow, *track, release.take(), true, tolerance)?;
        }
        settle(uow, &tracks, tolerance)
    })
}

/// Verschiebt auf der Schiene; jeder angrenzende Track behält die Richtung
/// am Vertex.
fn slide(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    let vertex = ctx.require(0)?;
    let target = ctx.point(0)?;
    ctx.ensure_within(target)?;
    let tracks = staged_tracks(uow, vertex)?;
    let pins: Vec<_> = tracks
        .iter()
        .map(|t| (*t, pinned_anchor(uow, vertex, *t)))
        .collect();
    let tolerance = &settings.tolerance;
    guarded(uow, &[vertex], tolerance, |uow| {
        uow.vertex_mut(vertex).position = target;
        for (track, anchor) in &pins {
            refit_track_with(uow, *track, &[(vertex, *anchor)], true, tolerance)?;
        }
        settle(uow, &tracks, tolerance)
    })
}
