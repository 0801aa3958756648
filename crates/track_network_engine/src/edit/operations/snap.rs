//! Offenes Track-Ende auf das offene Ende eines anderen Tracks einrasten.
//!
//! Der Track `S` des losen Vertex `v` wird an das nächste offene Ende `w`
//! des Ziel-Tracks `T` umgehängt und zwischen seinem fernen Ende `u` und
//! `w` neu berechnet. `v` wird danach aus der Unit of Work entfernt.

use super::settle;
use crate::core::TrackKind;
use crate::edit::records::TrackRef;
use crate::edit::reverter::guarded;
use crate::edit::rules::{Condition, EditContext, Modifier, Predicate, Rule, RuleSet};
use crate::edit::session::EditSettings;
use crate::edit::topology::{FitEnd, anchor_heading, apply_shape, fit_shape};
use crate::edit::unit_of_work::UnitOfWork;
use crate::error::EditFailure;

pub fn rules() -> RuleSet<()> {
    let initial = Condition::all([
        Condition::test(Predicate::VertexTrackCount { slot: 0, count: 1 }),
        Condition::not(Condition::test(Predicate::VertexIsJunction { slot: 0 })),
        Condition::test(Predicate::TrackHasOpenEnd { slot: 0 }),
        Condition::not(Condition::test(Predicate::VertexOnTrack { vertex: 0, track: 0 })),
    ]);
    let anchored = |slot| Condition::test(Predicate::Anchored { slot });
    let aligned = |slot| Condition::test(Predicate::ChordAlignedWithAnchor { slot });

    RuleSet::new("snap_track", initial)
        .with_initial_modifier(Modifier::NearestOpenEndOfTrack)
        .rule(Rule::new(
            "snap_straight",
            Condition::all([
                Condition::test(Predicate::TrackKindIs {
                    slot: 0,
                    kind: TrackKind::Straight,
                }),
                aligned(1),
                Condition::any([Condition::not(anchored(0)), aligned(0)]),
            ]),
            snap_straight,
        ))
        .rule(Rule::new(
            "snap_curve",
            Condition::not(anchored(0)),
            snap_curved,
        ))
        .rule(Rule::new(
            "snap_single_arc",
            Condition::test(Predicate::SingleArcFits),
            snap_curved,
        ))
        .rule(Rule::new("snap_free", Condition::Always, snap_free))
}

fn snap_straight(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    snap_with(uow, ctx, settings, TrackKind::Straight)
}

fn snap_curved(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    snap_with(uow, ctx, settings, TrackKind::Curved)
}

fn snap_free(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<(), EditFailure> {
    snap_with(uow, ctx, settings, TrackKind::Free)
}

fn snap_with(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
    kind: TrackKind,
) -> Result<(), EditFailure> {
    let (u, w, v) = (ctx.require(0)?, ctx.require(1)?, ctx.require(2)?);
    let track = ctx.require_track(0)?;
    let tolerance = &settings.tolerance;

    guarded(uow, &[u, w, v], tolerance, |uow| {
        let end = uow.track(track).end_of(v).ok_or(EditFailure::MissingContext {
            reason: "Track haengt nicht am losen Vertex",
        })?;
        uow.track_mut(track).vertices[end] = w;
        uow.vertex_mut(v).detach(TrackRef::Staged(track));
        uow.vertex_mut(w).attach(TrackRef::Staged(track));

        let vertices = uow.track(track).vertices;
        let positions = vertices.map(|x| uow.vertex(x).position);
        let ends = [0, 1].map(|i| FitEnd {
            position: positions[i],
            anchor: anchor_heading(uow, vertices[i], Some(track), positions[1 - i] - positions[i]),
            hint: None,
        });
        let shape = fit_shape(kind, &ends[0], &ends[1], tolerance)?;
        apply_shape(uow, track, shape);
        settle(uow, &[track], tolerance)
    })?;

    uow.retire_vertex(v);
    log::debug!("Track-Ende eingerastet");
    Ok(())
}
