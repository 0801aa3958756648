//! Track an einem offenen Vertex (oder einer leeren Junction) fortsetzen.

use super::fixed_heading;
use crate::core::{TrackKind, TrackShape};
use crate::edit::records::TrackHandle;
use crate::edit::reverter::guarded;
use crate::edit::rules::{Condition, EditContext, EditMode, Predicate, Rule, RuleSet};
use crate::edit::session::EditSettings;
use crate::edit::topology::apply_shape;
use crate::edit::unit_of_work::UnitOfWork;
use crate::error::EditFailure;
use crate::geometry::{arc_from_heading, free_curve, heading_of, project_onto_rail};

fn prior(kind: TrackKind, mode: EditMode) -> Condition {
    Condition::all([
        Condition::test(Predicate::TrackOfVertexKindIs { slot: 0, kind }),
        Condition::test(Predicate::ModeIs(mode)),
    ])
}

pub fn rules() -> RuleSet<TrackHandle> {
    let initial = Condition::any([
        Condition::test(Predicate::VertexTrackCount { slot: 0, count: 1 }),
        Condition::all([
            Condition::test(Predicate::VertexIsJunction { slot: 0 }),
            Condition::test(Predicate::VertexTrackCount { slot: 0, count: 0 }),
        ]),
    ]);

    RuleSet::new("extend_track", initial)
        .rule(Rule::new(
            "junction_branch",
            Condition::test(Predicate::VertexIsJunction { slot: 0 }),
            extend_junction,
        ))
        .rule(Rule::new(
            "straight_rail",
            prior(TrackKind::Straight, EditMode::Default),
            extend_rail,
        ))
        .rule(Rule::new(
            "straight_bend",
            prior(TrackKind::Straight, EditMode::Alternate),
            extend_arc,
        ))
        .rule(Rule::new(
            "curve_follow",
            prior(TrackKind::Curved, EditMode::Default),
            extend_arc,
        ))
        .rule(Rule::new(
            "curve_tangent_exit",
            prior(TrackKind::Curved, EditMode::Alternate),
            extend_rail,
        ))
        .rule(Rule::new(
            "free_follow",
            prior(TrackKind::Free, EditMode::Default),
            extend_free,
        ))
        .rule(Rule::new(
            "free_bend",
            prior(TrackKind::Free, EditMode::Alternate),
            extend_arc,
        ))
}

fn extend_junction(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<TrackHandle, EditFailure> {
    match ctx.mode {
        EditMode::Default => extend_rail(uow, ctx, settings),
        EditMode::Alternate => extend_arc(uow, ctx, settings),
    }
}

/// Gerade entlang der Tangente; das Ziel wird auf die Schiene projiziert.
fn extend_rail(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<TrackHandle, EditFailure> {
    let vertex = ctx.require(0)?;
    let heading = fixed_heading(uow, ctx, 0)?;
    let from = uow.vertex(vertex).position;
    let (to, along) = project_onto_rail(from, heading, ctx.point(0)?);
    if along <= settings.tolerance.linear {
        return Err(EditFailure::infeasible("Ziel liegt hinter der Schiene"));
    }
    attach(uow, ctx, settings, TrackShape::Straight { from, to })
}

/// Einzelbogen tangential zum bisherigen Track.
fn extend_arc(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<TrackHandle, EditFailure> {
    let vertex = ctx.require(0)?;
    let heading = fixed_heading(uow, ctx, 0)?;
    let from = uow.vertex(vertex).position;
    let segment = arc_from_heading(from, heading, ctx.point(0)?, &settings.tolerance)
        .ok_or(EditFailure::infeasible("Ziel liegt hinter dem Vertex"))?;
    attach(uow, ctx, settings, TrackShape::from_segment(segment))
}

/// Doppelbogen, der am Ziel entlang der Sehne ankommt.
fn extend_free(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<TrackHandle, EditFailure> {
    let vertex = ctx.require(0)?;
    let heading = fixed_heading(uow, ctx, 0)?;
    let from = uow.vertex(vertex).position;
    let target = ctx.point(0)?;
    let curve = free_curve(
        from,
        heading,
        target,
        heading_of(target - from),
        &settings.tolerance,
    )
    .ok_or(EditFailure::infeasible("kein Doppelbogen zum Ziel"))?;
    attach(uow, ctx, settings, TrackShape::Free(curve))
}

fn attach(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
    shape: TrackShape,
) -> Result<TrackHandle, EditFailure> {
    let vertex = ctx.require(0)?;
    let end = shape.end_point();
    ctx.ensure_within(end)?;
    guarded(uow, &[vertex], &settings.tolerance, |uow| {
        let new_vertex = uow.add_vertex(end, shape.end_heading());
        let track = uow.add_track([vertex, new_vertex], shape);
        apply_shape(uow, track, shape);
        Ok(track)
    })
}
