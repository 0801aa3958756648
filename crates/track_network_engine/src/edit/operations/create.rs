//! Track zwischen zwei Punkten anlegen.

use crate::core::TrackKind;
use crate::edit::records::VertexHandle;
use crate::edit::reverter::guarded;
use crate::edit::rules::{Condition, EditContext, Endpoint, Modifier, Predicate, Rule, RuleSet};
use crate::edit::session::EditSettings;
use crate::edit::topology::{FitEnd, apply_shape, fit_shape};
use crate::edit::unit_of_work::UnitOfWork;
use crate::error::EditFailure;

fn anchored(slot: usize) -> Condition {
    Condition::test(Predicate::Anchored { slot })
}

fn aligned(slot: usize) -> Condition {
    Condition::test(Predicate::ChordAlignedWithAnchor { slot })
}

pub fn rules() -> RuleSet<[VertexHandle; 2]> {
    let initial = Condition::all([
        Condition::test(Predicate::VertexTrackCountAtMost { slot: 0, max: 1 }),
        Condition::test(Predicate::VertexTrackCountAtMost { slot: 1, max: 1 }),
        Condition::test(Predicate::EndsDistinct),
    ]);

    RuleSet::new("create_track", initial)
        .with_initial_modifier(Modifier::AnchoredEndFirst)
        .rule(Rule::new(
            "straight_free",
            Condition::all([Condition::not(anchored(0)), Condition::not(anchored(1))]),
            create_straight,
        ))
        .rule(Rule::new(
            "straight_continuation",
            Condition::all([anchored(0), Condition::not(anchored(1)), aligned(0)]),
            create_straight,
        ))
        .rule(Rule::new(
            "curve_from_anchor",
            Condition::all([anchored(0), Condition::not(anchored(1))]),
            create_curved,
        ))
        .rule(Rule::new(
            "straight_between_anchors",
            Condition::all([aligned(0), aligned(1)]),
            create_straight,
        ))
        .rule(Rule::new(
            "curve_between_anchors",
            Condition::test(Predicate::SingleArcFits),
            create_curved,
        ))
        .rule(Rule::new(
            "free_between_anchors",
            Condition::Always,
            create_free,
        ))
}

fn create_straight(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<[VertexHandle; 2], EditFailure> {
    create_with(uow, ctx, settings, TrackKind::Straight)
}

fn create_curved(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<[VertexHandle; 2], EditFailure> {
    create_with(uow, ctx, settings, TrackKind::Curved)
}

fn create_free(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<[VertexHandle; 2], EditFailure> {
    create_with(uow, ctx, settings, TrackKind::Free)
}

fn create_with(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
    kind: TrackKind,
) -> Result<[VertexHandle; 2], EditFailure> {
    let mut ends = Vec::with_capacity(2);
    for slot in 0..2 {
        let position = ctx.position(uow, slot).ok_or(EditFailure::MissingContext {
            reason: "Endpunkt fehlt im Kontext",
        })?;
        ctx.ensure_within(position)?;
        ends.push(FitEnd {
            position,
            anchor: ctx.anchor(uow, slot),
            hint: None,
        });
    }
    let shape = fit_shape(kind, &ends[0], &ends[1], &settings.tolerance)?;

    let existing: Vec<VertexHandle> = (0..2).filter_map(|slot| ctx.handle(slot)).collect();
    guarded(uow, &existing, &settings.tolerance, |uow| {
        let handles = [0, 1].map(|slot| match ctx.vertices[slot] {
            Endpoint::Existing(handle) => handle,
            Endpoint::Fresh(position) => uow.add_vertex(position, shape.start_heading()),
        });
        let track = uow.add_track(handles, shape);
        apply_shape(uow, track, shape);
        log::debug!("Track ({}) angelegt", shape.kind());
        Ok(handles)
    })
}
