//! Junction auf einem bestehenden Track anlegen.

use crate::edit::records::{JunctionBinding, TrackRef, VertexHandle};
use crate::edit::reverter::guarded;
use crate::edit::rules::{Condition, EditContext, Predicate, Rule, RuleSet};
use crate::edit::session::EditSettings;
use crate::edit::unit_of_work::UnitOfWork;
use crate::error::EditFailure;

pub fn rules() -> RuleSet<VertexHandle> {
    RuleSet::new(
        "create_junction",
        Condition::test(Predicate::ParameterInside { track: 0, point: 0 }),
    )
    .rule(Rule::new("junction_on_track", Condition::Always, junction_on_track))
}

/// Legt den Junction-Vertex am nächstgelegenen Punkt des Master-Tracks an.
/// Position und Tangente werden vom Master abgeleitet.
fn junction_on_track(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<VertexHandle, EditFailure> {
    let master = ctx.require_track(0)?;
    let tolerance = &settings.tolerance;
    let shape = uow.track(master).shape;
    let parameter = shape.nearest_parameter(ctx.point(0)?, tolerance);
    let position = shape.point_at(parameter);
    ctx.ensure_within(position)?;

    guarded(uow, &[], tolerance, |uow| {
        let vertex = uow.add_vertex(position, shape.heading_at(parameter));
        uow.vertex_mut(vertex).junction = Some(JunctionBinding {
            master: TrackRef::Staged(master),
            parameter,
        });
        log::debug!("Junction bei t={parameter:.4} angelegt");
        Ok(vertex)
    })
}
