//! Zwei offene Gerade-Enden durch eine Kurve verbinden.

use super::{fixed_heading, settle};
use crate::core::TrackKind;
use crate::edit::records::TrackHandle;
use crate::edit::reverter::guarded;
use crate::edit::rules::{Condition, EditContext, Predicate, Rule, RuleSet};
use crate::edit::session::EditSettings;
use crate::edit::topology::{Anchor, FitEnd, apply_shape, fit_shape, refit_track};
use crate::edit::unit_of_work::UnitOfWork;
use crate::error::EditFailure;
use crate::geometry::{direction, intersection, line_from_point_and_tangent};
use glam::DVec2;

pub fn rules() -> RuleSet<TrackHandle> {
    let mut initial = Vec::new();
    for slot in 0..2 {
        initial.push(Condition::test(Predicate::VertexTrackCount { slot, count: 1 }));
        initial.push(Condition::test(Predicate::TrackOfVertexKindIs {
            slot,
            kind: TrackKind::Straight,
        }));
    }
    initial.push(Condition::test(Predicate::EndsDistinct));
    initial.push(Condition::not(Condition::test(Predicate::EndsShareTrack)));

    RuleSet::new("bind_vertices", Condition::all(initial))
        .rule(Rule::new(
            "bind_parallel",
            Condition::test(Predicate::AnchorsParallel),
            bind_free,
        ))
        .rule(Rule::new(
            "bind_converging",
            Condition::test(Predicate::AnchorsConverge),
            bind_converging,
        ))
        .rule(Rule::new("bind_fallback", Condition::Always, bind_free))
}

fn anchored_ends(uow: &UnitOfWork, ctx: &EditContext) -> Result<[FitEnd; 2], EditFailure> {
    let mut ends = [FitEnd::free(DVec2::ZERO); 2];
    for (slot, end) in ends.iter_mut().enumerate() {
        let vertex = ctx.require(slot)?;
        *end = FitEnd {
            position: uow.vertex(vertex).position,
            anchor: Anchor::Fixed(fixed_heading(uow, ctx, slot)?),
            hint: None,
        };
    }
    Ok(ends)
}

fn insert(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
    kind: TrackKind,
) -> Result<TrackHandle, EditFailure> {
    let ends = anchored_ends(uow, ctx)?;
    let shape = fit_shape(kind, &ends[0], &ends[1], &settings.tolerance)?;
    let vertices = [ctx.require(0)?, ctx.require(1)?];
    let track = uow.add_track(vertices, shape);
    apply_shape(uow, track, shape);
    Ok(track)
}

/// Doppelbogen zwischen beiden Enden.
fn bind_free(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<TrackHandle, EditFailure> {
    let vertices = [ctx.require(0)?, ctx.require(1)?];
    guarded(uow, &vertices, &settings.tolerance, |uow| {
        insert(uow, ctx, settings, TrackKind::Free)
    })
}

/// Der weiter vom Schnittpunkt der Schienen entfernte Vertex gleitet auf
/// seiner Schiene, bis beide gleich weit entfernt sind; dann passt ein
/// einzelner Bogen.
fn bind_converging(
    uow: &mut UnitOfWork,
    ctx: &EditContext,
    settings: &EditSettings,
) -> Result<TrackHandle, EditFailure> {
    let tolerance = &settings.tolerance;
    let ends = anchored_ends(uow, ctx)?;
    let headings = ends.map(|e| e.anchor.heading().unwrap_or_default());
    let rails = [0, 1].map(|i| line_from_point_and_tangent(ends[i].position, headings[i]));
    let meet = intersection(&rails[0], &rails[1], tolerance.linear)
        .ok_or(EditFailure::infeasible("Schienen schneiden sich nicht"))?;
    let distances = ends.map(|e| e.position.distance(meet));
    let (near, far) = if distances[0] <= distances[1] {
        (0, 1)
    } else {
        (1, 0)
    };
    if distances[near] <= tolerance.linear {
        return Err(EditFailure::infeasible("Vertex liegt im Schienen-Schnittpunkt"));
    }
    let slid = meet - direction(headings[far]) * distances[near];
    ctx.ensure_within(slid)?;

    let vertices = [ctx.require(0)?, ctx.require(1)?];
    let far_vertex = vertices[far];
    let far_track = uow.sole_track(far_vertex).ok_or(EditFailure::MissingContext {
        reason: "Gerade am Vertex fehlt",
    })?;
    guarded(uow, &vertices, tolerance, |uow| {
        uow.vertex_mut(far_vertex).position = slid;
        refit_track(uow, far_track, None, false, tolerance)?;
        settle(uow, &[far_track], tolerance)?;
        insert(uow, ctx, settings, TrackKind::Curved)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::operations::test_support::Fixture;
    use crate::edit::records::VertexHandle;
    use crate::edit::rules::{EditOutcome, Endpoint};
    use crate::geometry::side_test;
    use approx::assert_abs_diff_eq;

    fn bind_ctx(fixture: &Fixture, a: VertexHandle, b: VertexHandle) -> EditContext {
        fixture
            .ctx()
            .with_vertex(Endpoint::Existing(a))
            .with_vertex(Endpoint::Existing(b))
    }

    #[test]
    fn converging_straights_get_single_arc() {
        let mut fixture = Fixture::new();
        // Gerade nach Osten endet bei (10,0), Gerade nach Süden bei (30,30)
        let (_, a, ta) = fixture.straight(DVec2::ZERO, DVec2::new(10.0, 0.0));
        let (_, b, tb) = fixture.straight(DVec2::new(30.0, 50.0), DVec2::new(30.0, 30.0));
        let ctx = bind_ctx(&fixture, a, b);
        assert_eq!(fixture.selected(&rules(), &ctx), Some("bind_converging"));

        let track = fixture.run(&rules(), ctx).applied().expect("Bogen erwartet");
        let shape = fixture.uow.track(track).shape;
        assert_eq!(shape.kind(), TrackKind::Curved);
        // a war näher am Schnittpunkt (30,0): b gleitet auf (30,20)
        assert_abs_diff_eq!(
            fixture.uow.vertex(b).position.distance(DVec2::new(30.0, 20.0)),
            0.0,
            epsilon = 1e-9
        );
        assert_eq!(fixture.uow.vertex(a).position, DVec2::new(10.0, 0.0));
        fixture.assert_continuous();
        fixture.assert_keeps_side(track, a, ta);
        fixture.assert_keeps_side(track, b, tb);
    }

    #[test]
    fn parallel_straights_get_free_curve_without_crossing() {
        let mut fixture = Fixture::new();
        let (sa, a, ta) = fixture.straight(DVec2::ZERO, DVec2::new(10.0, 0.0));
        let (sb, b, tb) = fixture.straight(DVec2::new(30.0, 8.0), DVec2::new(20.0, 8.0));
        let ctx = bind_ctx(&fixture, a, b);
        assert_eq!(fixture.selected(&rules(), &ctx), Some("bind_parallel"));

        let track = fixture.run(&rules(), ctx).applied().expect("Doppelbogen erwartet");
        let shape = fixture.uow.track(track).shape;
        assert_eq!(shape.kind(), TrackKind::Free);
        fixture.assert_continuous();

        // Die Kurve bleibt zwischen den beiden Geraden und kreuzt keine davon
        for i in 1..100 {
            let p = shape.point_at(i as f64 / 100.0);
            assert!(p.y > -1e-9 && p.y < 8.0 + 1e-9, "Punkt {p} ausserhalb");
        }
        fixture.assert_keeps_side(track, a, ta);
        fixture.assert_keeps_side(track, b, tb);
        // Innenpunkte der Kurve und das jeweils andere Gleis liegen auf
        // derselben Seite jeder angeschlossenen Geraden
        for (start, end, other) in [(sa, a, tb), (sb, b, ta)] {
            let from = fixture.uow.vertex(start).position;
            let to = fixture.uow.vertex(end).position;
            let far = fixture.uow.track(other).shape.control_point(&fixture.settings.tolerance);
            for i in 1..10 {
                let p = shape.point_at(i as f64 / 10.0);
                assert_eq!(side_test(from, to, p).signum(), side_test(from, to, far).signum());
            }
        }
        assert_eq!(fixture.uow.track(ta).kind(), TrackKind::Straight);
        assert_eq!(fixture.uow.track(tb).kind(), TrackKind::Straight);
    }

    #[test]
    fn diverging_straights_fall_back_to_free_curve() {
        let mut fixture = Fixture::new();
        // Beide Schienen laufen vom Schnittpunkt weg
        let (_, a, _) = fixture.straight(DVec2::ZERO, DVec2::new(10.0, 0.0));
        let (_, b, _) = fixture.straight(DVec2::new(-20.0, 10.0), DVec2::new(-20.0, 30.0));
        let ctx = bind_ctx(&fixture, a, b);
        assert_eq!(fixture.selected(&rules(), &ctx), Some("bind_fallback"));
        let track = fixture.run(&rules(), ctx).applied().expect("Doppelbogen erwartet");
        assert_eq!(fixture.uow.track(track).kind(), TrackKind::Free);
        fixture.assert_continuous();
    }

    #[test]
    fn ends_of_same_track_are_not_applicable() {
        let mut fixture = Fixture::new();
        let (a, b, _) = fixture.straight(DVec2::ZERO, DVec2::new(10.0, 0.0));
        let ctx = bind_ctx(&fixture, a, b);
        assert_eq!(fixture.run(&rules(), ctx), EditOutcome::NotApplicable);
    }
}
