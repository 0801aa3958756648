use super::*;
use crate::core::{TrackShape, World};
use crate::edit::topology::apply_shape;

fn bounds() -> WorldBounds {
    WorldBounds::centered(100.0)
}

fn settings() -> EditSettings {
    EditSettings::default()
}

fn name_of(
    _uow: &mut UnitOfWork,
    _ctx: &EditContext,
    _settings: &EditSettings,
) -> Result<&'static str, EditFailure> {
    Ok("erste")
}

fn second(
    _uow: &mut UnitOfWork,
    _ctx: &EditContext,
    _settings: &EditSettings,
) -> Result<&'static str, EditFailure> {
    Ok("zweite")
}

fn failing(
    _uow: &mut UnitOfWork,
    _ctx: &EditContext,
    _settings: &EditSettings,
) -> Result<&'static str, EditFailure> {
    Err(EditFailure::infeasible("Test"))
}

/// a(0,0) --straight-- b(10,0)
fn single_straight() -> (UnitOfWork, VertexHandle, VertexHandle, TrackHandle) {
    let mut uow = UnitOfWork::new();
    let a = uow.add_vertex(DVec2::ZERO, 0.0);
    let b = uow.add_vertex(DVec2::new(10.0, 0.0), 0.0);
    let shape = TrackShape::Straight {
        from: DVec2::ZERO,
        to: DVec2::new(10.0, 0.0),
    };
    let t = uow.add_track([a, b], shape);
    apply_shape(&mut uow, t, shape);
    (uow, a, b, t)
}

#[test]
fn first_matching_rule_wins() {
    let rules = RuleSet::new("toy", Condition::Always)
        .rule(Rule::new("erste", Condition::Always, name_of))
        .rule(Rule::new("zweite", Condition::Always, second));
    let world = World::new(bounds(), 10.0);
    let bridge = ImportBridge::new(&world);
    let mut uow = UnitOfWork::new();

    let outcome = rules.dispatch(&mut uow, &bridge, EditContext::new(bounds()), &settings());
    assert_eq!(outcome, EditOutcome::Applied("erste"));
    assert_eq!(rules.rule_names().collect::<Vec<_>>(), vec!["erste", "zweite"]);
}

#[test]
fn failed_initial_condition_is_not_applicable() {
    let rules = RuleSet::new("toy", Condition::not(Condition::Always))
        .rule(Rule::new("erste", Condition::Always, name_of));
    let world = World::new(bounds(), 10.0);
    let bridge = ImportBridge::new(&world);
    let mut uow = UnitOfWork::new();

    let outcome = rules.dispatch(&mut uow, &bridge, EditContext::new(bounds()), &settings());
    assert_eq!(outcome, EditOutcome::NotApplicable);
}

#[test]
fn handle_from_other_unit_of_work_is_not_applicable() {
    let rules = RuleSet::new("toy", Condition::Always)
        .rule(Rule::new("erste", Condition::Always, name_of));
    let world = World::new(bounds(), 10.0);
    let bridge = ImportBridge::new(&world);
    let (_old, stale_vertex, _, stale_track) = single_straight();
    let (mut uow, _, _, _) = single_straight();

    let ctx = EditContext::new(bounds()).with_vertex(Endpoint::Existing(stale_vertex));
    assert!(!ctx.handles_known(&uow));
    assert_eq!(
        rules.dispatch(&mut uow, &bridge, ctx, &settings()),
        EditOutcome::NotApplicable
    );
    let ctx = EditContext::new(bounds()).with_track(stale_track);
    assert_eq!(
        rules.dispatch(&mut uow, &bridge, ctx, &settings()),
        EditOutcome::NotApplicable
    );
}

#[test]
fn failing_case_is_reported_and_does_not_fall_through() {
    let rules = RuleSet::new("toy", Condition::Always)
        .rule(Rule::new("kaputt", Condition::Always, failing))
        .rule(Rule::new("zweite", Condition::Always, second));
    let world = World::new(bounds(), 10.0);
    let bridge = ImportBridge::new(&world);
    let mut uow = UnitOfWork::new();

    let outcome = rules.dispatch(&mut uow, &bridge, EditContext::new(bounds()), &settings());
    assert!(matches!(outcome, EditOutcome::Failed(EditFailure::Infeasible { .. })));
}

#[test]
fn combinators_follow_boolean_logic() {
    let uow = UnitOfWork::new();
    let ctx = EditContext::new(bounds());
    let tol = Tolerance::default();
    let yes = || Condition::Always;
    let no = || Condition::not(Condition::Always);

    assert!(Condition::all([yes(), yes()]).evaluate(&uow, &ctx, &tol));
    assert!(!Condition::all([yes(), no()]).evaluate(&uow, &ctx, &tol));
    assert!(Condition::any([no(), yes()]).evaluate(&uow, &ctx, &tol));
    assert!(!Condition::any([no(), no()]).evaluate(&uow, &ctx, &tol));
    // Leere Konjunktion ist wahr, leere Disjunktion falsch
    assert!(Condition::all(Vec::new()).evaluate(&uow, &ctx, &tol));
    assert!(!Condition::any(Vec::new()).evaluate(&uow, &ctx, &tol));
}

#[test]
fn predicates_read_vertex_and_track_slots() {
    let (uow, a, b, t) = single_straight();
    let tol = Tolerance::default();
    let ctx = EditContext::new(bounds())
        .with_vertex(Endpoint::Existing(a))
        .with_vertex(Endpoint::Fresh(DVec2::new(5.0, 5.0)))
        .with_track(t);

    let holds = |p: Predicate| p.evaluate(&uow, &ctx, &tol);
    assert!(holds(Predicate::VertexTrackCount { slot: 0, count: 1 }));
    assert!(holds(Predicate::VertexTrackCount { slot: 1, count: 0 }));
    assert!(holds(Predicate::VertexTrackCountAtMost { slot: 0, max: 1 }));
    assert!(holds(Predicate::TrackKindIs {
        slot: 0,
        kind: TrackKind::Straight
    }));
    assert!(holds(Predicate::TrackHasOpenEnd { slot: 0 }));
    assert!(holds(Predicate::VertexOnTrack { vertex: 0, track: 0 }));
    assert!(holds(Predicate::EndsDistinct));
    assert!(!holds(Predicate::VertexIsJunction { slot: 0 }));
    // Slot ohne Track
    assert!(!holds(Predicate::TrackKindIs {
        slot: 1,
        kind: TrackKind::Straight
    }));

    let shared = EditContext::new(bounds())
        .with_vertex(Endpoint::Existing(a))
        .with_vertex(Endpoint::Existing(b));
    assert!(Predicate::EndsShareTrack.evaluate(&uow, &shared, &tol));
}

#[test]
fn anchored_end_first_swaps_free_start() {
    let (uow, _, b, _) = single_straight();
    let tol = Tolerance::default();
    let ctx = EditContext::new(bounds())
        .with_vertex(Endpoint::Fresh(DVec2::new(30.0, 0.0)))
        .with_vertex(Endpoint::Existing(b));

    let out = Modifier::AnchoredEndFirst
        .apply(&uow, &ctx, &tol)
        .expect("Umformung erwartet");
    assert_eq!(out.vertices[0], Endpoint::Existing(b));
    assert!(Predicate::ChordAlignedWithAnchor { slot: 0 }.evaluate(&uow, &out, &tol));
}

#[test]
fn project_onto_rail_keeps_only_the_along_component() {
    let (uow, _, b, _) = single_straight();
    let tol = Tolerance::default();
    let ctx = EditContext::new(bounds())
        .with_vertex(Endpoint::Existing(b))
        .with_point(DVec2::new(14.0, 6.0));

    let out = Modifier::ProjectOntoRail { slot: 0, point: 0 }
        .apply(&uow, &ctx, &tol)
        .expect("Umformung erwartet");
    assert_eq!(out.points[0], DVec2::new(14.0, 0.0));
}

#[test]
fn modifier_without_inputs_skips_the_rule() {
    let (uow, _, b, _) = single_straight();
    let tol = Tolerance::default();
    let rules = RuleSet::new("toy", Condition::Always)
        .rule(
            Rule::new("schiene", Condition::Always, name_of)
                .with_modifier(Modifier::ProjectOntoRail { slot: 0, point: 0 }),
        )
        .rule(Rule::new("zweite", Condition::Always, second));
    // Kein Zielpunkt: der Modifier greift nicht, die zweite Regel gewinnt
    let ctx = EditContext::new(bounds()).with_vertex(Endpoint::Existing(b));
    let (index, _) = rules.select(&uow, &ctx, &tol).expect("Regel erwartet");
    assert_eq!(rules.rules[index].name, "zweite");
}

#[test]
fn out_of_bounds_point_is_rejected() {
    let ctx = EditContext::new(bounds());
    assert!(ctx.ensure_within(DVec2::new(50.0, -50.0)).is_ok());
    assert!(matches!(
        ctx.ensure_within(DVec2::new(150.0, 0.0)),
        Err(EditFailure::OutOfBounds { .. })
    ));
}
