//! Gemeinsame Helfer für die Regelwerk-Tests.

use crate::core::{TrackShape, World, WorldBounds};
use crate::edit::bridge::ImportBridge;
use crate::edit::records::{TrackHandle, VertexHandle};
use crate::edit::rules::{EditContext, EditOutcome, RuleSet};
use crate::edit::session::EditSettings;
use crate::edit::topology::{apply_shape, check_continuity};
use crate::edit::unit_of_work::UnitOfWork;
use crate::geometry::side_test;
use glam::DVec2;

pub(crate) struct Fixture {
    pub world: World,
    pub uow: UnitOfWork,
    pub settings: EditSettings,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            world: World::new(WorldBounds::centered(1000.0), 100.0),
            uow: UnitOfWork::new(),
            settings: EditSettings::default(),
        }
    }

    pub fn ctx(&self) -> EditContext {
        EditContext::new(self.world.bounds())
    }

    pub fn run<T>(&mut self, rules: &RuleSet<T>, ctx: EditContext) -> EditOutcome<T> {
        let bridge = ImportBridge::new(&self.world);
        rules.dispatch(&mut self.uow, &bridge, ctx, &self.settings)
    }

    /// Name der Regel, die für `ctx` gewählt würde.
    pub fn selected<T>(&self, rules: &RuleSet<T>, ctx: &EditContext) -> Option<&'static str> {
        let ctx = match rules.initial_modifier {
            Some(modifier) => modifier.apply(&self.uow, ctx, &self.settings.tolerance)?,
            None => ctx.clone(),
        };
        rules
            .select(&self.uow, &ctx, &self.settings.tolerance)
            .map(|(index, _)| rules.rules[index].name)
    }

    pub fn straight(&mut self, a: DVec2, b: DVec2) -> (VertexHandle, VertexHandle, TrackHandle) {
        let va = self.uow.add_vertex(a, 0.0);
        let vb = self.uow.add_vertex(b, 0.0);
        let shape = TrackShape::Straight { from: a, to: b };
        let t = self.uow.add_track([va, vb], shape);
        apply_shape(&mut self.uow, t, shape);
        (va, vb, t)
    }

    /// Hängt eine Gerade an einen vorhandenen Vertex.
    pub fn straight_from(&mut self, from: VertexHandle, to: DVec2) -> (VertexHandle, TrackHandle) {
        let a = self.uow.vertex(from).position;
        let vb = self.uow.add_vertex(to, 0.0);
        let shape = TrackShape::Straight { from: a, to };
        let t = self.uow.add_track([from, vb], shape);
        apply_shape(&mut self.uow, t, shape);
        (vb, t)
    }

    pub fn assert_continuous(&self) {
        let all: Vec<VertexHandle> = self.uow.vertices().map(|(h, _)| h).collect();
        check_continuity(&self.uow, &all, &self.settings.tolerance)
            .expect("Netz sollte stetig sein");
    }

    /// Seitentest gegen Selbstkreuzung am Vertex `at`.
    ///
    /// Bezug ist die Sehne des an `at` grenzenden Kurvenstücks: Bogenmitte
    /// und Kontrollpunkt der neuen Kurve liegen auf derselben Seite, der
    /// Kontrollpunkt des dort angeschlossenen Tracks auf der anderen.
    pub fn assert_keeps_side(&self, curve: TrackHandle, at: VertexHandle, connected: TrackHandle) {
        let tolerance = &self.settings.tolerance;
        let shape = self.uow.track(curve).shape;
        let p = self.uow.vertex(at).position;
        let (from, to, control, inner) = match shape {
            TrackShape::Curved(arc) => (
                arc.start_point(),
                arc.end_point(),
                shape.control_point(tolerance),
                arc.midpoint(),
            ),
            TrackShape::Free(c) => {
                if c.first.start_point().distance(p) <= c.second.end_point().distance(p) {
                    (c.first.start_point(), c.junction, c.controls[0], c.first.point_at(0.5))
                } else {
                    (c.junction, c.second.end_point(), c.controls[1], c.second.point_at(0.5))
                }
            }
            TrackShape::Straight { .. } => panic!("Kurve erwartet, Gerade gefunden"),
        };
        let neighbour = self.uow.track(connected).shape.control_point(tolerance);

        let own = side_test(from, to, control);
        assert!(own.abs() > 1e-9, "Kontrollpunkt {control} liegt auf der Sehne");
        assert_eq!(
            side_test(from, to, inner).signum(),
            own.signum(),
            "Bogen wölbt sich von seinem Kontrollpunkt weg"
        );
        assert_eq!(
            side_test(from, to, neighbour).signum(),
            -own.signum(),
            "Kurve faltet über den Track an {p} zurück"
        );
    }
}
