//! Condition/Case-Regelwerk.
//!
//! Jede Bearbeitung ist ein [`RuleSet`]: eine optionale Eingangs-Bedingung,
//! ein optionaler Eingangs-Modifier und eine geordnete Liste von Regeln
//! `(Bedingung, Modifier, Case)`. Die erste passende Regel gewinnt.

use super::bridge::ImportBridge;
use super::records::{TrackHandle, VertexHandle};
use super::session::EditSettings;
use super::topology::{Anchor, anchor_heading};
use super::unit_of_work::UnitOfWork;
use crate::core::{TrackKind, WorldBounds};
use crate::error::EditFailure;
use crate::geometry::{
    Tolerance, arc_between_tangents, direction, heading_of, intersection,
    line_from_point_and_tangent, opposite, project_onto_rail, same_heading, tangents_parallel,
};
use glam::DVec2;

/// Abstand einer Junction zu den Enden ihres Master-Tracks (Parameter).
pub const JUNCTION_MARGIN: f64 = 1e-6;

/// Bearbeitungs-Modus: alternative Varianten (Biegen statt Schienen etc.).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EditMode {
    #[default]
    Default,
    Alternate,
}

/// Vertex-Slot eines Kontexts: vorhandener Record oder neue Position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Endpoint {
    Existing(VertexHandle),
    Fresh(DVec2),
}

/// Eingaben einer Bearbeitung, wie sie Bedingungen und Cases sehen.
#[derive(Debug, Clone, PartialEq)]
pub struct EditContext {
    pub vertices: Vec<Endpoint>,
    pub tracks: Vec<TrackHandle>,
    pub points: Vec<DVec2>,
    pub mode: EditMode,
    pub target_kind: Option<TrackKind>,
    /// Track, der neu berechnet wird und daher nicht als Anker zählt
    pub subject: Option<TrackHandle>,
    pub bounds: WorldBounds,
}

impl EditContext {
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            vertices: Vec::new(),
            tracks: Vec::new(),
            points: Vec::new(),
            mode: EditMode::Default,
            target_kind: None,
            subject: None,
            bounds,
        }
    }

    pub fn with_vertex(mut self, endpoint: Endpoint) -> Self {
        self.vertices.push(endpoint);
        self
    }

    pub fn with_track(mut self, track: TrackHandle) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn with_point(mut self, point: DVec2) -> Self {
        self.points.push(point);
        self
    }

    pub fn with_mode(mut self, mode: EditMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_target_kind(mut self, kind: TrackKind) -> Self {
        self.target_kind = Some(kind);
        self
    }

    /// Handle im Vertex-Slot, falls dort ein vorhandener Vertex liegt.
    pub fn handle(&self, slot: usize) -> Option<VertexHandle> {
        match self.vertices.get(slot)? {
            Endpoint::Existing(handle) => Some(*handle),
            Endpoint::Fresh(_) => None,
        }
    }

    /// Handle im Vertex-Slot; fehlt es, ist der Kontext inkonsistent.
    pub fn require(&self, slot: usize) -> Result<VertexHandle, EditFailure> {
        self.handle(slot).ok_or(EditFailure::MissingContext {
            reason: "Vertex fehlt im Kontext",
        })
    }

    /// Track im Track-Slot; fehlt er, ist der Kontext inkonsistent.
    pub fn require_track(&self, slot: usize) -> Result<TrackHandle, EditFailure> {
        self.tracks.get(slot).copied().ok_or(EditFailure::MissingContext {
            reason: "Track fehlt im Kontext",
        })
    }

    pub fn point(&self, index: usize) -> Result<DVec2, EditFailure> {
        self.points.get(index).copied().ok_or(EditFailure::MissingContext {
            reason: "Zielpunkt fehlt im Kontext",
        })
    }

    pub fn position(&self, uow: &UnitOfWork, slot: usize) -> Option<DVec2> {
        match self.vertices.get(slot)? {
            Endpoint::Existing(handle) => uow.get_vertex(*handle).map(|v| v.position),
            Endpoint::Fresh(p) => Some(*p),
        }
    }

    pub fn track_count(&self, uow: &UnitOfWork, slot: usize) -> Option<usize> {
        match self.vertices.get(slot)? {
            Endpoint::Existing(handle) => uow.get_vertex(*handle).map(|v| v.track_count()),
            Endpoint::Fresh(_) => Some(0),
        }
    }

    /// Alle Handles im Kontext gehören zu `uow` und sind noch gültig.
    pub fn handles_known(&self, uow: &UnitOfWork) -> bool {
        let vertices = self.vertices.iter().all(|endpoint| match endpoint {
            Endpoint::Existing(handle) => uow.contains_vertex(*handle),
            Endpoint::Fresh(_) => true,
        });
        vertices
            && self.tracks.iter().all(|t| uow.contains_track(*t))
            && self.subject.is_none_or(|t| uow.contains_track(t))
    }

    /// Position, auf die ein Track aus `slot` zuläuft.
    fn counterpart(&self, uow: &UnitOfWork, slot: usize) -> Option<DVec2> {
        if self.vertices.len() >= 2 && slot < 2 {
            self.position(uow, 1 - slot)
        } else {
            self.points.first().copied()
        }
    }

    /// Anker des Vertex in `slot` für einen Track in Richtung Gegenstück.
    pub fn anchor(&self, uow: &UnitOfWork, slot: usize) -> Anchor {
        let Some(handle) = self.handle(slot) else {
            return Anchor::Free;
        };
        let here = uow.vertex(handle).position;
        let reference = self
            .counterpart(uow, slot)
            .map_or(DVec2::ZERO, |there| there - here);
        anchor_heading(uow, handle, self.subject, reference)
    }

    /// Prüft einen Punkt gegen die Welt-Grenzen.
    pub fn ensure_within(&self, p: DVec2) -> Result<(), EditFailure> {
        if self.bounds.contains(p) {
            Ok(())
        } else {
            Err(EditFailure::OutOfBounds { x: p.x, y: p.y })
        }
    }
}

// ── Bedingungen ─────────────────────────────────────────────────────────

/// Primitive Prüfungen über einem Kontext.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    VertexTrackCount { slot: usize, count: usize },
    VertexTrackCountAtMost { slot: usize, max: usize },
    VertexIsJunction { slot: usize },
    /// Einziger Track des Vertex hat den Typ
    TrackOfVertexKindIs { slot: usize, kind: TrackKind },
    TrackKindIs { slot: usize, kind: TrackKind },
    TargetKindIs(TrackKind),
    TargetKindDiffers { slot: usize },
    /// Ein Endpunkt des Tracks verweist noch auf nicht importierte Tracks
    TrackMissingContext { slot: usize },
    TrackHasOpenEnd { slot: usize },
    VertexOnTrack { vertex: usize, track: usize },
    /// Ein Nachbar des Subjekt-Tracks hat den Typ
    NeighborKindIs(TrackKind),
    ModeIs(EditMode),
    /// Vertex gibt eine Richtung vor (oder die Richtung ist noch unbekannt)
    Anchored { slot: usize },
    ChordAlignedWithAnchor { slot: usize },
    SingleArcFits,
    AnchorsParallel,
    AnchorsConverge,
    EndsDistinct,
    EndsShareTrack,
    ParameterInside { track: usize, point: usize },
}

impl Predicate {
    pub fn evaluate(&self, uow: &UnitOfWork, ctx: &EditContext, tolerance: &Tolerance) -> bool {
        match *self {
            Predicate::VertexTrackCount { slot, count } => ctx.track_count(uow, slot) == Some(count),
            Predicate::VertexTrackCountAtMost { slot, max } => {
                ctx.track_count(uow, slot).is_some_and(|n| n <= max)
            }
            Predicate::VertexIsJunction { slot } => ctx
                .handle(slot)
                .and_then(|h| uow.get_vertex(h))
                .is_some_and(|v| v.is_junction()),
            Predicate::TrackOfVertexKindIs { slot, kind } => ctx
                .handle(slot)
                .and_then(|h| uow.sole_track(h))
                .is_some_and(|t| uow.track(t).kind() == kind),
            Predicate::TrackKindIs { slot, kind } => {
                track_at(uow, ctx, slot).is_some_and(|t| uow.track(t).kind() == kind)
            }
            Predicate::TargetKindIs(kind) => ctx.target_kind == Some(kind),
            Predicate::TargetKindDiffers { slot } => match (track_at(uow, ctx, slot), ctx.target_kind)
            {
                (Some(t), Some(kind)) => uow.track(t).kind() != kind,
                _ => false,
            },
            Predicate::TrackMissingContext { slot } => track_at(uow, ctx, slot).is_some_and(|t| {
                uow.track(t)
                    .vertices
                    .iter()
                    .any(|v| uow.vertex(*v).has_unresolved())
            }),
            Predicate::TrackHasOpenEnd { slot } => track_at(uow, ctx, slot).is_some_and(|t| {
                uow.track(t).vertices.iter().any(|v| {
                    let record = uow.vertex(*v);
                    record.track_count() == 1 && !record.is_junction()
                })
            }),
            Predicate::VertexOnTrack { vertex, track } => {
                match (ctx.handle(vertex), track_at(uow, ctx, track)) {
                    (Some(v), Some(t)) => uow.track(t).end_of(v).is_some(),
                    _ => false,
                }
            }
            Predicate::NeighborKindIs(kind) => {
                let Some(subject) = ctx.subject.filter(|t| uow.contains_track(*t)) else {
                    return false;
                };
                uow.track(subject).vertices.iter().any(|v| {
                    !uow.vertex(*v).is_junction()
                        && uow
                            .other_track(*v, Some(subject))
                            .and_then(|r| uow.resolve(r))
                            .is_some_and(|n| uow.track(n).kind() == kind)
                })
            }
            Predicate::ModeIs(mode) => ctx.mode == mode,
            Predicate::Anchored { slot } => !ctx.anchor(uow, slot).is_free(),
            Predicate::ChordAlignedWithAnchor { slot } => {
                let (Some(here), Some(there)) = (ctx.position(uow, slot), ctx.counterpart(uow, slot))
                else {
                    return false;
                };
                ctx.anchor(uow, slot)
                    .heading()
                    .is_some_and(|h| same_heading(h, heading_of(there - here), tolerance.angular))
            }
            Predicate::SingleArcFits => match fixed_pair(uow, ctx) {
                Some(((p0, h0), (p1, h1))) => {
                    arc_between_tangents(p0, h0, p1, opposite(h1), tolerance).is_some()
                }
                None => false,
            },
            Predicate::AnchorsParallel => fixed_pair(uow, ctx)
                .is_some_and(|((_, h0), (_, h1))| tangents_parallel(h0, h1, tolerance.angular)),
            Predicate::AnchorsConverge => fixed_pair(uow, ctx).is_some_and(|((p0, h0), (p1, h1))| {
                let rail0 = line_from_point_and_tangent(p0, h0);
                let rail1 = line_from_point_and_tangent(p1, h1);
                intersection(&rail0, &rail1, tolerance.linear).is_some_and(|i| {
                    (i - p0).dot(direction(h0)) > tolerance.linear
                        && (i - p1).dot(direction(h1)) > tolerance.linear
                })
            }),
            Predicate::EndsDistinct => {
                let (Some(a), Some(b)) = (ctx.position(uow, 0), ctx.position(uow, 1)) else {
                    return false;
                };
                let same_record = matches!(
                    (ctx.handle(0), ctx.handle(1)),
                    (Some(x), Some(y)) if x == y
                );
                !same_record && !tolerance.points_coincide(a, b)
            }
            Predicate::EndsShareTrack => match (ctx.handle(0), ctx.handle(1)) {
                (Some(a), Some(b)) => uow
                    .get_vertex(a)
                    .is_some_and(|v| v.staged_tracks().any(|t| uow.track(t).end_of(b).is_some())),
                _ => false,
            },
            Predicate::ParameterInside { track, point } => {
                match (track_at(uow, ctx, track), ctx.points.get(point)) {
                    (Some(t), Some(p)) => {
                        let parameter = uow.track(t).shape.nearest_parameter(*p, tolerance);
                        parameter > JUNCTION_MARGIN && parameter < 1.0 - JUNCTION_MARGIN
                    }
                    _ => false,
                }
            }
        }
    }
}

fn track_at(uow: &UnitOfWork, ctx: &EditContext, slot: usize) -> Option<TrackHandle> {
    ctx.tracks
        .get(slot)
        .copied()
        .filter(|t| uow.contains_track(*t))
}

/// Positionen und Abfahrts-Richtungen beider Enden, falls beide verankert sind.
fn fixed_pair(uow: &UnitOfWork, ctx: &EditContext) -> Option<((DVec2, f64), (DVec2, f64))> {
    let h0 = ctx.anchor(uow, 0).heading()?;
    let h1 = ctx.anchor(uow, 1).heading()?;
    Some(((ctx.position(uow, 0)?, h0), (ctx.position(uow, 1)?, h1)))
}

/// Zusammengesetzte Bedingung.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Always,
    Test(Predicate),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn test(predicate: Predicate) -> Self {
        Condition::Test(predicate)
    }

    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::And(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Condition::Or(conditions.into_iter().collect())
    }

    pub fn not(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    pub fn evaluate(&self, uow: &UnitOfWork, ctx: &EditContext, tolerance: &Tolerance) -> bool {
        match self {
            Condition::Always => true,
            Condition::Test(predicate) => predicate.evaluate(uow, ctx, tolerance),
            Condition::And(all) => all.iter().all(|c| c.evaluate(uow, ctx, tolerance)),
            Condition::Or(any) => any.iter().any(|c| c.evaluate(uow, ctx, tolerance)),
            Condition::Not(inner) => !inner.evaluate(uow, ctx, tolerance),
        }
    }
}

// ── Modifier ────────────────────────────────────────────────────────────

/// Umformung eines Kontexts vor der Bedingungs-Prüfung.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Verankerten Endpunkt in Slot 0 bringen
    AnchoredEndFirst,
    /// Zielpunkt auf die Tangenten-Schiene des Vertex projizieren
    ProjectOntoRail { slot: usize, point: usize },
    /// Einrasten: `[v] + [T]` wird zu `[u, w, v] + [S, T]` mit dem fernen Ende
    /// `u` von `v`s Track `S` und dem nächsten offenen Ende `w` von `T`
    NearestOpenEndOfTrack,
}

impl Modifier {
    /// `None`, wenn sich der Kontext nicht umformen lässt.
    pub fn apply(
        &self,
        uow: &UnitOfWork,
        ctx: &EditContext,
        tolerance: &Tolerance,
    ) -> Option<EditContext> {
        match *self {
            Modifier::AnchoredEndFirst => {
                let mut out = ctx.clone();
                if out.vertices.len() >= 2
                    && ctx.anchor(uow, 0).is_free()
                    && !ctx.anchor(uow, 1).is_free()
                {
                    out.vertices.swap(0, 1);
                }
                Some(out)
            }
            Modifier::ProjectOntoRail { slot, point } => {
                let vertex = uow.get_vertex(ctx.handle(slot)?)?;
                let target = *ctx.points.get(point)?;
                let (projected, _) = project_onto_rail(vertex.position, vertex.tangent, target);
                let mut out = ctx.clone();
                out.points[point] = projected;
                Some(out)
            }
            Modifier::NearestOpenEndOfTrack => {
                let v = ctx.handle(0)?;
                let target = *ctx.tracks.first()?;
                let own = uow.sole_track(v)?;
                let u = uow.track(own).other_vertex(v)?;
                let here = uow.vertex(v).position;
                let w = uow
                    .get_track(target)?
                    .vertices
                    .into_iter()
                    .filter(|w| {
                        let record = uow.vertex(*w);
                        *w != v && record.track_count() == 1 && !record.is_junction()
                    })
                    .min_by(|a, b| {
                        let da = uow.vertex(*a).position.distance(here);
                        let db = uow.vertex(*b).position.distance(here);
                        da.total_cmp(&db)
                    })?;
                if tolerance.points_coincide(uow.vertex(u).position, uow.vertex(w).position) {
                    return None;
                }
                let mut out = ctx.clone();
                out.vertices = vec![
                    Endpoint::Existing(u),
                    Endpoint::Existing(w),
                    Endpoint::Existing(v),
                ];
                out.tracks = vec![own, target];
                out.subject = Some(own);
                Some(out)
            }
        }
    }
}

// ── Regeln und Dispatch ─────────────────────────────────────────────────

pub type CaseFn<T> = fn(&mut UnitOfWork, &EditContext, &EditSettings) -> Result<T, EditFailure>;

/// Eine Regel: Bedingung, optionaler Modifier und Case.
pub struct Rule<T> {
    pub name: &'static str,
    pub condition: Condition,
    pub modifier: Option<Modifier>,
    pub case: CaseFn<T>,
}

impl<T> Rule<T> {
    pub fn new(name: &'static str, condition: Condition, case: CaseFn<T>) -> Self {
        Self {
            name,
            condition,
            modifier: None,
            case,
        }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }
}

/// Ergebnis einer Bearbeitung.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome<T> {
    /// Keine Regel passt; nichts wurde verändert
    NotApplicable,
    Applied(T),
    /// Regel passte, Ausführung scheiterte; Zustand wiederhergestellt
    Failed(EditFailure),
}

impl<T> EditOutcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            EditOutcome::Applied(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> EditOutcome<U> {
        match self {
            EditOutcome::NotApplicable => EditOutcome::NotApplicable,
            EditOutcome::Applied(value) => EditOutcome::Applied(f(value)),
            EditOutcome::Failed(failure) => EditOutcome::Failed(failure),
        }
    }
}

/// Geordnetes Regelwerk einer Bearbeitung.
pub struct RuleSet<T> {
    pub name: &'static str,
    pub initial: Condition,
    pub initial_modifier: Option<Modifier>,
    pub rules: Vec<Rule<T>>,
}

impl<T> RuleSet<T> {
    pub fn new(name: &'static str, initial: Condition) -> Self {
        Self {
            name,
            initial,
            initial_modifier: None,
            rules: Vec::new(),
        }
    }

    pub fn with_initial_modifier(mut self, modifier: Modifier) -> Self {
        self.initial_modifier = Some(modifier);
        self
    }

    pub fn rule(mut self, rule: Rule<T>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }

    /// Erste passende Regel samt umgeformtem Kontext (ohne Import).
    pub fn select(
        &self,
        uow: &UnitOfWork,
        ctx: &EditContext,
        tolerance: &Tolerance,
    ) -> Option<(usize, EditContext)> {
        self.rules.iter().enumerate().find_map(|(index, rule)| {
            let candidate = match rule.modifier {
                Some(modifier) => modifier.apply(uow, ctx, tolerance)?,
                None => ctx.clone(),
            };
            rule.condition
                .evaluate(uow, &candidate, tolerance)
                .then_some((index, candidate))
        })
    }

    /// Bekannte Handles und erfüllte Eingangs-Bedingung.
    pub fn accepts(&self, uow: &UnitOfWork, ctx: &EditContext, tolerance: &Tolerance) -> bool {
        if !ctx.handles_known(uow) {
            log::debug!("{}: unbekanntes Handle im Kontext", self.name);
            return false;
        }
        self.initial.evaluate(uow, ctx, tolerance)
    }

    /// Prüft die Eingangs-Bedingung, formt um, importiert den Kontext und
    /// führt die erste passende Regel aus.
    pub fn dispatch(
        &self,
        uow: &mut UnitOfWork,
        bridge: &ImportBridge<'_>,
        ctx: EditContext,
        settings: &EditSettings,
    ) -> EditOutcome<T> {
        let tolerance = &settings.tolerance;
        if !self.accepts(uow, &ctx, tolerance) {
            log::debug!("{}: Eingangs-Bedingung nicht erfuellt", self.name);
            return EditOutcome::NotApplicable;
        }
        let ctx = match self.initial_modifier {
            Some(modifier) => match modifier.apply(uow, &ctx, tolerance) {
                Some(ctx) => ctx,
                None => return EditOutcome::NotApplicable,
            },
            None => ctx,
        };
        bridge.resolve_context(uow, &ctx);

        let Some((index, ctx)) = self.select(uow, &ctx, tolerance) else {
            log::debug!("{}: keine Regel passt", self.name);
            return EditOutcome::NotApplicable;
        };
        let rule = &self.rules[index];
        log::debug!("{}: Regel '{}' gewaehlt", self.name, rule.name);
        match (rule.case)(uow, &ctx, settings) {
            Ok(value) => EditOutcome::Applied(value),
            Err(failure) => {
                log::warn!("{}/{}: {failure}", self.name, rule.name);
                EditOutcome::Failed(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests;
