#![no_main]

use arbitrary::Arbitrary;
use glam::DVec2;
use libfuzzer_sys::fuzz_target;
use track_network_engine::{
    CommitError, CommitRejection, EditMode, EditSession, EditSettings, TrackKind, World,
    WorldBounds,
};

/// Ein Schritt der Bearbeitungs-Folge.
#[derive(Debug, Arbitrary)]
enum Step {
    Create { from: (i16, i16), to: (i16, i16) },
    Extend { vertex: u8, to: (i16, i16), alternate: bool },
    Move { vertex: u8, to: (i16, i16), alternate: bool },
    Convert { track: u8, kind: u8 },
    Bind { first: u8, second: u8 },
    Snap { vertex: u8, track: u8 },
    Junction { track: u8, at: (i16, i16) },
}

fn point((x, y): (i16, i16)) -> DVec2 {
    DVec2::new(f64::from(x) / 8.0, f64::from(y) / 8.0)
}

fn mode(alternate: bool) -> EditMode {
    if alternate {
        EditMode::Alternate
    } else {
        EditMode::Default
    }
}

fuzz_target!(|steps: Vec<Step>| {
    let mut world = World::new(WorldBounds::centered(2048.0), 64.0);
    let mut session = EditSession::new(EditSettings::default());

    for step in steps.into_iter().take(32) {
        let vertices: Vec<_> = session.unit_of_work().vertices().map(|(h, _)| h).collect();
        let tracks: Vec<_> = session.unit_of_work().tracks().map(|(h, _)| h).collect();
        let pick_vertex = |i: u8| vertices.get(usize::from(i) % vertices.len().max(1)).copied();
        let pick_track = |i: u8| tracks.get(usize::from(i) % tracks.len().max(1)).copied();

        match step {
            Step::Create { from, to } => {
                session.create_track(&world, point(from), point(to));
            }
            Step::Extend { vertex, to, alternate } => {
                if let Some(v) = pick_vertex(vertex) {
                    session.extend_track(&world, v, point(to), mode(alternate));
                }
            }
            Step::Move { vertex, to, alternate } => {
                if let Some(v) = pick_vertex(vertex) {
                    session.move_vertex(&world, v, point(to), mode(alternate));
                }
            }
            Step::Convert { track, kind } => {
                let kind = match kind % 3 {
                    0 => TrackKind::Straight,
                    1 => TrackKind::Curved,
                    _ => TrackKind::Free,
                };
                if let Some(t) = pick_track(track) {
                    session.convert_track(&world, t, kind);
                }
            }
            Step::Bind { first, second } => {
                if let (Some(a), Some(b)) = (pick_vertex(first), pick_vertex(second)) {
                    session.bind_vertices(&world, a, b);
                }
            }
            Step::Snap { vertex, track } => {
                if let (Some(v), Some(t)) = (pick_vertex(vertex), pick_track(track)) {
                    session.snap_track(&world, v, t);
                }
            }
            Step::Junction { track, at } => {
                if let Some(t) = pick_track(track) {
                    session.create_junction(&world, t, point(at));
                }
            }
        }
    }

    // Jede angewendete Folge ist stetig und lässt sich übernehmen
    match session.commit(&mut world) {
        Ok(_) => {}
        Err(CommitError::Rejected(CommitRejection::Discontinuous(detail))) => {
            panic!("unstetiger Endzustand: {detail}")
        }
        Err(other) => panic!("Commit fehlgeschlagen: {other}"),
    }
});
