//! Gleisnetz-Editor: Kommandozeilen-Demo.
//!
//! Legt einen kurzen Streckenzug an, gibt die Vorschau als JSON aus und
//! übernimmt ihn in die Welt.

use anyhow::Context;
use track_network_editor::{EditMode, EditorOptions, TrackEditor, TrackKind};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Gleisnetz-Editor v{} startet...", env!("CARGO_PKG_VERSION"));

    let options = EditorOptions::load_from_file(&EditorOptions::config_path());
    let mut editor = TrackEditor::new(options);

    let end = editor
        .create_track(0.0, 0.0, 40.0, 0.0)
        .context("Gerade konnte nicht angelegt werden")?;
    let curve = editor
        .extend_track(end, 80.0, 25.0, EditMode::Alternate)
        .context("Bogen konnte nicht angeschlossen werden")?;
    if !editor.convert_track(curve, TrackKind::Free) {
        log::warn!("Umwandlung in freie Kurve nicht moeglich");
    }

    let preview = editor.preview();
    println!("{}", serde_json::to_string_pretty(preview.as_ref())?);

    let report = editor.commit()?;
    log::info!(
        "{} Vertices und {} Tracks angelegt",
        report.created_vertices,
        report.created_tracks
    );
    Ok(())
}
