mod logging;
mod settings;

use clap::Parser;
use polyline_track::{Target, Track};
use settings::Settings;

fn main() {
    logging::setup_logging();
    let settings = Settings::parse();

    let tracks = match Track::load_from_file(&settings.gpx_file) {
        Ok(tracks) => tracks,
        Err(err) => {
            tracing::error!("Failed to load {}: {}", settings.gpx_file.display(), err);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Loaded {} track(s) from {}",
        tracks.len(),
        settings.gpx_file.display()
    );

    for track in tracks {
        for fragment in process(track, &settings) {
            println!("{}", summarize(&fragment));
        }
    }
}

/// Apply the requested edits to one track, returning the resulting fragments
fn process(mut track: Track, settings: &Settings) -> Vec<Track> {
    let (before, after) = track.edit(|engine| {
        engine.trim_to(
            settings.trim_before.as_deref().map(Target::Time),
            settings.trim_after.as_deref().map(Target::Time),
        )
    });
    tracing::debug!(
        before = before.map_or(0, |t| t.len()),
        after = after.map_or(0, |t| t.len()),
        "Trimmed points"
    );

    let removed = track.edit(|engine| engine.remove_at_any(settings.remove.iter()));
    if removed.len() < settings.remove.len() {
        tracing::warn!(
            "Removed {} of {} requested points",
            removed.len(),
            settings.remove.len()
        );
    }

    if settings.elevation {
        track.edit(|engine| {
            engine.add_elevation_properties();
            true
        });
    }

    track.split_by_times(&settings.split_at)
}

/// One-line human readable summary of a track
fn summarize(track: &Track) -> String {
    let engine = track.engine();
    let name = track.name().unwrap_or("(unnamed)");
    let size = engine.size();
    let span = engine
        .time_range()
        .map(|range| format!("{} .. {}", range.start_time, range.end_time))
        .unwrap_or_else(|| "-".to_string());
    let length_km = engine.total_length() / 1000.0;
    let speed = engine
        .total_duration()
        .filter(|seconds| *seconds > 0.0)
        .map(|seconds| format!("{:.1} km/h", engine.total_length() / seconds * 3.6))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{name}: {} points, {} segments, {span}, {length_km:.3} km, avg {speed}",
        size.vertices, size.segments
    )
}
