use env_logger::{Builder, Env};
use log::LevelFilter;
use lyric_roll::lyrics::load_lyrics;
use lyric_roll::messaging::channels::drain_events;
use lyric_roll::{
    CharTokenizer, EditorConfig, Exporter, LyricTokenizer, NoteTimeline, PitchTable,
    PlaybackEvent, PlaybackScheduler, SharedTempo, Tempo, create_event_channel,
    default_tone_player,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const DEFAULT_LYRICS: &str = "きらきらひかる";

// Twinkle twinkle: (pitch, start beat, length in beats)
const MELODY: [(&str, u32, u32); 7] = [
    ("C5", 0, 1),
    ("C5", 1, 1),
    ("G5", 2, 1),
    ("G5", 3, 1),
    ("A5", 4, 1),
    ("A5", 5, 1),
    ("G5", 6, 2),
];

fn usage() -> ! {
    eprintln!("Usage: lyric_roll <output-stem> [lyrics.txt] [config.ron]");
    std::process::exit(2);
}

fn main() -> Result<(), lyric_roll::Error> {
    Builder::from_env(Env::default().default_filter_or(LevelFilter::Info.to_string())).init();

    let mut args = std::env::args().skip(1);
    let stem = PathBuf::from(args.next().unwrap_or_else(|| usage()));
    let lyrics_path = args.next();
    let config = match args.next() {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };

    let tempo = SharedTempo::new(Tempo::new(config.initial_tempo_bpm)?);
    let timeline = Arc::new(NoteTimeline::new());
    for (name, start, length) in MELODY {
        let row = PitchTable::index_of(name).unwrap_or(0);
        timeline.add(row, start, length)?;
    }

    let text = match lyrics_path {
        Some(path) => load_lyrics(path)?,
        None => DEFAULT_LYRICS.to_string(),
    };
    let assigned = timeline.assign_lyrics(&CharTokenizer.tokenize(&text));
    log::info!("Attached {assigned} lyric tokens");

    let midi_path = stem.with_extension("mid");
    let lab_path = stem.with_extension("lab");
    let summary = Exporter::new(config.midi).export(
        &timeline,
        &tempo,
        Some(&midi_path),
        Some(&lab_path),
    )?;
    log::info!(
        "Exported {} notes at {} to {} and {}",
        summary.notes,
        summary.tempo,
        midi_path.display(),
        lab_path.display()
    );

    // Stop one beat after the last note instead of at the end of the full scene
    let mut playback_config = config.clone();
    playback_config.scene_length_beats = timeline.end_beat() as f64 + 1.0;

    let (events_tx, mut events_rx) = create_event_channel(config.event_capacity);
    let scheduler = PlaybackScheduler::new(
        Arc::clone(&timeline),
        tempo,
        default_tone_player(),
        lyric_roll::EventSink::new(events_tx),
        playback_config,
    );

    scheduler.start();
    'playback: loop {
        thread::sleep(Duration::from_millis(50));
        for event in drain_events(&mut events_rx) {
            match event {
                PlaybackEvent::Triggered { id, pitch_index } => {
                    let lyric = timeline.get(id).map(|n| n.lyric).unwrap_or_default();
                    let pitch = PitchTable::get(pitch_index)
                        .map(|p| p.name())
                        .unwrap_or_default();
                    log::info!("♪ {pitch} {lyric}");
                }
                PlaybackEvent::Finished { beat } => {
                    log::info!("Finished at beat {beat:.2}");
                    break 'playback;
                }
                _ => {}
            }
        }
        if !scheduler.is_running() {
            break;
        }
    }
    scheduler.stop(true);

    // Let the last tone ring out
    thread::sleep(Duration::from_millis(500));
    Ok(())
}
