// Tiles Metronome - Command-line metronome on the default audio output
//
// Usage: tiles-metronome [BPM|random] [SECONDS] [CONFIG.ron]
//        tiles-metronome --list-devices
// The output device is chosen by `output_device` in the config file.
// Set RUST_LOG=debug to trace transport transitions.

use std::path::Path;
use std::time::Duration;
use tiles_metronome::{AudioStatus, CpalClockProvider, MetronomeConfig, MetronomeHandle, Tempo};
use tracing_subscriber::EnvFilter;

const DEFAULT_RUN_SECS: f64 = 8.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("--list-devices") {
        println!("=== Output devices ===");
        for name in CpalClockProvider::list_output_devices() {
            println!("  {}", name);
        }
        return;
    }

    let config = match args.get(2) {
        Some(path) => match MetronomeConfig::load(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return;
            }
        },
        None => MetronomeConfig::default(),
    };

    let default_tempo = Tempo::new(config.default_tempo as i64);
    let tempo = match args.first().map(String::as_str) {
        Some("random") => Tempo::random_inspiration(&mut rand::thread_rng()),
        Some(text) => Tempo::parse(text, default_tempo),
        None => default_tempo,
    };
    let run_secs = args
        .get(1)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_RUN_SECS);

    println!("=== Tiles Metronome ===");
    println!("{} for {:.1}s\n", tempo, run_secs);

    let mut metronome = MetronomeHandle::with_default_audio(tempo.bpm() as i64, config);
    metronome.on_beat(|beat| match beat {
        Some(0) => println!("  ● accent"),
        Some(i) => println!("  ○ beat {}", i + 1),
        None => println!("  (stopped)"),
    });

    match metronome.play() {
        Ok(AudioStatus::Audible) => {}
        Ok(AudioStatus::Silent) => println!("No audio output, running silently"),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return;
        }
    }

    let Some(start) = metronome.host_now() else {
        return;
    };
    let end = start + run_secs;

    loop {
        metronome.pump();
        let Some(now) = metronome.host_now() else {
            break;
        };
        if now >= end {
            break;
        }
        let wake = metronome.next_deadline().unwrap_or(end).min(end);
        let wait = (wake - now).max(0.0);
        if wait > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(wait));
        }
    }

    metronome.pause();
    metronome.dispose();
}
