// Integration test: Beat timing on the simulated host loop
//
// Clicks must land on the exact beat grid whatever the host timer jitter,
// and the beat indicator must follow the same grid.

use tiles_metronome::sim::Simulation;
use tiles_metronome::{ClickType, MetronomeConfig};

const MAX_DRIFT_SECS: f64 = 0.050;

#[test]
fn test_two_seconds_at_120_bpm() {
    let mut sim = Simulation::new();
    let mut handle = sim.create_handle(120);
    let log = sim.record_beats(&mut handle);

    handle.play().unwrap();
    sim.run_until(&mut handle, 2.0);

    assert_eq!(log.beats(), vec![0, 1, 2, 3]);

    let times: Vec<f64> = sim
        .provider()
        .sounded_clicks()
        .iter()
        .filter(|c| c.host_time < 2.0)
        .map(|c| c.host_time)
        .collect();
    assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5]);
}

#[test]
fn test_accent_on_first_beat_of_measure() {
    let mut sim = Simulation::new();
    let mut handle = sim.create_handle(240);
    handle.play().unwrap();
    sim.run_until(&mut handle, 2.0);

    let clicks = sim.provider().sounded_clicks();
    assert!(clicks.len() >= 8);
    for (i, click) in clicks.iter().enumerate() {
        let expected = if i % 4 == 0 {
            ClickType::Accent
        } else {
            ClickType::Regular
        };
        assert_eq!(click.click, expected, "click {}", i);
    }
}

#[test]
fn test_no_drift_across_tempo_range_with_jitter() {
    for bpm in (40..=300).step_by(13) {
        let mut sim = Simulation::with_jitter(bpm as u64, 0.02);
        let mut handle = sim.create_handle(bpm);
        handle.play().unwrap();
        sim.run_until(&mut handle, 60.0);

        let period = 60.0 / bpm as f64;
        // One minute holds exactly `bpm` beats; keep clear of the beat at 60s
        let clicks: Vec<_> = sim
            .provider()
            .sounded_clicks()
            .into_iter()
            .filter(|c| c.host_time < 60.0 - period / 2.0)
            .collect();
        assert_eq!(clicks.len(), bpm as usize, "{} BPM", bpm);

        for (n, click) in clicks.iter().enumerate() {
            let drift = (click.host_time - n as f64 * period).abs();
            assert!(
                drift < MAX_DRIFT_SECS,
                "{} BPM: beat {} drifted {:.4}s",
                bpm,
                n,
                drift
            );
            assert!(
                click.dispatched_at <= click.clock_time,
                "{} BPM: beat {} dispatched after its time",
                bpm,
                n
            );
        }
        for pair in clicks.windows(2) {
            let spacing = pair[1].host_time - pair[0].host_time;
            assert!((spacing - period).abs() < 1e-6, "{} BPM spacing {}", bpm, spacing);
        }
    }
}

#[test]
fn test_indicator_follows_beat_grid() {
    let mut sim = Simulation::with_jitter(7, 0.01);
    let mut handle = sim.create_handle(90);
    let log = sim.record_beats(&mut handle);
    handle.play().unwrap();
    sim.run_until(&mut handle, 10.0);

    let period = 60.0 / 90.0;
    for (n, (at, beat)) in log.entries().into_iter().enumerate() {
        assert_eq!(beat, Some(n % 4));
        let lag = at - n as f64 * period;
        // Indicator shows a beat no earlier than it sounds, within a few frames
        assert!(lag >= 0.0, "beat {} shown early by {:.4}s", n, -lag);
        assert!(lag < 0.05, "beat {} shown late by {:.4}s", n, lag);
    }
}

#[test]
fn test_mute_never_changes_indicator() {
    let run = |mute_before_play: bool, mute_at: Option<f64>| {
        let mut sim = Simulation::with_jitter(42, 0.015);
        let mut handle = sim.create_handle(150);
        let log = sim.record_beats(&mut handle);
        handle.set_muted(mute_before_play);
        handle.play().unwrap();
        if let Some(at) = mute_at {
            sim.run_until(&mut handle, at);
            handle.set_muted(true);
        }
        sim.run_until(&mut handle, 5.0);
        (log.entries(), sim.provider().sounded_clicks().len())
    };

    let (reference, all_clicks) = run(false, None);
    let (from_start, no_clicks) = run(true, None);
    let (midway, some_clicks) = run(false, Some(2.3));

    assert_eq!(reference, from_start);
    assert_eq!(reference, midway);
    assert_eq!(no_clicks, 0);
    assert!(some_clicks > 0 && some_clicks < all_clicks);
}

#[test]
fn test_three_beat_measure() {
    let config = MetronomeConfig {
        beats_per_measure: 3,
        ..MetronomeConfig::default()
    };
    let mut sim = Simulation::new();
    let mut handle = sim.create_handle_with_config(120, config);
    let log = sim.record_beats(&mut handle);
    handle.play().unwrap();
    sim.run_until(&mut handle, 3.0);
    assert_eq!(log.beats(), vec![0, 1, 2, 0, 1, 2]);
}

#[test]
fn test_silent_fallback_keeps_indicator_running() {
    let mut sim = Simulation::new();
    sim.provider().set_available(false);
    let mut handle = sim.create_handle(120);
    let log = sim.record_beats(&mut handle);

    assert_eq!(handle.play().unwrap(), tiles_metronome::AudioStatus::Silent);
    sim.run_until(&mut handle, 2.0);
    assert_eq!(log.beats(), vec![0, 1, 2, 3]);
    assert!(sim.provider().clicks().is_empty());
}

#[test]
fn test_slow_tick_config_still_sounds_every_beat() {
    let config = MetronomeConfig {
        tick_interval_secs: 0.2,
        ..MetronomeConfig::default()
    };
    let mut sim = Simulation::new();
    let mut handle = sim.create_handle_with_config(120, config);
    handle.play().unwrap();
    sim.run_until(&mut handle, 5.0);

    let clicks: Vec<_> = sim
        .provider()
        .sounded_clicks()
        .into_iter()
        .filter(|c| c.host_time < 4.9)
        .collect();
    let times: Vec<f64> = clicks.iter().map(|c| c.host_time).collect();
    let expected: Vec<f64> = (0..10).map(|n| n as f64 * 0.5).collect();
    assert_eq!(times, expected);
    for click in &clicks {
        assert!(click.dispatched_at <= click.clock_time);
    }
}
