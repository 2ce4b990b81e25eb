use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tiles_metronome::audio::click::{ClickRenderer, ClickSound};
use tiles_metronome::host::TimerQueue;
use tiles_metronome::sim::Simulation;
use tiles_metronome::{ClickConfig, ClickType};

/// Benchmark the click mixer inside the audio callback (critical for real-time performance)
fn bench_click_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("click_render");
    let sample_rate = 48000.0;

    for buffer_size in [64, 256, 512, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(buffer_size),
            &buffer_size,
            |b, &size| {
                let sound = ClickSound::new(sample_rate, &ClickConfig::default());
                let mut renderer = ClickRenderer::new(sound);
                let mut output = vec![0.0f32; size];
                let mut frame = 0u64;
                b.iter(|| {
                    // One click every 0.25s keeps a click active most of the time
                    if frame % 12_000 < size as u64 {
                        renderer.schedule(frame, ClickType::Regular);
                    }
                    renderer.render(frame, &mut output);
                    frame += size as u64;
                    black_box(&output);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the host timer queue with the controller's timer mix
fn bench_timer_queue(c: &mut Criterion) {
    c.bench_function("timer_queue_one_second", |b| {
        b.iter(|| {
            let mut timers = TimerQueue::new();
            timers.schedule_repeating(0.025, 0.025, 0u8);
            timers.schedule_repeating(1.0 / 60.0, 1.0 / 60.0, 1u8);
            let mut fired = 0;
            let mut now = 0.0;
            while now < 1.0 {
                now += 0.001;
                while let Some((_, kind)) = timers.pop_due(now) {
                    fired += kind as usize + 1;
                }
            }
            black_box(fired)
        });
    });
}

/// Benchmark a full minute of simulated metronome at different tempos
fn bench_simulated_minute(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulated_minute");
    group.sample_size(20);

    for bpm in [40i64, 120, 300] {
        group.bench_with_input(BenchmarkId::from_parameter(bpm), &bpm, |b, &bpm| {
            b.iter(|| {
                let mut sim = Simulation::with_jitter(1, 0.01);
                let mut handle = sim.create_handle(bpm);
                let _ = handle.play();
                sim.run_until(&mut handle, 60.0);
                black_box(sim.provider().sounded_clicks().len())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_click_render,
    bench_timer_queue,
    bench_simulated_minute
);
criterion_main!(benches);
