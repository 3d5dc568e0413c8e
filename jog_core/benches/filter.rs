use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use jog_core::config::TrackingCfg;
use jog_core::{PositionTracker, SampleFilter};

// Noisy potentiometer trace: slow ramp with xorshift jitter
fn synth_trace(n: usize, jitter: u16, seed: u32) -> Vec<u16> {
    let mut state = seed.max(1);
    let mut next = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        x
    };
    (0..n)
        .map(|i| {
            let base = ((i * 4095) / n.max(1)) as u16;
            let noise = (next() % u32::from(jitter.max(1))) as u16;
            base.saturating_add(noise).min(4095)
        })
        .collect()
}

pub fn bench_median(c: &mut Criterion) {
    let mut g = c.benchmark_group("median");
    // Quick tweaking without CLI flags:
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p jog_core --bench filter
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let trace = synth_trace(10_000, 40, 0xC0FFEE);

    g.bench_function("push_and_filter", |b| {
        b.iter_batched(
            || trace.clone(),
            |samples| {
                let mut f: SampleFilter = SampleFilter::new();
                for s in samples {
                    f.push_sample(s);
                    black_box(f.filtered_value());
                }
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("tracker_plan", |b| {
        b.iter_batched(
            || (PositionTracker::new(TrackingCfg::default()), trace.clone()),
            |(mut t, samples)| {
                for s in samples {
                    if let Some(m) = t.observe(s) {
                        black_box(t.plan(s, m));
                    }
                }
            },
            BatchSize::SmallInput,
        )
    });
    g.finish();
}

criterion_group!(filter, bench_median);
criterion_main!(filter);
