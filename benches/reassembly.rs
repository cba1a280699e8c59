use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tileweave::prelude::*;

fn source_clip(width: u32, height: u32, length: usize) -> Clip {
    let frames = (0..length as u32)
        .map(|seed| {
            Frame::from_fn(FrameFormat::YUV420P8, width, height, |plane, x, y| {
                ((x * 3 + y * 5 + plane as u32 * 11 + seed) % 256) as f64
            })
        })
        .collect::<TileResult<Vec<_>>>()
        .expect("source frames");
    Clip::new(frames).expect("source clip")
}

fn bench_untile(c: &mut Criterion) {
    let clip = source_clip(928, 480, 4);
    let spec = TileSpec::new(256, 256).overlap(32).padding(TilePadding::Discard);
    let tiles = tile(&clip, &spec, &Collaborators::new()).expect("tiles");

    let mut group = c.benchmark_group("untile");
    for fade in [false, true] {
        let options = UntileOptions::new().fade(fade);
        group.bench_with_input(BenchmarkId::from_parameter(if fade { "fade" } else { "crop" }), &options, |b, options| {
            b.iter(|| untile(black_box(&tiles), options).expect("untile"))
        });
    }
    group.finish();
}

fn bench_unwindow(c: &mut Criterion) {
    let clip = source_clip(64, 64, 240);
    let windows = window(&clip, &WindowSpec::new(20, 5)).expect("windows");

    let mut group = c.benchmark_group("unwindow");
    for fade in [false, true] {
        let options = UnwindowOptions::new().fade(fade);
        group.bench_with_input(BenchmarkId::from_parameter(if fade { "fade" } else { "drop" }), &options, |b, options| {
            b.iter(|| unwindow(black_box(&windows), options).expect("unwindow"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_untile, bench_unwindow);
criterion_main!(benches);
