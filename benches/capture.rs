use criterion::{black_box, criterion_group, criterion_main, Criterion};
use facegate::capture::{CaptureConfig, FrameCapture, MockVideoSource, VideoSource};

fn open_source(width: u32, height: u32) -> MockVideoSource {
    let mut source = MockVideoSource::new();
    source
        .open(&CaptureConfig::with_dimensions(width, height))
        .unwrap();
    source
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    for (label, width, height) in [("480x360", 480, 360), ("1920x1080", 1920, 1080)] {
        let mut source = open_source(width, height);
        let mut capture = FrameCapture::new();
        group.bench_function(label, |b| {
            b.iter(|| black_box(capture.capture(&mut source)));
        });
    }
    group.finish();
}

fn bench_data_uri(c: &mut Criterion) {
    let mut source = open_source(1280, 720);
    let frame = FrameCapture::new().capture(&mut source).unwrap();
    c.bench_function("data_uri", |b| b.iter(|| black_box(frame.to_data_uri())));
}

criterion_group!(benches, bench_snapshot, bench_data_uri);
criterion_main!(benches);
