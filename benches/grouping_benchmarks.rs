//! Benchmarks for metadata parsing, aggregation, partitioning, and frame
//! decoding.
//!
//! Run with: cargo bench
//!
//! The decoding benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path, time::Duration};

use criterion::Criterion;
use ffmpeg_next::util::log::Level as LogLevel;
use framegrab::{FfmpegFrameExtractor, MetadataRecord, Timecode, aggregate, partition};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// Records shaped like a real split: many sources, a few sequences each.
fn synthetic_records(count: usize) -> Vec<MetadataRecord> {
    (0..count)
        .map(|index| MetadataRecord {
            source_identifier: format!("https://www.youtube.com/watch?v={:011}", index / 4),
            sequence_name: format!("{index:016x}"),
            timestamps: (0..120).map(|frame| 45_045_000 + frame * 33_367).collect(),
        })
        .collect()
}

fn benchmark_metadata_parsing(criterion: &mut Criterion) {
    let mut contents = String::from("https://www.youtube.com/watch?v=abc123\n");
    for frame in 0..300_u64 {
        contents.push_str(&format!(
            "{} 0.48 0.85 0.50 0.50 0.0 0.0 0.99 -0.01 0.02 0.1 0.01 0.99 -0.03 0.2 -0.02 0.03 0.99 -1.5\n",
            45_045_000 + frame * 33_367
        ));
    }

    criterion.bench_function("parse 300-line metadata file", |bencher| {
        bencher.iter(|| {
            MetadataRecord::parse(Path::new("0a1b2c3d.txt"), black_box(&contents)).unwrap()
        });
    });
}

fn benchmark_aggregation(criterion: &mut Criterion) {
    let records = synthetic_records(10_000);

    criterion.bench_function("aggregate 10k records", |bencher| {
        bencher.iter(|| aggregate(black_box(records.clone())));
    });
}

fn benchmark_partition(criterion: &mut Criterion) {
    let groups = aggregate(synthetic_records(10_000));

    criterion.bench_function("partition 2.5k groups into 8 shards", |bencher| {
        bencher.iter(|| partition(black_box(groups.clone()), 8).unwrap());
    });
}

fn benchmark_timecode(criterion: &mut Criterion) {
    criterion.bench_function("format 10k timecodes", |bencher| {
        bencher.iter(|| {
            for millis in (0..10_000_u64).map(|step| step * 3_723) {
                black_box(Timecode::from_millis(millis).to_string());
            }
        });
    });
}

fn benchmark_frame_decoding(criterion: &mut Criterion) {
    ffmpeg_next::util::log::set_level(LogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let extractor = FfmpegFrameExtractor::new();
    criterion.bench_function("decode frame (mid-video seek)", |bencher| {
        bencher.iter(|| {
            extractor
                .decode_frame(Path::new(SAMPLE_VIDEO), Duration::from_millis(2500))
                .unwrap()
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_metadata_parsing,
    benchmark_aggregation,
    benchmark_partition,
    benchmark_timecode,
    benchmark_frame_decoding,
);
criterion::criterion_main!(benches);
