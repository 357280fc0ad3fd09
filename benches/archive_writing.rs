//! Benchmarks for archive assembly
//!
//! Measures CRC-32 throughput, full zip construction across entry counts,
//! and output name sanitization.

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pixport::export::naming::sanitize_file_name;
use pixport_archive::{crc32, ZipWriter};

/// Deterministic pseudo-image payload.
fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

fn bench_crc32(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let data = payload(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("payload", size), &data, |b, data| {
            b.iter(|| crc32(black_box(data)));
        });
    }

    group.finish();
}

fn bench_archive_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive_build");
    let modified = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let data = payload(256 * 1024);

    for entries in [1usize, 10, 100] {
        group.throughput(Throughput::Bytes((entries * data.len()) as u64));
        group.bench_with_input(
            BenchmarkId::new("entries", entries),
            &entries,
            |b, &entries| {
                b.iter(|| {
                    let mut writer = ZipWriter::new();
                    for i in 0..entries {
                        writer
                            .add_entry(&format!("image_{i}.png"), black_box(&data), modified)
                            .unwrap();
                    }
                    writer.build()
                });
            },
        );
    }

    group.finish();
}

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize_file_name");

    let clean = "holiday_photo_2024.jpg";
    let dirty = "  my <holiday>  photos: day/1 | take?2*  .jpeg";

    group.bench_with_input(BenchmarkId::new("name", "clean"), &clean, |b, name| {
        b.iter(|| sanitize_file_name(black_box(name), "png"));
    });
    group.bench_with_input(BenchmarkId::new("name", "dirty"), &dirty, |b, name| {
        b.iter(|| sanitize_file_name(black_box(name), "png"));
    });

    group.finish();
}

criterion_group!(benches, bench_crc32, bench_archive_build, bench_sanitize);
criterion_main!(benches);
