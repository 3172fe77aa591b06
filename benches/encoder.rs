//! Throughput benchmarks for the streaming encoder over corpora with very
//! different matchability: all-zero, cyclic text, and pseudo-random noise.

use std::io;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lz4stream::StreamEncoder;

const CORPUS_LEN: usize = 1 << 20;

fn corpora() -> Vec<(&'static str, Vec<u8>)> {
    let zeros = vec![0u8; CORPUS_LEN];
    let text: Vec<u8> = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. "
        .iter()
        .copied()
        .cycle()
        .take(CORPUS_LEN)
        .collect();
    let mut state = 0x853C_49E6_748F_EA9Bu64;
    let noise: Vec<u8> = (0..CORPUS_LEN)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect();
    vec![("zeros", zeros), ("text", text), ("noise", noise)]
}

fn bench_stream_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream_encode");
    for (name, data) in corpora() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &data, |b, data| {
            b.iter(|| {
                let mut encoder = StreamEncoder::new(io::sink());
                encoder.write(data).unwrap();
                encoder.close().unwrap();
            });
        });
    }
    group.finish();
}

fn bench_chunked_writes(c: &mut Criterion) {
    let data: Vec<u8> = b"chunked write overhead measurement corpus "
        .iter()
        .copied()
        .cycle()
        .take(CORPUS_LEN)
        .collect();
    let mut group = c.benchmark_group("chunked_writes");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for chunk in [64usize, 4096, 65536] {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), &chunk, |b, &chunk| {
            b.iter(|| {
                let mut encoder = StreamEncoder::new(io::sink());
                for piece in data.chunks(chunk) {
                    encoder.write(piece).unwrap();
                }
                encoder.close().unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_stream_encode, bench_chunked_writes);
criterion_main!(benches);
