use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lzenvelope::container::{decode_bytes, encode_bytes};
use lzenvelope::LzmaEngine;

fn bench_encode(c: &mut Criterion) {
    let engine = LzmaEngine::new();
    let zeros = vec![0u8; 1024 * 1024];
    let text = b"the quick brown fox jumps over the lazy dog. ".repeat(16 * 1024);

    c.bench_function("container_encode_1mb_zeros", |b| {
        b.iter(|| encode_bytes(&engine, black_box(&zeros)).unwrap())
    });
    c.bench_function("container_encode_720kb_text", |b| {
        b.iter(|| encode_bytes(&engine, black_box(&text)).unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    let engine = LzmaEngine::new();
    let packed = encode_bytes(&engine, &vec![42u8; 1024 * 1024]).unwrap();

    c.bench_function("container_decode_1mb", |b| {
        b.iter(|| decode_bytes(&engine, black_box(&packed)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
