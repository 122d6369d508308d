// SPDX-License-Identifier: MIT
//! Benchmark for container decode, encode and a duplicate round

use criterion::{criterion_group, criterion_main, Criterion};
use shader_container::{ContainerCodec, ShaderContainer, ShaderEntry, ShaderTable, TableMutator, TableRole};
use std::hint::black_box;

fn create_test_container() -> ShaderContainer {
    // 200 profiles, 16KB vertex and 32KB pixel blobs each
    let table = |role: TableRole, size: usize| {
        ShaderTable::from_entries(
            role,
            (0..200)
                .map(|i| ShaderEntry::new(format!("profile_{i:03}"), vec![i as u8; size]))
                .collect(),
        )
    };
    ShaderContainer::new(
        table(TableRole::Vertex, 16 * 1024),
        table(TableRole::Pixel, 32 * 1024),
    )
}

fn benchmark_encode(c: &mut Criterion) {
    let codec = ContainerCodec::new();
    let container = create_test_container();

    c.bench_function("container_encode", |b| {
        b.iter(|| codec.encode_to_vec(black_box(&container)).unwrap())
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let codec = ContainerCodec::new();
    let bytes = codec.encode_to_vec(&create_test_container()).unwrap();

    c.bench_function("container_decode", |b| {
        b.iter(|| codec.decode_slice(black_box(&bytes)).unwrap())
    });
}

fn benchmark_duplicate_round(c: &mut Criterion) {
    let codec = ContainerCodec::new();
    let bytes = codec.encode_to_vec(&create_test_container()).unwrap();

    c.bench_function("container_duplicate_round", |b| {
        b.iter(|| {
            let mut container = codec.decode_slice(black_box(&bytes)).unwrap();
            TableMutator::new()
                .duplicate_in_both(&mut container, "profile_150", "profile_new")
                .unwrap();
            codec.encode_to_vec(&container).unwrap()
        })
    });
}

criterion_group!(
    benches,
    benchmark_encode,
    benchmark_decode,
    benchmark_duplicate_round
);
criterion_main!(benches);
