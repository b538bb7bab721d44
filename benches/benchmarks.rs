use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ldb_hnsw::engine::{EngineMetadata, MockEngine};
use ldb_hnsw::hnsw::{check_mem, get_label, populate_init_options, HnswOptions, Unaccounted};
use ldb_hnsw::vector::{to_float4_array, ArrayData};
use ldb_hnsw::ItemPointer;

fn benchmark_label_encoding(c: &mut Criterion) {
    c.bench_function("get_label", |b| {
        let mut block = 0u32;
        b.iter(|| {
            block = block.wrapping_add(1);
            black_box(get_label(&ItemPointer::new(block, (block % 291) as u16)));
        });
    });
}

fn benchmark_check_mem(c: &mut Criterion) {
    let index = HnswOptions { dim: 128, ..Default::default() };
    let engine =
        MockEngine::with_metadata(EngineMetadata::for_options(&populate_init_options(&index)));

    c.bench_function("check_mem", |b| {
        b.iter(|| {
            black_box(check_mem(
                65536,
                Some(&index),
                &engine,
                black_box(10_000),
                "over budget",
                &Unaccounted,
            ));
        });
    });
}

fn benchmark_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_float4_array");

    for dims in [3, 128, 1536] {
        let ints: Vec<i32> = (0..dims as i32).collect();
        let floats: Vec<f32> = ints.iter().map(|&v| v as f32).collect();

        group.bench_with_input(BenchmarkId::new("int4", dims), &ints, |b, ints| {
            b.iter(|| black_box(to_float4_array(&ArrayData::Int4(ints)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("float4", dims), &floats, |b, floats| {
            b.iter(|| black_box(to_float4_array(&ArrayData::Float4(floats)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_label_encoding,
    benchmark_check_mem,
    benchmark_normalize
);

criterion_main!(benches);
