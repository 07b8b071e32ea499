use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::Vec2;
use terra_terrain::*;

fn bench_generate_local(c: &mut Criterion) {
    let field = NoiseField::new();
    let params = NoiseParameters::default();
    c.bench_function("noise_generate_241_local", |bencher| {
        bencher.iter(|| black_box(field.generate(241, 241, black_box(&params))))
    });
}

fn bench_generate_global(c: &mut Criterion) {
    let field = NoiseField::new();
    let params = NoiseParameters {
        normalize_mode: NormalizeMode::Global,
        ..Default::default()
    };
    c.bench_function("noise_generate_241_global", |bencher| {
        bencher.iter(|| black_box(field.generate(241, 241, black_box(&params))))
    });
}

fn bench_map_data(c: &mut Criterion) {
    let field = NoiseField::new();
    let settings = MapGenSettings {
        noise: NoiseParameters::default(),
        regions: Regions::default_palette(),
        chunk_vertices: STANDARD_CHUNK_VERTICES,
        border: 1,
    };
    c.bench_function("map_data_standard_chunk", |bencher| {
        bencher.iter(|| black_box(settings.generate(&field, black_box(Vec2::new(238.0, -476.0)))))
    });
}

criterion_group!(benches, bench_generate_local, bench_generate_global, bench_map_data);
criterion_main!(benches);
