use apm_exporter::metrics::{apm_server_catalog, Collector, ExporterRegistry, DEFAULT_NAMESPACE};
use apm_exporter::snapshot::{ApmServerStats, StaticSnapshot};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;

fn build_collector() -> Collector<ApmServerStats> {
    let mut stats = ApmServerStats::default();
    stats.server.request.count = 1200.0;
    stats.server.response.valid.accepted = 1150.0;
    stats.server.response.errors.ratelimit = 50.0;
    stats.processor.stream.accepted = 9000.0;

    Collector::new(
        apm_server_catalog(DEFAULT_NAMESPACE).unwrap(),
        Arc::new(StaticSnapshot::new(stats)),
    )
}

fn benchmark_evaluation(c: &mut Criterion) {
    c.bench_function("catalog_build", |b| {
        b.iter(|| black_box(apm_server_catalog(DEFAULT_NAMESPACE).unwrap()))
    });

    let collector = build_collector();
    c.bench_function("collect_samples", |b| {
        b.iter(|| black_box(collector.collect().map(|s| s.value).sum::<f64>()))
    });

    c.bench_function("collect_families", |b| {
        b.iter(|| black_box(prometheus::core::Collector::collect(&collector)))
    });

    let registry = ExporterRegistry::new();
    registry.register(build_collector()).unwrap();
    c.bench_function("encode_text", |b| b.iter(|| black_box(registry.encode().unwrap())));
}

criterion_group!(benches, benchmark_evaluation);
criterion_main!(benches);
