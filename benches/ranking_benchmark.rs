use criterion::{black_box, criterion_group, criterion_main, Criterion};

use labelkiosk::content::{ContentEntry, ContentRegistry};
use labelkiosk::rank;

fn rank_benchmark(c: &mut Criterion) {
    let labels: Vec<String> = (0..1000).map(|i| format!("label_{}", i)).collect();
    let probs: Vec<f32> = (0..1000).map(|i| ((i * 7919) % 1000) as f32 / 1000.0).collect();

    c.bench_function("rank 1000 labels", |b| {
        b.iter(|| rank(black_box(&labels), black_box(&probs)).unwrap())
    });
}

fn resolve_benchmark(c: &mut Criterion) {
    let mut registry = ContentRegistry::new();
    for i in 0..100 {
        registry.insert(
            format!("label_{}", i),
            ContentEntry {
                texts: vec!["".into(), "  ".into(), "a".into(), "b".into(), "c".into(), "d".into()],
                images: vec!["https://example.com/a.jpg".into(); 10],
                videos: vec!["https://youtu.be/7xmgRLTjxIw".into(); 5],
            },
        );
    }

    c.bench_function("resolve content", |b| {
        b.iter(|| registry.resolve(black_box("label_42")))
    });
}

criterion_group!(benches, rank_benchmark, resolve_benchmark);
criterion_main!(benches);
