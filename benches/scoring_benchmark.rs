use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use typing_tracker::models::{score, ElapsedTime};

fn benchmark_score(c: &mut Criterion) {
    // A realistic practice text: a few paragraphs of code
    let target = concat!(
        "fn main() {\n",
        "    let xs: Vec<u32> = (0..10).collect();\n",
        "    println!(\"{:?}\", xs);\n",
        "}\n",
    )
    .repeat(20);

    // Same text with every tenth character mistyped
    let typed: String = target
        .chars()
        .enumerate()
        .map(|(i, c)| if i % 10 == 0 { '#' } else { c })
        .collect();

    let multibyte_target = "日本語のタイピング練習です。".repeat(50);
    let elapsed = ElapsedTime::from_secs(90);

    let mut group = c.benchmark_group("score");

    group.bench_function("ascii_exact", |b| {
        b.iter(|| score(black_box(&target), black_box(&target), elapsed))
    });

    group.bench_function("ascii_with_errors", |b| {
        b.iter(|| score(black_box(&typed), black_box(&target), elapsed))
    });

    group.bench_function("ascii_half_typed", |b| {
        let half = &target[..target.len() / 2];
        b.iter(|| score(black_box(half), black_box(&target), elapsed))
    });

    group.bench_function("multibyte_exact", |b| {
        b.iter(|| score(black_box(&multibyte_target), black_box(&multibyte_target), elapsed))
    });

    group.finish();
}

criterion_group!(benches, benchmark_score);
criterion_main!(benches);
