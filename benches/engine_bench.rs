//! Criterion benchmarks for the recitation engine.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tajweed_check::analyze::analyze;
use tajweed_check::matcher::match_verse;
use tajweed_check::normalize::normalize;
use tajweed_check::similarity::similar;
use tajweed_check::verses::VERSES;

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");

    let pairs = [
        ("word", "المستقيم", "المستقيمي"),
        ("phonetic", "السراط", "الصراط"),
        ("verse", VERSES[6].text, "صراط الذين انعمت عليهمو غير المغضوب عليهمو ولا الضالين"),
    ];

    for (name, a, b) in pairs {
        group.bench_with_input(BenchmarkId::new("similar", name), &name, |bench, _| {
            bench.iter(|| similar(black_box(a), black_box(b)))
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_closing_verse", |b| {
        b.iter(|| normalize(black_box(VERSES[6].text)))
    });
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_verse");

    // One input per stage: whole verse, keyword, full window search
    let inputs = [
        ("whole_verse", "الحمد لله رب العالمين"),
        ("keyword", "رب العالمين"),
        ("window", "رب"),
        ("no_match", "قل هو الله احد"),
    ];

    for (name, text) in inputs {
        group.bench_with_input(BenchmarkId::new("stage", name), &text, |b, text| {
            b.iter(|| match_verse(black_box(text)))
        });
    }

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for verse in &VERSES {
        group.bench_with_input(
            BenchmarkId::new("perfect", verse.index),
            &verse.index,
            |b, &index| b.iter(|| analyze(index, black_box(verse.text))),
        );
    }

    group.bench_function("mistakes", |b| {
        b.iter(|| {
            analyze(
                6,
                black_box("كتاب الذين انعمت عليهمو قلم المغضوب عليهمو الضالين زيادة"),
            )
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_similarity,
    bench_normalize,
    bench_matching,
    bench_analysis
);
criterion_main!(benches);
