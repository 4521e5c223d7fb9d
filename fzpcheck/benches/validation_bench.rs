use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fzpcheck::prelude::*;
use std::io;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn bench_check_part(c: &mut Criterion) {
    let selection = CheckSelection::from_names(&["all"]).unwrap();
    let mut runner = CheckerRunner::with_writer(
        fixture_path("core/hybrid_connectors.fzp"),
        CheckOptions::default(),
        io::sink(),
    );

    c.bench_function("check_hybrid_connectors", |b| {
        b.iter(|| runner.check(black_box(&selection.fzp), black_box(&selection.svg)));
    });
}

fn bench_parse_svg(c: &mut Criterion) {
    let path = fixture_path("svg/core/pcb/hybrid_connectors_pcb.svg");
    let content = std::fs::read_to_string(&path).unwrap();

    c.bench_function("parse_pcb_svg", |b| {
        b.iter(|| Document::parse(black_box(&content)));
    });
}

criterion_group!(benches, bench_check_part, bench_parse_svg);
criterion_main!(benches);
