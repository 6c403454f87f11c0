use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mathdrill_core::generate::instantiate;
use mathdrill_core::schema::parse_exercise_str;

const GEOMETRY: &str = r#"{
    "id": "isosceles",
    "visual_engine": "GEOMETRY",
    "visual_config": {
        "points": [ { "x": 0, "y": 0 }, { "x": 4, "y": 0 }, { "x": 2, "y": "{h}" } ],
        "codings": [ { "type": "tick", "points": [0, 2] }, { "type": "tick", "points": [1, 2] } ]
    },
    "levels": {
        "1": { "variables": { "h": "randint(2, 6)" }, "question": "h = {h}", "correct_answer": "{h}" },
        "2": { "variables": { "h": "random(1, 3)" }, "question": "h = {h}", "correct_answer": "{h}",
               "visual_config": { "scale": 2 } }
    }
}"#;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_exercise");

    group.bench_function("geometry", |b| {
        b.iter(|| parse_exercise_str(black_box(GEOMETRY)))
    });

    let invalid = GEOMETRY.replace("\"tick\"", "\"arc\"");
    group.bench_function("geometry_invalid", |b| {
        b.iter(|| parse_exercise_str(black_box(&invalid)))
    });

    group.finish();
}

fn bench_instantiate(c: &mut Criterion) {
    let mut group = c.benchmark_group("instantiate");
    let desc = parse_exercise_str(GEOMETRY).unwrap();

    group.bench_function("level_1", |b| {
        b.iter(|| instantiate(black_box(&desc), "1", black_box(42)))
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_instantiate);
criterion_main!(benches);
