use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tscn_core::{analyze, lexer::Lexer, parse, serialize};

// ============================================================================
// Test Data
// ============================================================================

const SMALL_SCENE: &str = r#"[gd_scene load_steps=2 format=3]

[ext_resource type="Script" path="res://main.gd" id="1_main"]

[node name="Main" type="Node2D"]
script = ExtResource("1_main")
"#;

const MEDIUM_SCENE: &str = include_str!("../tests/fixtures/menu.tscn");

/// A flat scene with `count` sprites under the root, each with a few properties
/// and one connection.
fn generate_scene(count: usize) -> String {
    let mut scene = String::from(
        "[gd_scene load_steps=2 format=3]\n\n\
         [ext_resource type=\"Texture2D\" path=\"res://icon.svg\" id=\"1_icon\"]\n\n\
         [node name=\"Root\" type=\"Node2D\"]\n\n",
    );
    for i in 0..count {
        scene.push_str(&format!(
            "[node name=\"Sprite{i}\" type=\"Sprite2D\" parent=\".\"]\n\
             position = Vector2({}, {})\n\
             texture = ExtResource(\"1_icon\")\n\
             modulate = Color(1, 1, 1, 0.5)\n\
             metadata = {{\"index\": {i}, \"tags\": [\"a\", \"b\"]}}\n\n",
            i * 16,
            i % 7,
        ));
    }
    for i in 0..count {
        scene.push_str(&format!(
            "[connection signal=\"visibility_changed\" from=\"Sprite{i}\" to=\".\" method=\"_on_visibility_changed\"]\n"
        ));
    }
    scene
}

// ============================================================================
// Lexer Benchmarks
// ============================================================================

fn bench_lexer_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_node_scaling");
    for size in [10, 100, 1000] {
        let source = generate_scene(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| Lexer::new(black_box(src)).lex())
        });
    }
    group.finish();
}

// ============================================================================
// Parser / Writer Benchmarks
// ============================================================================

fn bench_parse_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_by_size");
    for (name, source) in [("small", SMALL_SCENE), ("medium", MEDIUM_SCENE)] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| parse(black_box(src)))
        });
    }
    group.finish();
}

fn bench_parse_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_node_scaling");
    for size in [10, 100, 1000] {
        let source = generate_scene(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, src| {
            b.iter(|| parse(black_box(src)))
        });
    }
    group.finish();
}

fn bench_serialize_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize_node_scaling");
    for size in [10, 100, 1000] {
        let doc = parse(&generate_scene(size));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| serialize(black_box(doc)))
        });
    }
    group.finish();
}

// ============================================================================
// End-to-End Benchmarks
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let source = generate_scene(100);
    c.bench_function("round_trip_100_nodes", |b| {
        b.iter(|| serialize(&parse(black_box(&source))))
    });
}

fn bench_remove_subtree(c: &mut Criterion) {
    let doc = parse(&generate_scene(500));
    c.bench_function("remove_node_500_nodes", |b| {
        b.iter(|| {
            let mut doc = doc.clone();
            doc.remove_node(black_box("Sprite250"))
        })
    });
}

fn bench_analysis_to_json(c: &mut Criterion) {
    let source = generate_scene(100);
    c.bench_function("analyze_to_json_100_nodes", |b| {
        b.iter(|| analyze(black_box(&source), "benchmark.tscn").to_json())
    });
}

criterion_group!(lexer_benches, bench_lexer_scaling);
criterion_group!(
    parser_benches,
    bench_parse_sizes,
    bench_parse_scaling,
    bench_serialize_scaling
);
criterion_group!(
    e2e_benches,
    bench_round_trip,
    bench_remove_subtree,
    bench_analysis_to_json
);
criterion_main!(lexer_benches, parser_benches, e2e_benches);
