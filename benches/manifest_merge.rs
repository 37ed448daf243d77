//! Benchmarks for manifest merging.
//!
//! These benchmarks measure deep-merging manifest fragments of growing width
//! and depth, and a full generation plan over the default web preset.

use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value};
use zero_scaffold::generator::{initial_manifest, Environment, Generator};
use zero_scaffold::manifest::{Manifest, ManifestMerger, MismatchPolicy};
use zero_scaffold::preset::Preset;
use zero_scaffold::registry::PluginRegistry;

/// A manifest with `width` dependencies and `width` scripts
fn wide_manifest(width: usize, prefix: &str) -> Manifest {
    let dependencies: Map<String, Value> = (0..width)
        .map(|i| (format!("{}-dep-{}", prefix, i), json!(format!("^{}.0.0", i))))
        .collect();
    let scripts: Map<String, Value> = (0..width)
        .map(|i| (format!("task-{}", i), json!(format!("run {} {}", prefix, i))))
        .collect();
    Manifest::from_value(json!({
        "name": prefix,
        "dependencies": dependencies,
        "scripts": scripts,
    }))
    .unwrap()
}

/// A manifest nested `depth` objects deep under `config`
fn deep_manifest(depth: usize, leaf: &str) -> Manifest {
    let mut value = json!({ "leaf": leaf, "list": [leaf] });
    for level in (0..depth).rev() {
        value = json!({ format!("level{}", level): value });
    }
    Manifest::from_value(json!({ "config": value })).unwrap()
}

fn bench_merge_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest_merge_width");
    let merger = ManifestMerger::new(MismatchPolicy::Warn);

    for width in [10, 100, 1000] {
        let base = wide_manifest(width, "base");
        let fragment = wide_manifest(width, "fragment");
        group.bench_with_input(
            BenchmarkId::new("keys", width),
            &(base, fragment),
            |b, (base, fragment)| b.iter(|| merger.merge(black_box(base), black_box(fragment))),
        );
    }

    group.finish();
}

fn bench_merge_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest_merge_depth");
    let merger = ManifestMerger::new(MismatchPolicy::Warn);

    for depth in [4, 16, 64] {
        let base = deep_manifest(depth, "base");
        let fragment = deep_manifest(depth, "fragment");
        group.bench_with_input(
            BenchmarkId::new("levels", depth),
            &(base, fragment),
            |b, (base, fragment)| b.iter(|| merger.merge(black_box(base), black_box(fragment))),
        );
    }

    group.finish();
}

fn bench_canonical_serialization(c: &mut Criterion) {
    let manifest = wide_manifest(200, "demo");
    c.bench_function("manifest_canonical_string", |b| {
        b.iter(|| black_box(&manifest).to_canonical_string())
    });
}

fn bench_web_default_plan(c: &mut Criterion) {
    let registry = PluginRegistry::builtin().unwrap();
    let preset = Preset::web_default().with_project_name("demo");
    let target = PathBuf::from("demo");

    c.bench_function("plan_web_default", |b| {
        b.iter(|| {
            let plugins = registry.resolve(black_box(&preset)).unwrap();
            Generator::new(&target, plugins, initial_manifest("demo"))
                .with_environment(Environment::new(&target, false))
                .plan()
        })
    });
}

criterion_group!(
    benches,
    bench_merge_width,
    bench_merge_depth,
    bench_canonical_serialization,
    bench_web_default_plan
);
criterion_main!(benches);
