//! Benchmarks for the graph transforms.

use coda_core::{Coordinate, Scope, ScopePrecedence};
use coda_resolver::{DependencyGraph, DependencyNode, transform_graph};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

const SCOPES: [&str; 4] = ["compile", "runtime", "provided", "test"];

/// Layered graph: every node depends on a few nodes of the next layer, and
/// every tenth node points back to the root to form cycles.
fn layered_graph(size: usize, fan_out: usize) -> DependencyGraph {
    let node = |id: String, coordinate: &str, scope: &str| {
        DependencyNode::new(id, Coordinate::parse(coordinate).unwrap(), Scope::new(scope))
    };
    let mut graph = DependencyGraph::new(node("root".into(), "org.bench/root/1.0", "compile"));
    let mut indices = vec![graph.root()];
    for i in 1..size {
        let coordinate = format!("org.bench/artifact{}/1.{i}", i % (size / 2 + 1));
        let scope = SCOPES[i % SCOPES.len()];
        indices.push(graph.add_node(node(format!("n{i}"), &coordinate, scope)).unwrap());
    }
    for (i, &from) in indices.iter().enumerate() {
        for k in 1..=fan_out {
            if let Some(&to) = indices.get(i * fan_out + k) {
                graph.add_edge(from, to);
            }
        }
        if i % 10 == 9 {
            graph.add_edge(from, indices[0]);
        }
    }
    graph
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_graph");
    for size in [100, 1_000, 10_000] {
        let graph = layered_graph(size, 3);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("nodes", size), &graph, |b, graph| {
            b.iter(|| {
                let mut graph = graph.clone();
                black_box(transform_graph(&mut graph, ScopePrecedence::default()))
            });
        });
    }
    group.finish();
}

fn bench_json(c: &mut Criterion) {
    let json = layered_graph(1_000, 3).to_json().unwrap();
    c.bench_function("graph_from_json_1000", |b| {
        b.iter(|| black_box(DependencyGraph::from_json(black_box(&json))));
    });
}

criterion_group!(benches, bench_transform, bench_json);
criterion_main!(benches);
