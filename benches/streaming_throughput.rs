use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rdf_transform::{
    ExportConfig, LiteralNode, Node, RdfVisitor, RdfWriterSink, ResourceNode, Row, Table,
    Transform, ValueSource, Vocabulary,
};

/// Generate a sensor table for benchmarking
fn generate_table(rows: usize) -> Table {
    Table::new(["id", "sensor", "value", "unit"]).with_rows((0..rows).map(|i| {
        Row::from_values([
            format!("obs{}", i),
            format!("sensor{}", i % 100),
            format!("{}", i % 1000),
            "celsius".to_string(),
        ])
    }))
}

fn observation_transform() -> Transform {
    Transform::new("http://example.org/")
        .with_namespace(Vocabulary::new("sosa", "http://www.w3.org/ns/sosa/"))
        .with_namespace(Vocabulary::new("xsd", "http://www.w3.org/2001/XMLSchema#"))
        .with_root(Node::root(
            ResourceNode::iri("observation", ValueSource::template("observation/{id}"))
                .with_type("sosa:Observation")
                .with_property(
                    "sosa:madeBySensor",
                    Node::nested(ResourceNode::iri(
                        "sensor",
                        ValueSource::template("sensor/{sensor}"),
                    )),
                )
                .with_property(
                    "sosa:hasSimpleResult",
                    Node::literal(
                        LiteralNode::new("value", ValueSource::column("value"))
                            .with_datatype("xsd:integer"),
                    ),
                )
                .with_property(
                    "http://example.org/unit",
                    Node::literal(LiteralNode::new("unit", ValueSource::column("unit"))),
                ),
        ))
}

/// Benchmark: N-Triples export at different flush thresholds
fn benchmark_export_limits(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_limits");
    group.sample_size(10);

    let rows = 10_000;
    let table = generate_table(rows);
    let transform = observation_transform();
    group.throughput(Throughput::Elements(rows as u64));

    // 0 disables mid-row flushes
    for export_limit in [0usize, 2, 100, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(export_limit),
            export_limit,
            |b, &export_limit| {
                b.iter(|| {
                    let mut sink = RdfWriterSink::n_triples(Vec::new());
                    let config = ExportConfig::default().with_export_limit(export_limit);
                    RdfVisitor::new(&transform, &mut sink, config)
                        .build_model(black_box(&table), 0)
                        .unwrap();
                    black_box(sink.finish().unwrap().len())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: preview mode, everything kept in memory
fn benchmark_preview(c: &mut Criterion) {
    let mut group = c.benchmark_group("preview");
    group.sample_size(10);

    let transform = observation_transform();
    for rows in [1_000usize, 10_000, 50_000].iter() {
        let table = generate_table(*rows);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| {
                let mut visitor = RdfVisitor::preview(&transform, ExportConfig::default());
                visitor.build_model(black_box(table), 0).unwrap();
                black_box(visitor.buffer().len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_export_limits, benchmark_preview);
criterion_main!(benches);
