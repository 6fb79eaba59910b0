use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use pedigree_layout::graph::PersonProperties;
use pedigree_layout::{
    DynamicPositionedGraph, LayoutContext, LayoutOptions, PedImportOptions, PositionedGraph,
    from_ped,
};
use std::hint::black_box;
use std::time::Duration;

/// A `.ped` pedigree descending from one founder couple: every generation has `width`
/// children, the first son marries in a founder and carries the line on.
fn build_ped(generations: usize, width: usize) -> String {
    let mut lines = Vec::new();
    lines.push("fam f0 0 0 1 1".to_string());
    lines.push("fam m0 0 0 2 1".to_string());
    let (mut father, mut mother) = ("f0".to_string(), "m0".to_string());
    for g in 1..=generations {
        for k in 0..width {
            let sex = if k % 2 == 0 { 1 } else { 2 };
            lines.push(format!("fam c{g}_{k} {father} {mother} {sex} 1"));
        }
        if g < generations {
            lines.push(format!("fam s{g} 0 0 2 1"));
            father = format!("c{g}_0");
            mother = format!("s{g}");
        }
    }
    // the last child is the proband
    let proband = lines.len() - 1;
    lines.swap(0, proband);
    lines.join("\n")
}

fn bench_initial_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("initial_layout");
    group.measurement_time(Duration::from_secs(10));

    let cases = [("gen3_w3", 3usize, 3usize), ("gen5_w4", 5, 4), ("gen8_w5", 8, 5)];
    for (name, generations, width) in cases {
        let imported = from_ped(&build_ped(generations, width), &PedImportOptions::default())
            .expect("benchmark pedigree imports");
        group.bench_with_input(BenchmarkId::new("PositionedGraph::new", name), &imported, |b, imported| {
            b.iter_batched(
                || imported.graph.clone(),
                |gg| {
                    let dg = PositionedGraph::new(
                        black_box(gg),
                        Some(imported.proband),
                        LayoutOptions::default(),
                        None,
                    )
                    .expect("layout succeeds");
                    black_box(dg.max_rank());
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_incremental_edit(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_edit");
    group.measurement_time(Duration::from_secs(10));

    let dg = from_ped(&build_ped(5, 4), &PedImportOptions::default())
        .and_then(|imported| imported.into_layout(LayoutContext::default()))
        .expect("benchmark pedigree lays out");
    let person = dg.all_person_ids()[0];

    group.bench_function("add_new_relationship", |b| {
        b.iter_batched(
            || dg.clone(),
            |mut dg: DynamicPositionedGraph| {
                let changes = dg
                    .add_new_relationship(person, PersonProperties::default(), false, 1)
                    .expect("edit succeeds");
                black_box(changes.moved.len());
            },
            BatchSize::LargeInput,
        )
    });

    group.bench_function("redraw_all", |b| {
        b.iter_batched(
            || dg.clone(),
            |mut dg: DynamicPositionedGraph| {
                black_box(dg.redraw_all().expect("redraw succeeds"));
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_initial_layout, bench_incremental_edit);
criterion_main!(benches);
