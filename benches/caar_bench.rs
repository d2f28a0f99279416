//! Benchmarks for the primitive-equation RHS kernel.
//!
//! Run with: `cargo bench --bench caar_bench`
//!
//! Measures one full RHS evaluation over a batch of cells, serial and pooled,
//! and compares the two column scan strategies.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use se_dycore::element::{Element, ElementGeometry, Elements, ReferenceElement};
use se_dycore::field::{ScalarField, VectorField};
use se_dycore::{CaarFunctor, DycoreConfig, ScanStrategy};

const NP: usize = 4;
const NUM_LEVELS: usize = 72;

fn setup_elements(reference: &ReferenceElement, n: usize) -> Elements {
    let x = reference.nodes().to_vec();
    Elements::new(
        (0..n)
            .map(|_| {
                let mut elem = Element::new(ElementGeometry::flat(reference), NUM_LEVELS, 0);
                let layout = elem.layout();
                for tl in 0..3 {
                    *elem.state.t.get_mut(tl) =
                        ScalarField::from_fn(NP, layout, |i, j, k| 220.0 + k as f64 + x[i] - x[j]);
                    elem.state.dp3d.get_mut(tl).fill(1000.0);
                    *elem.state.v.get_mut(tl) = VectorField::from_fn(NP, layout, |c, i, j, _| {
                        if c == 0 { 10.0 + x[j] } else { x[i] * x[j] }
                    });
                }
                elem
            })
            .collect(),
    )
}

fn bench_caar_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("caar_run");
    group.sample_size(20);

    let reference = ReferenceElement::shared(NP);
    for num_elements in [16, 96] {
        for concurrency in [1, 8] {
            let config = DycoreConfig::new(NP, NUM_LEVELS);
            let mut elements = setup_elements(&reference, num_elements);
            let mut caar = CaarFunctor::new(&config, reference.clone()).expect("valid config");
            caar.allocate_buffers(concurrency, num_elements)
                .expect("allocation");
            caar.set_rk_stage_data(0, 1, 2, 300.0, 1.0, false)
                .expect("stage data");

            group.bench_with_input(
                BenchmarkId::new(format!("concurrency_{concurrency}"), num_elements),
                &num_elements,
                |b, _| {
                    b.iter(|| caar.run(black_box(&mut elements)).expect("run"));
                },
            );
        }
    }

    group.finish();
}

fn bench_scan_strategy(c: &mut Criterion) {
    let mut group = c.benchmark_group("caar_scan_strategy");
    group.sample_size(20);

    let reference = ReferenceElement::shared(NP);
    let num_elements = 32;
    for (name, scan) in [
        ("serial", ScanStrategy::Serial),
        ("work_efficient", ScanStrategy::WorkEfficient),
    ] {
        let config = DycoreConfig::new(NP, NUM_LEVELS).with_scan(scan);
        let mut elements = setup_elements(&reference, num_elements);
        let mut caar = CaarFunctor::new(&config, reference.clone()).expect("valid config");
        caar.allocate_buffers(1, num_elements).expect("allocation");
        caar.set_rk_stage_data(0, 1, 2, 300.0, 1.0, false)
            .expect("stage data");

        group.bench_function(name, |b| {
            b.iter(|| caar.run(black_box(&mut elements)).expect("run"));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_caar_run, bench_scan_strategy);
criterion_main!(benches);
