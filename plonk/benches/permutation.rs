use ark_bls12_381::Fr;
use criterion::{criterion_group, criterion_main, Criterion};
use plonk_arith::plonk::{
    constraint_system::{flavor::CircuitFlavor, CircuitBuilder, ConstraintSystem},
    copy_cycles::compute_wire_copy_cycles,
    indexer::compute_proving_key,
    permutation::compute_permutation_polynomials,
};

fn build_circuit(flavor: CircuitFlavor, num_gates: usize) -> CircuitBuilder<Fr> {
    let mut cs = CircuitBuilder::<Fr>::with_flavor(flavor);
    let x = cs.add_public_variable(Fr::from(3u64));
    let mut acc = cs.add_variable(Fr::from(1u64));
    for _ in 0..num_gates / 2 {
        let sum = cs.add(acc, x);
        acc = cs.mul(sum, x);
    }
    cs.finalize_circuit();
    cs
}

fn bench_permutation(c: &mut Criterion) {
    let mut group = c.benchmark_group("bench_permutation");
    for flavor in [CircuitFlavor::Turbo, CircuitFlavor::StandardHonk] {
        let cs = build_circuit(flavor, 4000);
        let n = cs.circuit_subgroup_size();
        group.bench_function(format!("copy_cycles_{:?}", flavor), |b| {
            b.iter(|| compute_wire_copy_cycles(&cs))
        });
        let cycles = compute_wire_copy_cycles(&cs);
        group.bench_function(format!("sigma_{:?}", flavor), |b| {
            b.iter(|| compute_permutation_polynomials(&cs, &cycles, n).unwrap())
        });
    }
    group.sample_size(10);
    let cs = build_circuit(CircuitFlavor::Ultra, 4000);
    group.bench_function("proving_key_Ultra", |b| {
        b.iter(|| compute_proving_key(&cs).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_permutation);
criterion_main!(benches);
