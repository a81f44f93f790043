use criterion::{criterion_group, criterion_main, Criterion};

use variant_sudoku::handlers::all_different::enforce_all_different;
use variant_sudoku::types::CellIndex;
use variant_sudoku::value_set::{Mask16, ValueSet};

fn criterion_benchmark(c: &mut Criterion) {
    const NUM_VALUES: u8 = 16;

    let full_set = Mask16::full(NUM_VALUES);
    let cells = (0..NUM_VALUES as usize).collect::<Vec<CellIndex>>();

    c.bench_function("enforce_all_different full", |b| {
        b.iter_batched(
            || vec![full_set; NUM_VALUES as usize],
            |mut grid| enforce_all_different(&mut grid, &cells),
            criterion::BatchSize::SmallInput,
        );
    });

    c.bench_function("enforce_all_different solved", |b| {
        let solved: Vec<Mask16> = (0..NUM_VALUES).map(Mask16::from_value).collect();
        b.iter_batched(
            || solved.clone(),
            |mut grid| enforce_all_different(&mut grid, &cells),
            criterion::BatchSize::SmallInput,
        );
    });

    c.bench_function("enforce_all_different partial", |b| {
        let mut partial = vec![full_set; NUM_VALUES as usize];
        partial[5] = Mask16::from_iter([0, 1]);
        partial[7] = Mask16::from_iter([0, 1, 3]);
        partial[0] = Mask16::from_iter(0..9);

        b.iter_batched(
            || partial.clone(),
            |mut grid| enforce_all_different(&mut grid, &cells),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
