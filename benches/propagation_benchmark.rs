use std::cell::RefCell;

use criterion::{criterion_group, criterion_main, Criterion};

use variant_sudoku::codec;
use variant_sudoku::exclusions::CellExclusions;
use variant_sudoku::handler_set::HandlerSet;
use variant_sudoku::lookup::lookup_tables;
use variant_sudoku::optimizer::Optimizer;
use variant_sudoku::value_set::{Mask16, ValueSet};
use variant_sudoku::ConstraintSpec;

const CLASSIC_NINE_BY_NINE: &str =
    "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79";

fn criterion_benchmark(c: &mut Criterion) {
    let (shape, fixed_values) = codec::decode_short_text(CLASSIC_NINE_BY_NINE).unwrap();
    let spec = ConstraintSpec {
        shape,
        fixed_values,
        sudoku_x: false,
        no_boxes: false,
        nodes: Vec::new(),
    };
    let resolved = spec.resolve::<Mask16>();
    let shape = resolved.shape.shape;
    let fixed_values = resolved.shape.fixed_values;

    let tables = lookup_tables(shape.num_values as u8);
    let mut handler_set = HandlerSet::new(resolved.handlers);
    Optimizer::run(&shape, &resolved.houses, &resolved.sums, tables, &mut handler_set);

    let exclusions = CellExclusions::build(shape.num_cells, &handler_set.exclusion_groups());
    let mut seed_grid = vec![Mask16::full(shape.num_values as _); shape.num_cells];
    handler_set
        .initialize_all(&mut seed_grid, &exclusions, &shape)
        .expect("the classic puzzle's givens do not contradict each other");
    handler_set.post_initialize_all(&seed_grid);

    let full_grid: Vec<Mask16> = {
        let mut grid = vec![Mask16::full(shape.num_values as _); shape.num_cells];
        for (cell, value) in &fixed_values {
            grid[*cell] = Mask16::from_value(value.index());
        }
        grid
    };

    // `HandlerSet::enforce` needs `&mut self`, but `iter_batched`'s setup and
    // routine closures both close over it; the `RefCell` lets the setup
    // closure's borrow (for `new_accumulator`) end before the routine
    // closure takes its own.
    let handler_set = RefCell::new(handler_set);
    c.bench_function("propagate classic 9x9 givens to a fixpoint", |b| {
        b.iter_batched(
            || {
                let queue = handler_set.borrow().new_accumulator(shape.num_cells);
                (full_grid.clone(), queue)
            },
            |(mut grid, mut queue)| {
                let mut handler_set = handler_set.borrow_mut();
                handler_set.enqueue_all(&mut queue);
                handler_set.enforce(&mut grid, &mut queue)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
