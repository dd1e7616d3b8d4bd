use criterion::{black_box, criterion_group, criterion_main, Criterion};

use stereo_cloud::block_match::Params;
use stereo_cloud::prelude::*;

fn texture(x: usize, y: usize) -> i32 {
    ((13 * x * x + 7 * y + 3 * x * y) % 251) as i32
}

fn block_match_bench(c: &mut Criterion) {

    // Build a shifted synthetic pair
    let left = IntensityArray::from_fn(160, 120, texture);
    let right = IntensityArray::from_fn(160, 120, |x, y| texture(x + 6, y));
    let pair = StereoPair::new(left, right).unwrap();

    // Build disparity alg
    let matcher = BlockMatcher::new(Params {
        window_size: 11,
        search_range: 44
    }).unwrap();

    c.bench_function("block_match 160x120", |b| b.iter(|| matcher.compute(black_box(&pair))));

    // Refinement of the matched disparity
    let disp = matcher.compute(&pair).unwrap();
    let refiner = Refiner::new(Default::default()).unwrap();

    c.bench_function("refine 149x109", |b| b.iter(|| refiner.refine(black_box(&disp))));
}

criterion_group!(benches, block_match_bench);
criterion_main!(benches);
