//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stagechain::prelude::*;

fn increment(name: String) -> FnStage<impl Fn(u64) -> StageResult<u64> + Send + Sync> {
    FnStage::new(name, |x: u64| Ok(x.wrapping_add(1)))
}

fn pipeline_benchmark(c: &mut Criterion) {
    let aggregating = (0..16).fold(Pipeline::new("bench"), |p, i| p.with_stage(increment(format!("inc{i}"))));
    c.bench_function("aggregating_16", |b| {
        b.iter(|| aggregating.execute(black_box(0)))
    });

    let mut linked = LinkedPipeline::new("bench");
    for i in 0..16 {
        linked.append_stage(increment(format!("inc{i}")));
    }
    c.bench_function("linked_16", |b| b.iter(|| linked.execute(black_box(0))));

    let chain = ChainExecutor::new(FnFallback::new(|_: &mut HandlingContext<u64>| Ok(())))
        .with_handler(FnHandler::new("odd", |n: &u64| n % 2 == 1, |ctx: &mut HandlingContext<u64>| {
            ctx.mark_handled("odd");
            Ok(())
        }));
    c.bench_function("handler_chain", |b| b.iter(|| chain.handle(black_box(3))));
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
