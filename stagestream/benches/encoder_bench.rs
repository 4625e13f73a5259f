//! Benchmarks for SSE encoding and pipeline construction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stagestream::core::JobEvent;
use stagestream::encoding::StreamEncoder;
use stagestream::pipeline::{blueprint, PipelineBuilder, StageDefinition};

fn encoder_benchmark(c: &mut Criterion) {
    let started = JobEvent::started("market_analyst");
    let report = JobEvent::final_result("# Report\n\n".repeat(200));

    c.bench_function("encode_started", |b| {
        b.iter(|| StreamEncoder::encode(black_box(&started)))
    });
    c.bench_function("encode_final_result_2kb", |b| {
        b.iter(|| StreamEncoder::encode(black_box(&report)))
    });
    c.bench_function("encode_heartbeat", |b| {
        b.iter(|| StreamEncoder::encode(black_box(&JobEvent::Heartbeat)))
    });
}

fn pipeline_benchmark(c: &mut Criterion) {
    c.bench_function("build_venture_pipeline", |b| {
        b.iter(|| black_box(blueprint::venture_analysis()))
    });

    // 50 stages, each depending on the one before.
    let chain: Vec<StageDefinition> = (0..50)
        .map(|i| {
            let def = StageDefinition::new(format!("s{i}"));
            if i == 0 {
                def
            } else {
                def.with_dependency(format!("s{}", i - 1))
            }
        })
        .collect();
    c.bench_function("build_chain_50", |b| {
        b.iter(|| {
            black_box(PipelineBuilder::from_definitions("chain", chain.clone()).build())
        })
    });
}

criterion_group!(benches, encoder_benchmark, pipeline_benchmark);
criterion_main!(benches);
