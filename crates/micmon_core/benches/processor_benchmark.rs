//! Callback processor benchmarks
//!
//! Measures the per-block cost of the real-time passthrough path.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use micmon_core::{
    block_size, BlockHandler, CallbackProcessor, EngineConfig, ErrorReporter, StreamStatus,
    SAMPLE_RATE,
};

fn benchmark_processor(c: &mut Criterion) {
    let mut group = c.benchmark_group("callback_processor");

    // Block sizes for the minimum, default and maximum latency settings
    for latency_ms in [5, 20, 100] {
        let frames = block_size(latency_ms, SAMPLE_RATE) as usize;
        let config = Arc::new(EngineConfig::new(80, latency_ms));
        let errors = Arc::new(ErrorReporter::new());
        let mut processor = CallbackProcessor::new(config, errors);

        let input: Vec<f32> = (0..frames).map(|i| (i as f32 * 0.001).sin()).collect();
        let mut output = vec![0.0_f32; frames];

        group.throughput(Throughput::Elements(frames as u64));
        group.bench_function(format!("process_{}ms_{}_frames", latency_ms, frames), |b| {
            b.iter(|| {
                processor.process(
                    black_box(&input),
                    black_box(&mut output),
                    StreamStatus::default(),
                );
            })
        });
    }

    group.finish();
}

fn benchmark_fault_reporting(c: &mut Criterion) {
    let config = Arc::new(EngineConfig::default());
    let errors = Arc::new(ErrorReporter::new());
    let mut processor = CallbackProcessor::new(config, errors);
    let input = vec![0.5_f32; 882];
    let mut output = vec![0.0_f32; 882];
    let underflow = StreamStatus {
        output_underflow: true,
        ..Default::default()
    };

    c.bench_function("process_with_underflow", |b| {
        b.iter(|| {
            processor.process(black_box(&input), black_box(&mut output), underflow);
        })
    });
}

criterion_group!(benches, benchmark_processor, benchmark_fault_reporting);
criterion_main!(benches);
