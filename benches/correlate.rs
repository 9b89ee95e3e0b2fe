use criterion::{criterion_group, criterion_main, Criterion};
use normxcorr::{correlate_batch, correlate_one, BatchConfig, CorrConfig, Strategy};
use std::hint::black_box;

fn make_channel(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (i as f32 * 0.013).sin() + 0.3 * (i as f32 * 0.041).cos())
        .collect()
}

fn make_template(channel: &[f32], offset: usize, len: usize) -> Vec<f32> {
    channel[offset..offset + len].to_vec()
}

fn bench_correlate(c: &mut Criterion) {
    let channel = make_channel(60_000);
    let template = make_template(&channel, 12_000, 400);

    let time_cfg = CorrConfig {
        strategy: Strategy::TimeDomain,
        ..CorrConfig::default()
    };
    c.bench_function("correlate_one_time_domain", |b| {
        b.iter(|| black_box(correlate_one(&template, &channel, &time_cfg).unwrap()));
    });

    let spectral_cfg = CorrConfig {
        strategy: Strategy::Spectral,
        ..CorrConfig::default()
    };
    c.bench_function("correlate_one_spectral", |b| {
        b.iter(|| black_box(correlate_one(&template, &channel, &spectral_cfg).unwrap()));
    });

    let templates: Vec<Vec<f32>> = (0..4)
        .map(|i| make_template(&channel, 3_000 + i * 5_000, 400))
        .collect();
    let channels: Vec<Vec<f32>> = (0..4).map(|i| make_channel(30_000 + i * 1_000)).collect();
    let tpl_refs: Vec<&[f32]> = templates.iter().map(Vec::as_slice).collect();
    let ch_refs: Vec<&[f32]> = channels.iter().map(Vec::as_slice).collect();

    let batch_cfg = BatchConfig::default();
    c.bench_function("correlate_batch_4x4", |b| {
        b.iter(|| black_box(correlate_batch(&tpl_refs, &ch_refs, &batch_cfg).unwrap()));
    });
}

criterion_group!(benches, bench_correlate);
criterion_main!(benches);
