//! Forward-pass benchmark across sequence lengths

use aprender::autograd::Tensor;
use aprender::nn::Module;
use citecls_model::mask::padding_mask;
use citecls_model::{ClassifierConfig, SequenceClassifier};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn bench_forward(c: &mut Criterion) {
    let config = ClassifierConfig {
        vocab_size: 1000,
        max_seq_len: 256,
        n_layer: 2,
        n_head: 4,
        n_embd: 128,
        num_classes: 40,
        dropout: Some(0.0),
        seed: Some(42),
    };
    let mut model = SequenceClassifier::new(config);
    model.eval();

    let mut group = c.benchmark_group("classifier_forward");
    for &seq_len in &[32usize, 128, 256] {
        let batch = 4;
        let ids: Vec<f32> = (0..batch * seq_len).map(|i| (i % 1000) as f32).collect();
        let context = Tensor::new(&ids, &[batch, seq_len]);
        let mask = padding_mask(&vec![seq_len; batch], seq_len).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(seq_len), &seq_len, |b, _| {
            b.iter(|| black_box(model.forward(&context, &mask).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_forward);
criterion_main!(benches);
