//! Accuracy tracking and training progress logging

use aprender::autograd::Tensor;

/// Running classification accuracy
///
/// Accumulates arg-max agreements across batches; accumulation order
/// does not matter.
#[derive(Debug, Clone, Default)]
pub struct Accuracy {
    matches: usize,
    total: usize,
}

impl Accuracy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display label for log lines.
    pub fn name(&self) -> &'static str {
        "accuracy"
    }

    pub fn reset(&mut self) {
        self.matches = 0;
        self.total = 0;
    }

    /// Count arg-max agreements between `logits` [batch, classes] and
    /// `labels` [batch].
    pub fn update(&mut self, logits: &Tensor, labels: &Tensor) {
        let shape = logits.shape();
        let (batch, classes) = (shape[0], shape[1]);
        let logits_data = logits.data();
        let labels_data = labels.data();
        for i in 0..batch {
            let row = &logits_data[i * classes..(i + 1) * classes];
            if argmax(row) == labels_data[i] as usize {
                self.matches += 1;
            }
        }
        self.total += batch;
    }

    /// Fraction of correct predictions; 0.0 when nothing accumulated.
    pub fn score(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.matches as f32 / self.total as f32
        }
    }

    pub fn matches(&self) -> usize {
        self.matches
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Index of the largest value; the first index wins ties.
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Prints a progress line every `log_interval` steps
pub struct ProgressLogger {
    log_interval: usize,
    step: usize,
}

impl ProgressLogger {
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval,
            step: 0,
        }
    }

    pub fn log_step(&mut self, loss: f32, accuracy: f32, lr: f32) {
        self.step += 1;
        if self.log_interval > 0 && self.step % self.log_interval == 0 {
            println!(
                "Step {}: loss={:.4}, acc={:.4}, lr={:.2e}",
                self.step, loss, accuracy, lr
            );
        }
    }
}
