//! Weight initialization

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sample `rows * cols` values from normal(0, std) via the Box-Muller
/// transform.
pub fn normal_matrix(rows: usize, cols: usize, std: f32, seed: Option<u64>) -> Vec<f32> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let mut data = Vec::with_capacity(rows * cols);
    for _ in 0..rows * cols {
        // u1 bounded away from zero so ln() stays finite
        let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
        let u2: f32 = rng.gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
        data.push(z * std);
    }
    data
}
