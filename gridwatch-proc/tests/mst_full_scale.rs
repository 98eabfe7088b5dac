//! Full-scale transform scenario: one real capture burst.
//!
//! Runs the engine at production size (5120 samples, 30720 Hz), which takes
//! a while in debug builds; ignored by default.
//! Run with: cargo test --release -- --ignored

use gridwatch_proc::analysis::modified_stockwell_transform;
use std::f64::consts::PI;

#[test]
#[ignore]
fn full_capture_sine_concentrates_at_60_hz() {
    let fs = 30720.0;
    let n = 5120;
    // 60 Hz sine, amplitude 1.0: ten mains cycles per capture
    let signal: Vec<f64> = (0..n)
        .map(|k| (2.0 * PI * 60.0 * k as f64 / fs).sin())
        .collect();

    let result = modified_stockwell_transform(&signal, fs, 1, 0.05);

    assert_eq!(result.matrix.nrows(), 2560);
    assert_eq!(result.matrix.ncols(), 5120);
    assert!(result
        .matrix
        .row(0)
        .iter()
        .all(|c| c.re == 0.0 && c.im == 0.0));

    // Bin spacing is 6 Hz: 60 Hz lands on row 10, ~1000 Hz near row 167
    let mean_mag = |row: usize| -> f64 {
        result.matrix.row(row).iter().map(|c| c.norm() as f64).sum::<f64>() / n as f64
    };
    assert!((result.freqs[10] - 60.0).abs() < 1e-9);

    let target = mean_mag(10);
    let unrelated = mean_mag(167);
    assert!(
        target > 5.0 * unrelated,
        "60 Hz row magnitude {} not dominant over 1000 Hz row {}",
        target,
        unrelated
    );
}
