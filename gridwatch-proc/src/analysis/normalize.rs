//! Waveform conditioning before the time-frequency transform

/// Normalize a raw waveform for analysis.
///
/// Replaces NaN values with 0.0 (logged, since it indicates a data-quality
/// problem upstream), removes the DC offset by subtracting the mean, and
/// scales by the peak absolute value so the output lies in [-1, 1]. An
/// all-zero signal is returned unchanged.
///
/// Pure and deterministic; the input is never mutated.
pub fn normalize(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<f64> = samples.to_vec();

    let nan_count = out.iter().filter(|v| v.is_nan()).count();
    if nan_count > 0 {
        tracing::warn!(nan_count, "NaN values in waveform replaced with 0.0");
        for v in out.iter_mut() {
            if v.is_nan() {
                *v = 0.0;
            }
        }
    }

    let mean = out.iter().sum::<f64>() / out.len() as f64;
    for v in out.iter_mut() {
        *v -= mean;
    }

    let peak = out.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if peak > 0.0 {
        for v in out.iter_mut() {
            *v /= peak;
        }
    }

    out
}
