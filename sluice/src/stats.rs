//! Summary statistics over `f64` samples.
//!
//! Pure functions with no shared state. The simulation uses them to summarize
//! item latencies; they are equally usable on any slice of measurements.

/// Values closer than this are counted as equal by [`mode`].
pub const MODE_TOLERANCE: f64 = 1e-6;

/// All five statistics for one sample set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub mode: f64,
}

/// Computes every statistic in [`Summary`] for `values`.
#[must_use]
pub fn describe(values: &[f64]) -> Summary {
    Summary {
        count: count(values),
        sum: sum(values),
        mean: mean(values),
        std_dev: std_dev(values),
        mode: mode(values),
    }
}

#[must_use]
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean; `0.0` for an empty slice.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    sum(values) / values.len() as f64
}

/// Sample standard deviation (Bessel's correction, `n - 1` divisor).
///
/// `0.0` for fewer than two values. Deviations are taken from the mean in a
/// second pass, so the variance cannot come out negative through cancellation.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let mean = mean(values);
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (squares / (values.len() - 1) as f64).sqrt()
}

#[must_use]
pub const fn count(values: &[f64]) -> usize {
    values.len()
}

/// Most frequent value; `0.0` for an empty slice.
///
/// Values are sorted ascending and adjacent values within [`MODE_TOLERANCE`] of
/// each other form one run. The longest run wins; on a tie the run that comes
/// first in ascending order is kept. The returned value is the last (largest)
/// member of the winning run.
#[must_use]
pub fn mode(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let Some(&first) = sorted.first() else {
        return 0.0;
    };

    let mut best = first;
    let mut best_len = 1usize;
    let mut run_len = 1usize;

    for pair in sorted.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        if (next - prev).abs() < MODE_TOLERANCE {
            run_len += 1;
            continue;
        }
        if run_len > best_len {
            best_len = run_len;
            best = prev;
        }
        run_len = 1;
    }

    if run_len > best_len {
        best = sorted[sorted.len() - 1];
    }
    best
}
