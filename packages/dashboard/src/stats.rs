//! Small column statistics over `f64` slices.
//!
//! Missing values are NaN. Like the dataframe operations the pages were
//! designed around, every function here skips them rather than letting
//! them poison the result.

use std::collections::BTreeMap;

/// Mean of the finite values, or `None` if there are none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));

    (count > 0).then(|| sum / count as f64)
}

/// Sample standard deviation (n - 1 denominator) of the finite values.
/// `None` with fewer than two.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite()).collect::<Vec<_>>();
    if finite.len() < 2 {
        return None;
    }
    let mean = mean(finite.iter().copied())?;
    let sum_sq = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>();

    Some((sum_sq / (finite.len() - 1) as f64).sqrt())
}

/// Standard deviation over a trailing window of `window` values.
///
/// The first entries use however many values are available. An entry is
/// `None` when its window holds fewer than two finite values.
#[must_use]
pub fn rolling_std(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| sample_std(&values[(i + 1).saturating_sub(window)..=i]))
        .collect()
}

fn complete_pairs(pairs: &[(f64, f64)]) -> Vec<(f64, f64)> {
    pairs
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect()
}

/// Pearson correlation over pairs where both values are finite.
///
/// `None` with fewer than two pairs or when either side is constant.
#[must_use]
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let pairs = complete_pairs(pairs);
    if pairs.len() < 2 {
        return None;
    }
    let mean_x = mean(pairs.iter().map(|p| p.0))?;
    let mean_y = mean(pairs.iter().map(|p| p.1))?;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denominator = (sxx * syy).sqrt();
    (denominator > 0.0).then(|| sxy / denominator)
}

/// Ordinary least squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Slope.
    pub slope: f64,
    /// Intercept.
    pub intercept: f64,
}

impl LinearFit {
    /// Evaluates the line at `x`.
    #[must_use]
    pub fn at(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }
}

/// Fits a line through the finite pairs. `None` with fewer than two pairs
/// or when every `x` is equal.
#[must_use]
pub fn linear_fit(pairs: &[(f64, f64)]) -> Option<LinearFit> {
    let pairs = complete_pairs(pairs);
    if pairs.len() < 2 {
        return None;
    }
    let mean_x = mean(pairs.iter().map(|p| p.0))?;
    let mean_y = mean(pairs.iter().map(|p| p.1))?;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x).powi(2);
    }
    if sxx <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: slope.mul_add(-mean_x, mean_y),
    })
}

/// One histogram bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    /// Inclusive start.
    pub start: f64,
    /// End. Exclusive except for the last bin.
    pub end: f64,
    /// Number of values in the bin.
    pub count: usize,
}

/// Equal-width histogram of the finite values.
///
/// Bins span `[min, max]`. When every value is equal the range is widened
/// by 0.5 on both sides. Empty input yields no bins.
#[must_use]
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    let finite = values.iter().copied().filter(|v| v.is_finite()).collect::<Vec<_>>();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (hi - lo).abs() < f64::EPSILON {
        lo -= 0.5;
        hi += 0.5;
    }

    #[allow(clippy::cast_precision_loss)]
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0_usize; bins];
    for v in finite {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let index = (((v - lo) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            #[allow(clippy::cast_precision_loss)]
            let start = (i as f64).mul_add(width, lo);
            Bin {
                start,
                end: start + width,
                count,
            }
        })
        .collect()
}

/// Rounds to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// The `n` items with the largest key, largest first. NaN keys are
/// skipped and ties keep input order.
#[must_use]
pub fn largest_by<T>(items: impl IntoIterator<Item = T>, n: usize, key: impl Fn(&T) -> f64) -> Vec<T> {
    let mut items = items
        .into_iter()
        .filter(|item| !key(item).is_nan())
        .collect::<Vec<_>>();
    items.sort_by(|a, b| key(b).total_cmp(&key(a)));
    items.truncate(n);
    items
}

/// The `n` items with the smallest key, smallest first. NaN keys are
/// skipped and ties keep input order.
#[must_use]
pub fn smallest_by<T>(items: impl IntoIterator<Item = T>, n: usize, key: impl Fn(&T) -> f64) -> Vec<T> {
    let mut items = items
        .into_iter()
        .filter(|item| !key(item).is_nan())
        .collect::<Vec<_>>();
    items.sort_by(|a, b| key(a).total_cmp(&key(b)));
    items.truncate(n);
    items
}

/// Per-group row count and mean of a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupSummary {
    /// Rows in the group.
    pub count: usize,
    /// Mean of the group's finite values, NaN if it has none.
    pub mean: f64,
}

struct GroupAccum {
    count: usize,
    sum: f64,
    finite: usize,
}

impl GroupAccum {
    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> GroupSummary {
        let mean = if self.finite == 0 {
            f64::NAN
        } else {
            self.sum / self.finite as f64
        };
        GroupSummary {
            count: self.count,
            mean,
        }
    }
}

/// Groups `items` by `key` and summarizes `value` per group.
///
/// Every row counts toward its group; only finite values count toward the
/// mean.
pub fn summarize_by<T, K: Ord>(
    items: impl IntoIterator<Item = T>,
    key: impl Fn(&T) -> K,
    value: impl Fn(&T) -> f64,
) -> BTreeMap<K, GroupSummary> {
    let mut groups: BTreeMap<K, GroupAccum> = BTreeMap::new();

    for item in items {
        let v = value(&item);
        let entry = groups.entry(key(&item)).or_insert_with(|| GroupAccum {
            count: 0,
            sum: 0.0,
            finite: 0,
        });
        entry.count += 1;
        if v.is_finite() {
            entry.sum += v;
            entry.finite += 1;
        }
    }

    groups
        .into_iter()
        .map(|(k, acc)| (k, acc.finish()))
        .collect()
}
