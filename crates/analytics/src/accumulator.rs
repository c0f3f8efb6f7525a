use serde::{Deserialize, Serialize};

/// Running count, mean and sum of squared deviations (Welford).
///
/// Two accumulators built over disjoint samples merge into the accumulator of
/// their union, so partial results from parallel tasks can be combined in any
/// grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricAccumulator {
    count: usize,
    mean: f64,
    m2: f64,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let (n_a, n_b, n) = (self.count as f64, other.count as f64, count as f64);
        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count = count;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Population standard deviation.
    pub fn std(&self) -> Option<f64> {
        (self.count > 0).then(|| (self.m2 / self.count as f64).sqrt())
    }
}

impl FromIterator<f64> for MetricAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        for value in iter {
            acc.push(value);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn matches_direct_mean_and_population_std() {
        let acc: MetricAccumulator = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
        assert_eq!(acc.count(), 8);
        assert_abs_diff_eq!(acc.mean().unwrap(), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(acc.std().unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn merge_is_independent_of_grouping() {
        let values = [3.5, 1.25, 8.0, -2.0, 4.75, 6.5, 0.5];
        let whole: MetricAccumulator = values.into_iter().collect();

        for split in 0..=values.len() {
            let mut left: MetricAccumulator = values[..split].iter().copied().collect();
            let right: MetricAccumulator = values[split..].iter().copied().collect();
            left.merge(&right);
            assert_eq!(left.count(), whole.count());
            assert_abs_diff_eq!(left.mean().unwrap(), whole.mean().unwrap(), epsilon = 1e-12);
            assert_abs_diff_eq!(left.std().unwrap(), whole.std().unwrap(), epsilon = 1e-12);
        }
    }

    #[test]
    fn empty_accumulator_has_no_statistics() {
        let acc = MetricAccumulator::new();
        assert_eq!(acc.mean(), None);
        assert_eq!(acc.std(), None);

        let mut single = MetricAccumulator::new();
        single.push(3.0);
        assert_eq!(single.std(), Some(0.0));
    }
}
