use crate::error::CvError;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A contiguous block of sample indices validated as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub id: usize,
    pub range: Range<usize>,
}

impl Fold {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Indices available for training: everything strictly before the fold.
    pub fn training_range(&self) -> Range<usize> {
        0..self.range.start
    }
}

/// Splits `0..n` into `k` contiguous folds in time order.
///
/// The first `n % k` folds hold one extra sample.
pub fn make_folds(n: usize, k: usize) -> Result<Vec<Fold>, CvError> {
    if k < 2 || k > n {
        return Err(CvError::InvalidFoldCount { k, samples: n });
    }
    let (base, extra) = (n / k, n % k);
    let mut start = 0;
    Ok((0..k)
        .map(|id| {
            let len = base + usize::from(id < extra);
            let fold = Fold {
                id,
                range: start..start + len,
            };
            start += len;
            fold
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_partition_every_index_exactly_once() {
        for n in 2..60 {
            for k in 2..=n {
                let folds = make_folds(n, k).unwrap();
                assert_eq!(folds.len(), k);

                let covered: Vec<usize> = folds.iter().flat_map(|f| f.range.clone()).collect();
                assert_eq!(covered, (0..n).collect::<Vec<_>>(), "n={n} k={k}");
                assert!(folds.iter().all(|f| !f.is_empty()));

                let sizes: Vec<usize> = folds.iter().map(Fold::len).collect();
                let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn training_data_always_precedes_the_fold() {
        let folds = make_folds(10, 3).unwrap();
        assert_eq!(folds[0].range, 0..4);
        assert_eq!(folds[1].range, 4..7);
        assert_eq!(folds[2].range, 7..10);
        for fold in &folds {
            assert!(fold.training_range().end <= fold.range.start);
        }
        assert!(folds[0].training_range().is_empty());
    }

    #[test]
    fn fold_count_outside_two_to_n_is_rejected() {
        assert_eq!(make_folds(5, 1), Err(CvError::InvalidFoldCount { k: 1, samples: 5 }));
        assert_eq!(make_folds(5, 6), Err(CvError::InvalidFoldCount { k: 6, samples: 5 }));
        assert!(make_folds(5, 5).is_ok());
    }
}
