//! Stratified train/test partitioning

use crate::error::{ScreeningError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of one train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffled split that keeps each class's share equal across both sides
#[derive(Debug, Clone)]
pub struct StratifiedSplit {
    test_size: f64,
    random_state: u64,
}

impl StratifiedSplit {
    pub fn new(test_size: f64, random_state: u64) -> Self {
        Self { test_size, random_state }
    }

    /// Partition row indices of `y`. Same seed and labels always give the same partition.
    pub fn split(&self, y: &Array1<f64>) -> Result<SplitIndices> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ScreeningError::InvalidInput(format!(
                "test_size must lie in (0, 1), got {}",
                self.test_size
            )));
        }

        let n = y.len();
        let n_test = (self.test_size * n as f64).ceil() as usize;
        let n_train = n.saturating_sub(n_test);

        let classes = group_by_class(y);
        if let Some((label, members)) = classes.iter().find(|(_, m)| m.len() < 2) {
            return Err(ScreeningError::PreprocessingError(format!(
                "class {} has only {} member(s); stratified split needs at least 2",
                label,
                members.len()
            )));
        }
        if n_train < classes.len() || n_test < classes.len() {
            return Err(ScreeningError::PreprocessingError(format!(
                "cannot place {} classes into {} train / {} test rows",
                classes.len(),
                n_train,
                n_test
            )));
        }

        let counts: Vec<usize> = classes.iter().map(|(_, m)| m.len()).collect();
        let test_counts = allocate(&counts, n_test);

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut train = Vec::with_capacity(n_train);
        let mut test = Vec::with_capacity(n_test);

        for ((_, members), &k) in classes.iter().zip(test_counts.iter()) {
            let mut shuffled = members.clone();
            shuffled.shuffle(&mut rng);
            test.extend_from_slice(&shuffled[..k]);
            train.extend_from_slice(&shuffled[k..]);
        }

        train.shuffle(&mut rng);
        test.shuffle(&mut rng);

        Ok(SplitIndices { train, test })
    }
}

/// Group row indices by label, classes ordered by label value
fn group_by_class(y: &Array1<f64>) -> Vec<(f64, Vec<usize>)> {
    let mut classes: Vec<(f64, Vec<usize>)> = Vec::new();
    for (i, &label) in y.iter().enumerate() {
        match classes.iter_mut().find(|(c, _)| *c == label) {
            Some((_, members)) => members.push(i),
            None => classes.push((label, vec![i])),
        }
    }
    classes.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    classes
}

/// Share `total` draws across classes proportionally to `counts`.
/// Floors first, then hands the remainder to the largest fractional parts.
fn allocate(counts: &[usize], total: usize) -> Vec<usize> {
    let n: usize = counts.iter().sum();
    let exact: Vec<f64> = counts.iter().map(|&c| c as f64 * total as f64 / n as f64).collect();
    let mut alloc: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut remaining = total - alloc.iter().sum::<usize>();
    for &idx in order.iter().cycle() {
        if remaining == 0 {
            break;
        }
        if alloc[idx] < counts[idx] {
            alloc[idx] += 1;
            remaining -= 1;
        }
    }
    alloc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n_neg: usize, n_pos: usize) -> Array1<f64> {
        let mut v = vec![0.0; n_neg];
        v.extend(vec![1.0; n_pos]);
        Array1::from_vec(v)
    }

    #[test]
    fn test_sizes_follow_ceil_rule() {
        let y = labels(65, 35);
        let split = StratifiedSplit::new(0.2, 42).split(&y).unwrap();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);
    }

    #[test]
    fn test_class_proportions_preserved() {
        let y = labels(500, 268);
        let split = StratifiedSplit::new(0.2, 42).split(&y).unwrap();

        let pos_test = split.test.iter().filter(|&&i| y[i] == 1.0).count();
        let expected = 268.0 * split.test.len() as f64 / 768.0;
        assert!((pos_test as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let y = labels(30, 12);
        let split = StratifiedSplit::new(0.2, 7).split(&y).unwrap();

        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort();
        assert_eq!(all, (0..42).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_partition() {
        let y = labels(40, 20);
        let a = StratifiedSplit::new(0.2, 42).split(&y).unwrap();
        let b = StratifiedSplit::new(0.2, 42).split(&y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_singleton_class_rejected() {
        let y = labels(10, 1);
        assert!(StratifiedSplit::new(0.2, 42).split(&y).is_err());
    }

    #[test]
    fn test_allocate_sums_to_total() {
        let alloc = allocate(&[500, 268], 154);
        assert_eq!(alloc.iter().sum::<usize>(), 154);
        assert_eq!(alloc, vec![100, 54]);
    }
}
