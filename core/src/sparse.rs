use serde::{Deserialize, Serialize};

pub type TermId = u32;

/// Sparse vector with strictly increasing term ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<TermId>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Build from unordered (term, weight) pairs. Each term must appear once.
    pub fn from_pairs(mut pairs: Vec<(TermId, f64)>) -> Self {
        pairs.sort_unstable_by_key(|(t, _)| *t);
        let (indices, values) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn get(&self, term: TermId) -> f64 {
        match self.indices.binary_search(&term) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit Euclidean length. A zero vector is left as is.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm == 0.0 { return; }
        for v in self.values.iter_mut() {
            *v /= norm;
        }
    }

    /// Dot product by merging the two sorted index lists.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut acc = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    acc += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_only_counts_shared_terms() {
        let a = SparseVector::from_pairs(vec![(3, 2.0), (0, 1.0)]);
        let b = SparseVector::from_pairs(vec![(1, 5.0), (3, 0.5)]);
        assert_eq!(a.dot(&b), 1.0);
        assert_eq!(a.get(0), 1.0);
        assert_eq!(a.get(1), 0.0);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        let mut z = SparseVector::default();
        z.normalize();
        assert!(z.is_zero());
        let mut v = SparseVector::from_pairs(vec![(0, 3.0), (1, 4.0)]);
        v.normalize();
        assert!((v.norm() - 1.0).abs() < 1e-12);
        assert!((v.get(0) - 0.6).abs() < 1e-12);
    }
}
