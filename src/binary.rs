//! Packed binary feature vectors and their Hamming distance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ForestError, Result};
use crate::metric::MetricItem;

/// A fixed-width bit vector packed into 64-bit words.
///
/// All vectors searched together must have the same number of words
/// (`feat_dim`). The vector is immutable once built.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinaryVector {
    words: Box<[u64]>,
}

impl BinaryVector {
    pub fn new(words: Vec<u64>) -> Self {
        BinaryVector { words: words.into_boxed_slice() }
    }

    /// A vector of `feat_dim` words with every bit cleared.
    pub fn zeros(feat_dim: usize) -> Self {
        BinaryVector::new(vec![0; feat_dim])
    }

    /// Split a flat buffer of `feat_dim`-word samples, stored one sample
    /// after another, into vectors.
    ///
    /// ```
    /// use vpforest::BinaryVector;
    /// let vs = BinaryVector::from_flat(&[1, 2, 3, 4, 5, 6], 2).unwrap();
    /// assert_eq!(vs.len(), 3);
    /// assert_eq!(vs[1].words(), &[3, 4]);
    /// ```
    pub fn from_flat(words: &[u64], feat_dim: usize) -> Result<Vec<Self>> {
        if feat_dim == 0 {
            return Err(ForestError::InvalidParameter(
                "feature dimension must be at least one word".to_string(),
            ));
        }
        if words.len() % feat_dim != 0 {
            return Err(ForestError::RaggedBuffer { len: words.len(), feat_dim });
        }
        Ok(words.chunks_exact(feat_dim).map(BinaryVector::from).collect())
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Number of 64-bit words.
    pub fn feat_dim(&self) -> usize {
        self.words.len()
    }

    pub fn bit(&self, i: usize) -> bool {
        (self.words[i / 64] >> (i % 64)) & 1 == 1
    }

    pub fn set_bit(&mut self, i: usize, value: bool) {
        let mask = 1u64 << (i % 64);
        if value {
            self.words[i / 64] |= mask;
        } else {
            self.words[i / 64] &= !mask;
        }
    }

    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Number of differing bits: popcount of the XOR, summed over words.
    ///
    /// Vectors of different widths compare as if the shorter one were
    /// zero-padded, so every set bit in the longer tail counts.
    #[inline]
    pub fn hamming(&self, other: &Self) -> u32 {
        let shared: u32 = self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        let (long, short) = if self.words.len() >= other.words.len() {
            (&self.words, &other.words)
        } else {
            (&other.words, &self.words)
        };
        shared + long[short.len()..].iter().map(|w| w.count_ones()).sum::<u32>()
    }
}

impl From<&[u64]> for BinaryVector {
    fn from(words: &[u64]) -> Self {
        BinaryVector::new(words.to_vec())
    }
}

impl From<Vec<u64>> for BinaryVector {
    fn from(words: Vec<u64>) -> Self {
        BinaryVector::new(words)
    }
}

impl fmt::Debug for BinaryVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BinaryVector[")?;
        for (i, w) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:016x}", w)?;
        }
        write!(f, "]")
    }
}

impl MetricItem<f32> for BinaryVector {
    #[inline]
    fn distance(&self, other: &Self) -> f32 {
        self.hamming(other) as f32
    }
}

impl MetricItem<f64> for BinaryVector {
    #[inline]
    fn distance(&self, other: &Self) -> f64 {
        self.hamming(other) as f64
    }
}
