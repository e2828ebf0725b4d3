//! Labelled sample streams consumed by the trainer.

use crate::error::Result;
use crate::matrix::Matrix;

/// One labelled input row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: u32,
    /// `1 × n` raw (unscaled) input.
    pub input: Matrix,
}

impl Sample {
    pub fn new(label: u32, input: Matrix) -> Self {
        Self { label, input }
    }
}

/// A rewindable stream of samples.
pub trait SampleSource {
    /// Next sample, or `None` at end of data.
    fn next_sample(&mut self) -> Result<Option<Sample>>;

    /// Up to `n` samples; fewer (possibly none) at end of data.
    fn next_batch(&mut self, n: usize) -> Result<Vec<Sample>> {
        let mut batch = Vec::with_capacity(n);
        while batch.len() < n {
            match self.next_sample()? {
                Some(sample) => batch.push(sample),
                None => break,
            }
        }
        Ok(batch)
    }

    /// Rewind to the first sample.
    fn reset(&mut self) -> Result<()>;
}

/// Samples held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    samples: Vec<Sample>,
    cursor: usize,
}

impl MemorySource {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleSource for MemorySource {
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        let sample = self.samples.get(self.cursor).cloned();
        if sample.is_some() {
            self.cursor += 1;
        }
        Ok(sample)
    }

    fn reset(&mut self) -> Result<()> {
        self.cursor = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(n: u32) -> MemorySource {
        MemorySource::new(
            (0..n)
                .map(|i| Sample::new(i, Matrix::row_vector(vec![i as f64])))
                .collect(),
        )
    }

    #[test]
    fn test_batches_shrink_at_end() {
        let mut src = source(5);
        assert_eq!(src.next_batch(2).unwrap().len(), 2);
        assert_eq!(src.next_batch(2).unwrap().len(), 2);
        assert_eq!(src.next_batch(2).unwrap().len(), 1);
        assert!(src.next_batch(2).unwrap().is_empty());
    }

    #[test]
    fn test_reset_rewinds() {
        let mut src = source(3);
        src.next_batch(3).unwrap();
        src.reset().unwrap();
        assert_eq!(src.next_sample().unwrap().map(|s| s.label), Some(0));
    }
}
