//! Hair strand sampling of a plasma curve.
//!
//! Each day of plasma exposure maps onto a stretch of hair, so cutting the
//! strand into contiguous pieces samples the curve in consecutive windows.

use crate::{errors::SimError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct HairStrand {
    strand: Vec<f64>,
}

impl HairStrand {
    pub fn new(concentrations: Vec<f64>) -> Self {
        Self { strand: concentrations }
    }

    pub fn len(&self) -> usize {
        self.strand.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strand.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.strand
    }

    /// Cut into `n` contiguous segments whose lengths differ by at most one.
    /// The longer segments come first.
    pub fn segment_into_n(&self, n: usize) -> Result<Vec<Vec<f64>>> {
        if n == 0 {
            return Err(SimError::InvalidInput(
                "Cannot cut a strand into zero segments".to_string(),
            ));
        }

        let base = self.strand.len() / n;
        let extra = self.strand.len() % n;
        let mut segments = Vec::with_capacity(n);
        let mut start = 0;

        for i in 0..n {
            let end = start + base + usize::from(i < extra);
            segments.push(self.strand[start..end].to_vec());
            start = end;
        }

        Ok(segments)
    }

    /// Cut into as many segments of roughly `len` samples as fit in the strand.
    pub fn segment_into_len(&self, len: usize) -> Result<Vec<Vec<f64>>> {
        if len == 0 || len > self.strand.len() {
            return Err(SimError::InvalidInput(format!(
                "Segment length {} does not fit a strand of {} samples",
                len,
                self.strand.len()
            )));
        }

        self.segment_into_n(self.strand.len() / len)
    }
}
