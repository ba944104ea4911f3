// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use num_complex::Complex;

/// A single (I, Q) sample, I in the real and Q in the imaginary part.
pub type IqSample = Complex<f64>;

/// Flat per-shot samples of one readout channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AcquisitionBuffer {
    samples: Vec<IqSample>,
}

impl AcquisitionBuffer {
    pub fn new(samples: Vec<IqSample>) -> Self {
        AcquisitionBuffer { samples }
    }

    /// Build a buffer from `[I, Q]` rows.
    pub fn from_rows(rows: &[[f64; 2]]) -> Self {
        Self::new(rows.iter().map(|&[i, q]| Complex::new(i, q)).collect())
    }

    pub fn samples(&self) -> &[IqSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn i(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.re).collect()
    }

    pub fn q(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.im).collect()
    }
}

impl From<Vec<IqSample>> for AcquisitionBuffer {
    fn from(samples: Vec<IqSample>) -> Self {
        Self::new(samples)
    }
}
