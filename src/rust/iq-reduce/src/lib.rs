// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Reduction of streamed I/Q acquisition data.
//!
//! The execution engine streams `reads_per_rep` (I, Q) samples per shot and
//! readout channel, in the flat row-major order of the loop axes (outermost
//! axis slowest, reads of one shot fastest).
//! [`reduce`] folds the repetition axes, reshapes the result into the sweep
//! axes and optionally thresholds single shots or picks a subset of points.

use std::fmt::Display;

mod axes;
mod buffer;
mod reduce;

pub use axes::{LoopAxis, point_count, point_shape, shot_count, validate_axes};
pub use buffer::{AcquisitionBuffer, IqSample};
pub use reduce::{ReduceOptions, Reduced, expected_samples, reduce};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid loop axes: {0}")]
    InvalidAxes(String),
    #[error(
        "Acquisition on readout {channel} is incomplete: expected {expected} samples, received {received}"
    )]
    StreamIncomplete {
        channel: usize,
        expected: usize,
        received: usize,
    },
    #[error(
        "Acquisition on readout {channel} holds {received} samples, more than the expected {expected}"
    )]
    StreamOverrun {
        channel: usize,
        expected: usize,
        received: usize,
    },
    #[error("Invalid acquisition settings: {0}")]
    InvalidAcquireConfig(String),
    #[error("Index {index} is out of range for {len} acquired points")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Anyhow(anyhow::anyhow!(msg.to_string()))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
