// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::axes::{LoopAxis, point_count, point_shape, shot_count, validate_axes};
use crate::buffer::{AcquisitionBuffer, IqSample};
use crate::{Error, Result};
use ndarray::{ArrayD, IxDyn};
use num_complex::Complex;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReduceOptions {
    /// Single-shot discrimination threshold per readout channel.
    pub threshold: Option<Vec<f64>>,
    /// Rotation angle in radians per readout channel, applied before thresholding.
    pub angle: Option<Vec<f64>>,
    /// Flat point indices to keep, in output order.
    pub save_subset: Option<Vec<usize>>,
    /// Readouts triggered per shot; `None` means one.
    pub reads_per_rep: Option<usize>,
}

impl ReduceOptions {
    pub fn reads_per_rep(&self) -> usize {
        self.reads_per_rep.unwrap_or(1)
    }
}

/// Reduced acquisition data, one array per readout channel.
///
/// With more than one read per shot every shape gains a trailing dimension of
/// `reads_per_rep`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduced {
    pub avg_i: Vec<ArrayD<f64>>,
    pub avg_q: Vec<ArrayD<f64>>,
    /// Thresholded single shots in the full loop shape, if a threshold was given.
    pub shots: Option<Vec<ArrayD<bool>>>,
}

fn check_per_channel(name: &str, values: &Option<Vec<f64>>, n_channels: usize) -> Result<()> {
    match values {
        Some(values) if values.len() != n_channels => {
            Err(Error::InvalidAcquireConfig(format!(
                "{} {name} values given for {n_channels} readout channels",
                values.len()
            )))
        }
        _ => Ok(()),
    }
}

fn check_options(options: &ReduceOptions, n_channels: usize) -> Result<()> {
    if options.reads_per_rep == Some(0) {
        return Err(Error::InvalidAcquireConfig(
            "at least one read per repetition is required".into(),
        ));
    }
    if options.threshold.is_some() && options.angle.is_none() {
        return Err(Error::InvalidAcquireConfig(
            "a threshold requires a rotation angle".into(),
        ));
    }
    check_per_channel("threshold", &options.threshold, n_channels)?;
    check_per_channel("angle", &options.angle, n_channels)?;
    Ok(())
}

/// Number of samples a complete buffer holds.
pub fn expected_samples(axes: &[LoopAxis], reads_per_rep: usize) -> Result<usize> {
    shot_count(axes).checked_mul(reads_per_rep).ok_or_else(|| {
        Error::InvalidAcquireConfig(format!(
            "{reads_per_rep} reads per repetition overflow the sample count"
        ))
    })
}

fn check_buffers(raw: &[AcquisitionBuffer], expected: usize) -> Result<()> {
    for (channel, buffer) in raw.iter().enumerate() {
        let received = buffer.len();
        if received < expected {
            return Err(Error::StreamIncomplete {
                channel,
                expected,
                received,
            });
        }
        if received > expected {
            return Err(Error::StreamOverrun {
                channel,
                expected,
                received,
            });
        }
    }
    Ok(())
}

fn check_subset(subset: &[usize], len: usize) -> Result<()> {
    match subset.iter().find(|&&index| index >= len) {
        Some(&index) => Err(Error::IndexOutOfRange { index, len }),
        None => Ok(()),
    }
}

fn with_reads(mut shape: Vec<usize>, reads_per_rep: usize) -> Vec<usize> {
    if reads_per_rep > 1 {
        shape.push(reads_per_rep);
    }
    shape
}

/// Index of the averaged point a shot contributes to.
fn point_index(shot: usize, axes: &[LoopAxis]) -> usize {
    let mut remainder = shot;
    let mut point = 0;
    let mut stride = 1;
    for axis in axes.iter().rev() {
        let coordinate = remainder % axis.extent;
        remainder /= axis.extent;
        if !axis.is_repetition() {
            point += coordinate * stride;
            stride *= axis.extent;
        }
    }
    point
}

/// Average over all repetition axes, keeping the reads of a shot apart.
///
/// The result holds `reads_per_rep` consecutive values per point. A no-op
/// without repetition axes.
fn fold_repetitions(
    samples: &[IqSample],
    axes: &[LoopAxis],
    reads_per_rep: usize,
) -> Vec<IqSample> {
    if !axes.iter().any(LoopAxis::is_repetition) {
        return samples.to_vec();
    }
    let slots = point_count(axes) * reads_per_rep;
    let mut sums = vec![Complex::new(0.0, 0.0); slots];
    for (index, sample) in samples.iter().enumerate() {
        let (shot, read) = (index / reads_per_rep, index % reads_per_rep);
        sums[point_index(shot, axes) * reads_per_rep + read] += *sample;
    }
    let repetitions = (samples.len() / slots) as f64;
    sums.into_iter().map(|s| s / repetitions).collect()
}

fn threshold_shots(
    samples: &[IqSample],
    shape: &[usize],
    threshold: f64,
    angle: f64,
) -> Result<ArrayD<bool>> {
    let rotation = Complex::from_polar(1.0, angle);
    let shots = samples
        .iter()
        .map(|s| (*s * rotation).re > threshold)
        .collect();
    ArrayD::from_shape_vec(IxDyn(shape), shots).map_err(Error::new)
}

fn to_array(values: Vec<f64>, shape: &[usize]) -> Result<ArrayD<f64>> {
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(Error::new)
}

/// Reduce raw per-shot buffers into averaged I and Q arrays.
///
/// `raw` holds one buffer per readout channel, each with exactly
/// `shot_count(axes) * reads_per_rep` samples, the reads of one shot stored
/// next to each other. All inputs are validated before any output is
/// produced, so an error never comes with partial results.
pub fn reduce(
    raw: &[AcquisitionBuffer],
    axes: &[LoopAxis],
    options: &ReduceOptions,
) -> Result<Reduced> {
    validate_axes(axes)?;
    check_options(options, raw.len())?;
    let reads = options.reads_per_rep();
    let samples_expected = expected_samples(axes, reads)?;
    check_buffers(raw, samples_expected)?;
    let points = point_count(axes);
    if let Some(subset) = &options.save_subset {
        check_subset(subset, points)?;
    }

    let shape = with_reads(point_shape(axes), reads);
    let full_shape = with_reads(axes.iter().map(|a| a.extent).collect(), reads);
    let mut avg_i = Vec::with_capacity(raw.len());
    let mut avg_q = Vec::with_capacity(raw.len());
    for buffer in raw {
        let averaged = fold_repetitions(buffer.samples(), axes, reads);
        let selected: Vec<IqSample> = match &options.save_subset {
            None => averaged,
            Some(subset) => subset
                .iter()
                .flat_map(|&ix| &averaged[ix * reads..(ix + 1) * reads])
                .copied()
                .collect(),
        };
        let shape = match &options.save_subset {
            None => shape.clone(),
            Some(subset) => with_reads(vec![subset.len()], reads),
        };
        avg_i.push(to_array(selected.iter().map(|s| s.re).collect(), &shape)?);
        avg_q.push(to_array(selected.iter().map(|s| s.im).collect(), &shape)?);
    }

    let shots = match (&options.threshold, &options.angle) {
        (Some(thresholds), Some(angles)) => Some(
            raw.iter()
                .zip(thresholds.iter().zip(angles))
                .map(|(buffer, (&threshold, &angle))| {
                    threshold_shots(buffer.samples(), &full_shape, threshold, angle)
                })
                .collect::<Result<Vec<_>>>()?,
        ),
        _ => None,
    };

    tproc_log::diagnostic!(
        "Reduced {} readout channel(s) of {} samples into {} points",
        raw.len(),
        samples_expected,
        points
    );
    Ok(Reduced {
        avg_i,
        avg_q,
        shots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn ramp(n: usize) -> AcquisitionBuffer {
        AcquisitionBuffer::new((0..n).map(|k| Complex::new(k as f64, -(k as f64))).collect())
    }

    #[test]
    fn test_pure_reshape_without_repetitions() {
        let axes = vec![LoopAxis::sweep("a", 2), LoopAxis::new("b", 3, 2)];
        let raw = vec![ramp(6)];
        let reduced = reduce(&raw, &axes, &ReduceOptions::default()).unwrap();
        let i = &reduced.avg_i[0];
        let q = &reduced.avg_q[0];
        assert_eq!(i.shape(), &[2, 3]);
        for a in 0..2 {
            for b in 0..3 {
                let flat = a * 3 + b;
                assert_eq!(i[IxDyn(&[a, b])], raw[0].samples()[flat].re);
                assert_eq!(q[IxDyn(&[a, b])], raw[0].samples()[flat].im);
            }
        }
        assert!(reduced.shots.is_none());
    }

    #[test]
    fn test_repetitions_are_averaged() {
        let axes = vec![LoopAxis::sweep("expts", 3), LoopAxis::repetitions(2)];
        let raw = vec![ramp(6), AcquisitionBuffer::from_rows(&[[1.0, 1.0]; 6])];
        let reduced = reduce(&raw, &axes, &ReduceOptions::default()).unwrap();
        assert_eq!(reduced.avg_i[0].shape(), &[3]);
        assert_eq!(
            reduced.avg_i[0].iter().copied().collect::<Vec<_>>(),
            vec![0.5, 2.5, 4.5]
        );
        assert_eq!(
            reduced.avg_q[0].iter().copied().collect::<Vec<_>>(),
            vec![-0.5, -2.5, -4.5]
        );
        assert!(reduced.avg_i[1].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_repetitions_only() {
        let axes = vec![LoopAxis::repetitions(4)];
        let reduced = reduce(&[ramp(4)], &axes, &ReduceOptions::default()).unwrap();
        assert_eq!(reduced.avg_i[0].shape(), &[1]);
        assert_eq!(reduced.avg_i[0][IxDyn(&[0])], 1.5);

        let options = ReduceOptions {
            save_subset: Some(vec![0, 0]),
            ..Default::default()
        };
        let reduced = reduce(&[ramp(4)], &axes, &options).unwrap();
        assert_eq!(reduced.avg_q[0].len(), 2);

        let options = ReduceOptions {
            save_subset: Some(vec![1]),
            ..Default::default()
        };
        assert!(matches!(
            reduce(&[ramp(4)], &axes, &options),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_subset_keeps_given_order() {
        let axes = vec![LoopAxis::sweep("a", 2), LoopAxis::new("b", 2, 2)];
        let options = ReduceOptions {
            save_subset: Some(vec![2, 0]),
            ..Default::default()
        };
        let reduced = reduce(&[ramp(4)], &axes, &options).unwrap();
        assert_eq!(reduced.avg_i[0].shape(), &[2]);
        assert_eq!(
            reduced.avg_i[0].iter().copied().collect::<Vec<_>>(),
            vec![2.0, 0.0]
        );
        assert_eq!(
            reduced.avg_q[0].iter().copied().collect::<Vec<_>>(),
            vec![-2.0, 0.0]
        );
    }

    #[test]
    fn test_subset_out_of_range() {
        let axes = vec![LoopAxis::sweep("a", 2), LoopAxis::new("b", 2, 2)];
        let options = ReduceOptions {
            save_subset: Some(vec![0, 4]),
            ..Default::default()
        };
        let err = reduce(&[ramp(4)], &axes, &options).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 4, len: 4 }));
    }

    #[test]
    fn test_multiple_reads_per_rep() {
        let axes = vec![LoopAxis::sweep("expts", 3), LoopAxis::repetitions(2)];
        let options = ReduceOptions {
            reads_per_rep: Some(2),
            ..Default::default()
        };
        // Sample k belongs to expt k / 4, repetition (k / 2) % 2 and read k % 2.
        let reduced = reduce(&[ramp(12)], &axes, &options).unwrap();
        assert_eq!(reduced.avg_i[0].shape(), &[3, 2]);
        assert_eq!(
            reduced.avg_i[0].iter().copied().collect::<Vec<_>>(),
            vec![1.0, 2.0, 5.0, 6.0, 9.0, 10.0]
        );

        let options = ReduceOptions {
            reads_per_rep: Some(2),
            save_subset: Some(vec![2, 0]),
            threshold: Some(vec![5.5]),
            angle: Some(vec![0.0]),
        };
        let reduced = reduce(&[ramp(12)], &axes, &options).unwrap();
        assert_eq!(reduced.avg_q[0].shape(), &[2, 2]);
        assert_eq!(reduced.avg_q[0][IxDyn(&[0, 1])], -10.0);
        assert_eq!(reduced.avg_q[0][IxDyn(&[1, 0])], -1.0);
        let shots = reduced.shots.unwrap();
        assert_eq!(shots[0].shape(), &[3, 2, 2]);
        assert_eq!(shots[0].iter().filter(|&&s| s).count(), 6);

        assert!(matches!(
            reduce(&[ramp(6)], &axes, &options),
            Err(Error::StreamIncomplete {
                expected: 12,
                received: 6,
                ..
            })
        ));
        let options = ReduceOptions {
            reads_per_rep: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            reduce(&[ramp(6)], &axes, &options),
            Err(Error::InvalidAcquireConfig(_))
        ));
    }

    #[test]
    fn test_overflowing_axes_are_rejected() {
        let axes = vec![LoopAxis::sweep("a", 1 << 32), LoopAxis::repetitions(1 << 32)];
        assert!(matches!(
            reduce(&[AcquisitionBuffer::default()], &axes, &ReduceOptions::default()),
            Err(Error::InvalidAxes(_))
        ));
        let axes = vec![LoopAxis::sweep("a", usize::MAX / 2 + 1)];
        let options = ReduceOptions {
            reads_per_rep: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            reduce(&[AcquisitionBuffer::default()], &axes, &options),
            Err(Error::InvalidAcquireConfig(_))
        ));
    }

    #[test]
    fn test_buffer_length_is_checked() {
        let axes = vec![LoopAxis::sweep("expts", 3), LoopAxis::repetitions(2)];
        assert!(matches!(
            reduce(&[ramp(6), ramp(5)], &axes, &ReduceOptions::default()),
            Err(Error::StreamIncomplete {
                channel: 1,
                expected: 6,
                received: 5
            })
        ));
        assert!(matches!(
            reduce(&[ramp(7)], &axes, &ReduceOptions::default()),
            Err(Error::StreamOverrun { .. })
        ));
    }

    #[test]
    fn test_threshold_requires_angle() {
        let axes = vec![LoopAxis::repetitions(2)];
        let options = ReduceOptions {
            threshold: Some(vec![0.0]),
            ..Default::default()
        };
        assert!(matches!(
            reduce(&[ramp(2)], &axes, &options),
            Err(Error::InvalidAcquireConfig(_))
        ));

        let options = ReduceOptions {
            threshold: Some(vec![0.0, 1.0]),
            angle: Some(vec![0.0, 0.0]),
            ..Default::default()
        };
        assert!(matches!(
            reduce(&[ramp(2)], &axes, &options),
            Err(Error::InvalidAcquireConfig(_))
        ));
    }

    #[test]
    fn test_threshold_shots() {
        let axes = vec![LoopAxis::sweep("expts", 2), LoopAxis::repetitions(2)];
        let raw = vec![AcquisitionBuffer::from_rows(&[
            [1.0, 0.0],
            [-1.0, 0.0],
            [0.0, -2.0],
            [0.0, 2.0],
        ])];
        let options = ReduceOptions {
            threshold: Some(vec![0.5]),
            angle: Some(vec![0.0]),
            ..Default::default()
        };
        let shots = reduce(&raw, &axes, &options).unwrap().shots.unwrap();
        assert_eq!(shots[0].shape(), &[2, 2]);
        assert_eq!(
            shots[0].iter().copied().collect::<Vec<_>>(),
            vec![true, false, false, false]
        );

        // Rotating by 90 degrees maps -Q onto I.
        let options = ReduceOptions {
            threshold: Some(vec![0.5]),
            angle: Some(vec![FRAC_PI_2]),
            ..Default::default()
        };
        let shots = reduce(&raw, &axes, &options).unwrap().shots.unwrap();
        assert_eq!(
            shots[0].iter().copied().collect::<Vec<_>>(),
            vec![false, false, true, false]
        );
    }
}
