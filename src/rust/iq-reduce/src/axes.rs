// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::{Error, Result};
use std::collections::HashSet;

/// One dimension of repeated execution.
///
/// Axes are always handled as a list ordered from the outermost to the
/// innermost loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoopAxis {
    pub name: String,
    pub extent: usize,
    /// 0 for repetitions, which are averaged away; 1 and above for sweeps.
    pub level: u32,
}

impl LoopAxis {
    pub fn new<S: Into<String>>(name: S, extent: usize, level: u32) -> Self {
        LoopAxis {
            name: name.into(),
            extent,
            level,
        }
    }

    pub fn repetitions(extent: usize) -> Self {
        Self::new("reps", extent, 0)
    }

    pub fn sweep<S: Into<String>>(name: S, extent: usize) -> Self {
        Self::new(name, extent, 1)
    }

    pub fn is_repetition(&self) -> bool {
        self.level == 0
    }
}

pub fn validate_axes(axes: &[LoopAxis]) -> Result<()> {
    if axes.is_empty() {
        return Err(Error::InvalidAxes("at least one loop axis is required".into()));
    }
    let mut names = HashSet::new();
    let mut shots: usize = 1;
    for axis in axes {
        if axis.extent == 0 {
            return Err(Error::InvalidAxes(format!(
                "axis '{}' has zero extent",
                axis.name
            )));
        }
        if !names.insert(axis.name.as_str()) {
            return Err(Error::InvalidAxes(format!(
                "axis name '{}' is used more than once",
                axis.name
            )));
        }
        shots = shots.checked_mul(axis.extent).ok_or_else(|| {
            Error::InvalidAxes(format!(
                "total shot count overflows at axis '{}' with extent {}",
                axis.name, axis.extent
            ))
        })?;
    }
    Ok(())
}

/// Total number of shots, i.e. innermost loop iterations.
///
/// Only meaningful for axes accepted by [`validate_axes`], which rejects
/// products that overflow.
pub fn shot_count(axes: &[LoopAxis]) -> usize {
    axes.iter().map(|a| a.extent).product()
}

/// Shape of the averaged data: the extents of all non-repetition axes.
///
/// Without any sweep axis the data is a single point, reported with shape `[1]`.
pub fn point_shape(axes: &[LoopAxis]) -> Vec<usize> {
    let shape: Vec<usize> = axes
        .iter()
        .filter(|a| !a.is_repetition())
        .map(|a| a.extent)
        .collect();
    if shape.is_empty() { vec![1] } else { shape }
}

/// Number of averaged points.
pub fn point_count(axes: &[LoopAxis]) -> usize {
    point_shape(axes).iter().product()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let axes = vec![LoopAxis::sweep("expts", 4), LoopAxis::repetitions(3)];
        assert_eq!(shot_count(&axes), 12);
        assert_eq!(point_shape(&axes), vec![4]);
        assert_eq!(point_count(&axes), 4);

        let reps_only = vec![LoopAxis::repetitions(100)];
        assert_eq!(point_shape(&reps_only), vec![1]);
        assert_eq!(point_count(&reps_only), 1);
    }

    #[test]
    fn test_validate_axes() {
        assert!(validate_axes(&[LoopAxis::repetitions(1)]).is_ok());
        assert!(matches!(validate_axes(&[]), Err(Error::InvalidAxes(_))));
        assert!(matches!(
            validate_axes(&[LoopAxis::sweep("a", 2), LoopAxis::repetitions(0)]),
            Err(Error::InvalidAxes(_))
        ));
        assert!(matches!(
            validate_axes(&[LoopAxis::sweep("a", 2), LoopAxis::sweep("a", 3)]),
            Err(Error::InvalidAxes(_))
        ));
    }

    #[test]
    fn test_shot_count_overflow() {
        let huge = usize::MAX / 2 + 1;
        assert!(validate_axes(&[LoopAxis::sweep("a", huge), LoopAxis::repetitions(1)]).is_ok());
        assert!(matches!(
            validate_axes(&[LoopAxis::sweep("a", huge), LoopAxis::repetitions(2)]),
            Err(Error::InvalidAxes(_))
        ));
    }
}
