// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Experiment configuration.
//!
//! The configuration is read from JSON, e.g.
//!
//! ```json
//! {
//!   "reps": 1000,
//!   "expts": 50, "start": 0, "step": 10,
//!   "rounds": 1,
//!   "ro_chs": [0],
//!   "qubit": {
//!     "0": {"freq": 100, "phase": 0, "gain": 2000, "length": 40, "sigma": 10}
//!   }
//! }
//! ```
//!
//! and validated as a whole before anything is compiled.

use crate::{Channel, Error, Result};
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tproc_asm::pulse::{MAX_PULSE_LENGTH, MIN_PULSE_LENGTH};

/// Pulse parameters of one generator channel, in register units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub freq: i64,
    pub phase: i64,
    pub gain: i64,
    pub length: u32,
    pub sigma: u32,
}

impl ChannelConfig {
    fn validate(&self, channel: Channel) -> Result<()> {
        if !(MIN_PULSE_LENGTH..=MAX_PULSE_LENGTH).contains(&self.length) {
            return Err(Error::InvalidConfig(format!(
                "channel {channel}: pulse length {} must be within [{MIN_PULSE_LENGTH}, {MAX_PULSE_LENGTH}]",
                self.length
            )));
        }
        if self.sigma == 0 {
            return Err(Error::InvalidConfig(format!(
                "channel {channel}: gaussian sigma must be positive"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub reps: usize,
    #[serde(default)]
    pub expts: Option<usize>,
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub rounds: Option<u32>,
    #[serde(default)]
    pub soft_avgs: Option<u32>,
    /// Readout channels to acquire from.
    #[serde(default)]
    pub ro_chs: Vec<Channel>,
    #[serde(rename = "qubit", default)]
    pub channels: IndexMap<Channel, ChannelConfig>,
}

/// Parameter sweep of the outer loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepConfig {
    pub expts: usize,
    pub start: f64,
    pub step: f64,
}

impl SweepConfig {
    /// Swept values, `start + i * step` for every experiment point `i`.
    pub fn expt_pts(&self) -> Vec<f64> {
        (0..self.expts)
            .map(|i| self.start + i as f64 * self.step)
            .collect()
    }
}

impl ProgramConfig {
    pub fn new(reps: usize) -> Self {
        ProgramConfig {
            reps,
            expts: None,
            start: None,
            step: None,
            rounds: None,
            soft_avgs: None,
            ro_chs: vec![],
            channels: IndexMap::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ProgramConfig =
            serde_json::from_str(json).context("Failed to parse program configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.reps == 0 {
            return Err(Error::InvalidConfig("'reps' must be at least 1".into()));
        }
        if self.expts == Some(0) {
            return Err(Error::InvalidConfig("'expts' must be at least 1".into()));
        }
        if self.rounds() == 0 {
            return Err(Error::InvalidConfig("'rounds' must be at least 1".into()));
        }
        for (channel, config) in &self.channels {
            config.validate(*channel)?;
        }
        Ok(())
    }

    /// Number of software averaging rounds; `rounds` takes precedence over `soft_avgs`.
    pub fn rounds(&self) -> u32 {
        self.rounds.or(self.soft_avgs).unwrap_or(1)
    }

    pub fn channel(&self, channel: Channel) -> Result<&ChannelConfig> {
        self.channels
            .get(&channel)
            .ok_or(Error::ConfigMissing { channel })
    }

    pub fn sweep(&self) -> Result<SweepConfig> {
        match (self.expts, self.start, self.step) {
            (Some(expts), Some(start), Some(step)) => Ok(SweepConfig { expts, start, step }),
            _ => Err(Error::InvalidConfig(
                "a sweep requires 'expts', 'start' and 'step'".into(),
            )),
        }
    }
}
