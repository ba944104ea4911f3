// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Averaging programs and their acquisition.
//!
//! [`AveragerProgram`] repeats its body `reps` times. [`RAveragerProgram`]
//! additionally sweeps a parameter in an outer loop of `expts` points, which
//! keeps the sweep inside the real-time program instead of looping in
//! software.

use crate::config::{ProgramConfig, SweepConfig};
use crate::engine::ExecutionEngine;
use crate::loop_template::{InstructionBody, ProgramTemplate, build};
use crate::settings::CompilerSettings;
use crate::translator::translate_listing;
use crate::{Error, Result};
use iq_reduce::{
    AcquisitionBuffer, LoopAxis, ReduceOptions, Reduced, expected_samples, reduce, shot_count,
};
use ndarray::ArrayD;
use tproc_asm::Address;
use tproc_asm::program::Program;

/// Averaged data of a repetitions-only program.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquired {
    pub avg_i: Vec<ArrayD<f64>>,
    pub avg_q: Vec<ArrayD<f64>>,
    pub shots: Option<Vec<ArrayD<bool>>>,
    /// Streamed samples per readout channel, before reduction.
    pub raw: Vec<AcquisitionBuffer>,
}

/// Averaged data of a sweep program, with the swept values.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepAcquired {
    pub expt_pts: Vec<f64>,
    pub avg_i: Vec<ArrayD<f64>>,
    pub avg_q: Vec<ArrayD<f64>>,
    pub shots: Option<Vec<ArrayD<bool>>>,
    pub raw: Vec<AcquisitionBuffer>,
}

#[derive(Debug, Clone)]
struct CompiledProgram {
    program: Program,
    axes: Vec<LoopAxis>,
    rounds: u32,
    readouts: usize,
    progress_address: Address,
}

impl CompiledProgram {
    fn compile(
        axes: Vec<LoopAxis>,
        template: &dyn ProgramTemplate,
        config: &ProgramConfig,
        settings: &CompilerSettings,
    ) -> Result<Self> {
        config.validate()?;
        let program = build(&axes, template, settings)?;
        Ok(CompiledProgram {
            program,
            axes,
            rounds: config.rounds(),
            readouts: config.ro_chs.len(),
            progress_address: settings.progress_address,
        })
    }

    fn acquire(
        &self,
        engine: &mut dyn ExecutionEngine,
        options: &ReduceOptions,
    ) -> Result<(Reduced, Vec<AcquisitionBuffer>)> {
        let reads = options.reads_per_rep();
        if reads == 0 {
            return Err(Error::InvalidConfig(
                "at least one read per repetition is required".into(),
            ));
        }
        if self.readouts == 0 {
            return Err(Error::InvalidConfig(
                "no readout channels configured in 'ro_chs'".into(),
            ));
        }
        if engine.progress_address() != self.progress_address {
            return Err(Error::InvalidConfig(format!(
                "engine reads progress from address {}, the program writes to {}",
                engine.progress_address(),
                self.progress_address
            )));
        }
        let samples = expected_samples(&self.axes, reads)?;
        engine.load(&self.program)?;
        engine.run(self.rounds, reads)?;
        let raw = engine.stream_raw()?;
        if raw.len() != self.readouts {
            return Err(Error::new(format!(
                "Engine streamed {} readout channels, expected {}",
                raw.len(),
                self.readouts
            )));
        }
        let expected = shot_count(&self.axes) as u64;
        let completed = engine.progress()?;
        if completed != expected {
            return Err(Error::StreamIncomplete {
                expected,
                completed,
            });
        }
        if let Some(short) = raw.iter().find(|buffer| buffer.len() < samples) {
            return Err(Error::StreamIncomplete {
                expected,
                completed: (short.len() / reads) as u64,
            });
        }
        tproc_log::info!(
            "Acquired {} shots on {} readout channel(s) over {} round(s)",
            expected,
            self.readouts,
            self.rounds
        );
        let reduced = reduce(&raw, &self.axes, options)?;
        Ok((reduced, raw))
    }
}

pub struct AveragerProgram {
    compiled: CompiledProgram,
}

impl AveragerProgram {
    pub fn new(
        config: &ProgramConfig,
        settings: &CompilerSettings,
        template: &dyn ProgramTemplate,
    ) -> Result<Self> {
        let axes = vec![LoopAxis::repetitions(config.reps)];
        Ok(AveragerProgram {
            compiled: CompiledProgram::compile(axes, template, config, settings)?,
        })
    }

    /// Compile a gate listing as the body of the repetition loop.
    pub fn from_listing(
        listing: &str,
        config: &ProgramConfig,
        settings: &CompilerSettings,
    ) -> Result<Self> {
        let body = InstructionBody::new(translate_listing(listing, config, settings)?);
        Self::new(config, settings, &body)
    }

    pub fn program(&self) -> &Program {
        &self.compiled.program
    }

    pub fn axes(&self) -> &[LoopAxis] {
        &self.compiled.axes
    }

    /// Run the program and return the averaged I and Q values per readout channel.
    ///
    /// Without sweep axes every readout channel yields a single point;
    /// `save_subset` may only refer to index 0.
    pub fn acquire(
        &self,
        engine: &mut dyn ExecutionEngine,
        options: &ReduceOptions,
    ) -> Result<Acquired> {
        let (reduced, raw) = self.compiled.acquire(engine, options)?;
        Ok(Acquired {
            avg_i: reduced.avg_i,
            avg_q: reduced.avg_q,
            shots: reduced.shots,
            raw,
        })
    }
}

pub struct RAveragerProgram {
    compiled: CompiledProgram,
    sweep: SweepConfig,
}

impl RAveragerProgram {
    pub fn new(
        config: &ProgramConfig,
        settings: &CompilerSettings,
        template: &dyn ProgramTemplate,
    ) -> Result<Self> {
        let sweep = config.sweep()?;
        let axes = vec![
            LoopAxis::sweep("expts", sweep.expts),
            LoopAxis::repetitions(config.reps),
        ];
        Ok(RAveragerProgram {
            compiled: CompiledProgram::compile(axes, template, config, settings)?,
            sweep,
        })
    }

    /// Compile a gate listing as the body of the sweep.
    pub fn from_listing(
        listing: &str,
        config: &ProgramConfig,
        settings: &CompilerSettings,
    ) -> Result<Self> {
        let body = InstructionBody::new(translate_listing(listing, config, settings)?);
        Self::new(config, settings, &body)
    }

    pub fn program(&self) -> &Program {
        &self.compiled.program
    }

    pub fn axes(&self) -> &[LoopAxis] {
        &self.compiled.axes
    }

    pub fn expt_pts(&self) -> Vec<f64> {
        self.sweep.expt_pts()
    }

    pub fn acquire(
        &self,
        engine: &mut dyn ExecutionEngine,
        options: &ReduceOptions,
    ) -> Result<SweepAcquired> {
        let (reduced, raw) = self.compiled.acquire(engine, options)?;
        Ok(SweepAcquired {
            expt_pts: self.expt_pts(),
            avg_i: reduced.avg_i,
            avg_q: reduced.avg_q,
            shots: reduced.shots,
            raw,
        })
    }
}
