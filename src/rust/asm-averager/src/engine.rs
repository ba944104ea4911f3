// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Capability interface of the execution engine, and a simulated engine.

use crate::{Error, Result};
use iq_reduce::{AcquisitionBuffer, IqSample};
use tproc_asm::Address;
use tproc_asm::program::Program;
use tproc_asm::simulator::Simulator;

/// What the acquisition needs from an execution engine.
///
/// Implementations own the transport to the device; retries, timeouts and
/// cancellation are their business.
pub trait ExecutionEngine {
    fn load(&mut self, program: &Program) -> Result<()>;

    /// Start the loaded program and run it `rounds` times, expecting
    /// `reads_per_rep` readouts per shot.
    fn run(&mut self, rounds: u32, reads_per_rep: usize) -> Result<()>;

    /// Block until all shots have been streamed, returning one buffer per
    /// readout channel with the samples averaged over rounds.
    fn stream_raw(&mut self) -> Result<Vec<AcquisitionBuffer>>;

    /// Current value of the progress counter.
    fn progress(&self) -> Result<u64>;

    fn progress_address(&self) -> Address;
}

/// Engine backed by the reference [`Simulator`].
///
/// Every innermost loop iteration produces `reads_per_rep` samples per readout
/// channel. The value of each is given by `sample(readout, index, round)`, where
/// `index` counts samples in stream order.
pub struct SimulatedEngine<F>
where
    F: FnMut(usize, usize, u32) -> IqSample,
{
    simulator: Simulator,
    program: Option<Program>,
    readouts: usize,
    progress_address: Address,
    sample: F,
    streamed: Option<Vec<AcquisitionBuffer>>,
}

impl<F> SimulatedEngine<F>
where
    F: FnMut(usize, usize, u32) -> IqSample,
{
    pub fn new(readouts: usize, progress_address: Address, sample: F) -> Self {
        SimulatedEngine {
            simulator: Simulator::new(),
            program: None,
            readouts,
            progress_address,
            sample,
            streamed: None,
        }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }
}

impl<F> ExecutionEngine for SimulatedEngine<F>
where
    F: FnMut(usize, usize, u32) -> IqSample,
{
    fn load(&mut self, program: &Program) -> Result<()> {
        self.program = Some(program.clone());
        self.streamed = None;
        Ok(())
    }

    fn run(&mut self, rounds: u32, reads_per_rep: usize) -> Result<()> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| Error::new("No program loaded"))?;
        let mut sums: Vec<Vec<IqSample>> = vec![vec![]; self.readouts];
        for round in 0..rounds {
            self.simulator.run(program)?;
            let shots = self.progress()? as usize;
            for (readout, sum) in sums.iter_mut().enumerate() {
                sum.resize(shots * reads_per_rep, IqSample::new(0.0, 0.0));
                for (index, value) in sum.iter_mut().enumerate() {
                    *value += (self.sample)(readout, index, round);
                }
            }
            tproc_log::debug!("Round {} completed {} shots", round, shots);
        }
        let rounds = f64::from(rounds.max(1));
        self.streamed = Some(
            sums.into_iter()
                .map(|sum| AcquisitionBuffer::new(sum.into_iter().map(|s| s / rounds).collect()))
                .collect(),
        );
        Ok(())
    }

    fn stream_raw(&mut self) -> Result<Vec<AcquisitionBuffer>> {
        self.streamed
            .take()
            .ok_or_else(|| Error::new("Program has not been run"))
    }

    fn progress(&self) -> Result<u64> {
        let value = self.simulator.memory(self.progress_address).unwrap_or(0);
        u64::try_from(value)
            .map_err(|_| Error::new(format!("Negative progress counter value {value}")))
    }

    fn progress_address(&self) -> Address {
        self.progress_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loop_template::{InstructionBody, build};
    use crate::settings::CompilerSettings;
    use iq_reduce::LoopAxis;

    #[test]
    fn test_rounds_are_averaged() {
        let axes = vec![LoopAxis::sweep("expts", 2), LoopAxis::repetitions(2)];
        let program = build(&axes, &InstructionBody::default(), &CompilerSettings::default())
            .unwrap();
        let mut engine = SimulatedEngine::new(2, 1, |readout, shot, round| {
            IqSample::new(shot as f64 + round as f64, readout as f64)
        });
        assert!(engine.run(1, 1).is_err());
        engine.load(&program).unwrap();
        engine.run(3, 1).unwrap();
        assert_eq!(engine.progress().unwrap(), 4);
        let raw = engine.stream_raw().unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].i(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(raw[1].q(), vec![1.0; 4]);
        assert!(engine.stream_raw().is_err());

        engine.run(1, 3).unwrap();
        let raw = engine.stream_raw().unwrap();
        assert_eq!(raw[0].len(), 12);
        assert_eq!(raw[0].i()[11], 11.0);
    }
}
