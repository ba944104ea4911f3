// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Reference interpreter for tProc programs.
//!
//! The simulator executes the control flow and register arithmetic of a
//! [`Program`] without any notion of time. It is used to check generated
//! loop structures and to drive the simulated execution engine.

use crate::instruction::Instruction;
use crate::program::Program;
use crate::registers::REGISTERS_PER_PAGE;
use crate::{Address, Channel, Error, Page, Register, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

pub const DEFAULT_STEP_LIMIT: u64 = 100_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredPulse {
    pub channel: Channel,
    pub waveform: String,
    pub length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sigma: u32,
    pub length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationReport {
    /// Number of executed instructions, labels included.
    pub steps: u64,
    pub pulses: Vec<FiredPulse>,
}

#[derive(Debug, Clone)]
pub struct Simulator {
    step_limit: u64,
    registers: HashMap<(Page, Register), i64>,
    /// Data memory survives between runs, as on the device.
    memory: IndexMap<Address, i64>,
    envelopes: IndexMap<(Channel, String), Envelope>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::with_step_limit(DEFAULT_STEP_LIMIT)
    }

    pub fn with_step_limit(step_limit: u64) -> Self {
        Simulator {
            step_limit,
            registers: HashMap::new(),
            memory: IndexMap::new(),
            envelopes: IndexMap::new(),
        }
    }

    pub fn register(&self, page: Page, register: Register) -> i64 {
        self.registers
            .get(&(page, register))
            .copied()
            .unwrap_or_default()
    }

    pub fn memory(&self, address: Address) -> Option<i64> {
        self.memory.get(&address).copied()
    }

    pub fn envelope(&self, channel: Channel, name: &str) -> Option<&Envelope> {
        self.envelopes.get(&(channel, name.to_string()))
    }

    fn write_register(&mut self, page: Page, register: Register, value: i64) -> Result<()> {
        if register >= REGISTERS_PER_PAGE {
            return Err(Error::RegisterOutOfRange { page, register });
        }
        self.registers.insert((page, register), value);
        Ok(())
    }

    fn read_register(&self, page: Page, register: Register) -> Result<i64> {
        if register >= REGISTERS_PER_PAGE {
            return Err(Error::RegisterOutOfRange { page, register });
        }
        Ok(self.register(page, register))
    }

    /// Execute `program` from the first instruction until `end`.
    ///
    /// Registers are cleared before the run, data memory is kept.
    pub fn run(&mut self, program: &Program) -> Result<SimulationReport> {
        let instructions = program.instructions();
        let labels: HashMap<&str, usize> = instructions
            .iter()
            .enumerate()
            .filter_map(|(index, instruction)| match instruction {
                Instruction::Label { name } => Some((name.as_str(), index)),
                _ => None,
            })
            .collect();

        self.registers.clear();
        let mut pulses = vec![];
        let mut steps: u64 = 0;
        let mut pc = 0;
        loop {
            let Some(instruction) = instructions.get(pc) else {
                return Err(Error::new(
                    "Program ran past its last instruction without reaching 'end'",
                ));
            };
            steps += 1;
            if steps > self.step_limit {
                return Err(Error::StepLimitExceeded(self.step_limit));
            }
            pc += 1;
            match instruction {
                Instruction::RegisterWriteImmediate {
                    page,
                    register,
                    value,
                } => self.write_register(*page, *register, *value)?,
                Instruction::ArithmeticImmediate {
                    page,
                    destination,
                    source,
                    op,
                    value,
                } => {
                    let result = op.apply(self.read_register(*page, *source)?, *value);
                    self.write_register(*page, *destination, result)?;
                }
                Instruction::MemoryWriteImmediate {
                    page,
                    register,
                    address,
                } => {
                    let value = self.read_register(*page, *register)?;
                    self.memory.insert(*address, value);
                }
                Instruction::Label { .. } => {}
                Instruction::LoopDecrementJump {
                    page,
                    register,
                    label,
                } => {
                    let counter = self.read_register(*page, *register)?;
                    if counter != 0 {
                        self.write_register(*page, *register, counter - 1)?;
                        pc = *labels
                            .get(label.as_str())
                            .ok_or_else(|| Error::UndefinedLabel(label.clone()))?;
                    }
                }
                Instruction::End => break,
                Instruction::SetPulseRegisters(pulse) => {
                    let page = pulse.registers.page;
                    for (register, value) in pulse.register_writes() {
                        self.write_register(page, register, value)?;
                    }
                    pulses.push(FiredPulse {
                        channel: pulse.channel,
                        waveform: pulse.waveform.clone(),
                        length: pulse.length,
                    });
                }
                Instruction::AddGaussianEnvelope {
                    channel,
                    name,
                    sigma,
                    length,
                } => {
                    self.envelopes.insert(
                        (*channel, name.clone()),
                        Envelope {
                            sigma: *sigma,
                            length: *length,
                        },
                    );
                }
            }
        }
        tproc_log::debug!(
            "Simulation finished after {} steps with {} pulses",
            steps,
            pulses.len()
        );
        Ok(SimulationReport { steps, pulses })
    }
}
