// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::registers::ChannelRegisters;
use crate::{Address, Channel, Page, Register};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    Add,
    Sub,
}

impl AluOp {
    pub fn apply(&self, lhs: i64, rhs: i64) -> i64 {
        match self {
            AluOp::Add => lhs.wrapping_add(rhs),
            AluOp::Sub => lhs.wrapping_sub(rhs),
        }
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AluOp::Add => write!(f, "+"),
            AluOp::Sub => write!(f, "-"),
        }
    }
}

/// Register values of one pulse, together with the bank they are written to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PulseRegisters {
    pub channel: Channel,
    pub registers: ChannelRegisters,
    /// Envelope the pulse plays.
    pub waveform: String,
    pub frequency: i64,
    pub phase: i64,
    pub gain: i64,
    /// Pulse length in fabric clock cycles.
    pub length: u32,
    /// Packed mode register value, see [`crate::pulse::mode_code`].
    pub mode: u32,
    pub delay: i64,
}

impl PulseRegisters {
    /// Register writes that load this pulse into its bank, in `set` order.
    pub fn register_writes(&self) -> [(Register, i64); 6] {
        let regs = &self.registers;
        [
            (regs.frequency, self.frequency),
            (regs.phase, self.phase),
            (regs.address, 0),
            (regs.gain, self.gain),
            (regs.mode, i64::from(self.mode)),
            (regs.delay, self.delay),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    RegisterWriteImmediate {
        page: Page,
        register: Register,
        value: i64,
    },
    ArithmeticImmediate {
        page: Page,
        destination: Register,
        source: Register,
        op: AluOp,
        value: i64,
    },
    MemoryWriteImmediate {
        page: Page,
        register: Register,
        address: Address,
    },
    Label {
        name: String,
    },
    /// Decrement `register` and jump to `label` while it was nonzero.
    LoopDecrementJump {
        page: Page,
        register: Register,
        label: String,
    },
    End,
    SetPulseRegisters(PulseRegisters),
    AddGaussianEnvelope {
        channel: Channel,
        name: String,
        sigma: u32,
        length: u32,
    },
}

impl Instruction {
    pub fn is_pulse(&self) -> bool {
        matches!(
            self,
            Instruction::SetPulseRegisters(_) | Instruction::AddGaussianEnvelope { .. }
        )
    }
}
