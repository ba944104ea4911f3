// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Instruction set and program representation of the tProc real-time processor.
//!
//! Programs are built with [`program::ProgramBuilder`], addressed through the
//! fixed page/bank layout in [`registers`], rendered to assembly text with
//! [`program::Program::to_asm`] and can be executed by the reference
//! [`simulator::Simulator`].

use std::fmt::Display;

pub mod instruction;
pub mod program;
pub mod pulse;
pub mod registers;
pub mod simulator;

pub use instruction::{AluOp, Instruction, PulseRegisters};
pub use program::{Program, ProgramBuilder};

/// Generator channel index.
pub type Channel = u32;
/// Register page. Page 0 holds the loop counters, channel pages start at 1.
pub type Page = u32;
/// Register number within a page.
pub type Register = u8;
/// Data memory address.
pub type Address = u32;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Register collision on page {page}: ${register} is {reason}")]
    RegisterCollision {
        page: Page,
        register: Register,
        reason: String,
    },
    #[error(
        "Pulse length of {length} is out of range (exceeds 16 bits, or less than 3) - use multiple pulses, or zero-pad the waveform"
    )]
    PulseLengthOutOfRange { length: u32 },
    #[error("Label '{0}' is defined more than once")]
    DuplicateLabel(String),
    #[error("Jump to label '{0}', which is never defined")]
    UndefinedLabel(String),
    #[error("Register ${register} on page {page} is outside of the register file")]
    RegisterOutOfRange { page: Page, register: Register },
    #[error("Program did not reach 'end' within {0} steps")]
    StepLimitExceeded(u64),
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
