// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Compile gate listings into looped tProc programs and acquire averaged I/Q data.

use std::fmt::Display;

pub mod acquire;
pub mod config;
pub mod engine;
pub mod gate_listing;
pub mod loop_template;
pub mod settings;
pub mod translator;

pub use acquire::{Acquired, AveragerProgram, RAveragerProgram, SweepAcquired};
pub use config::{ChannelConfig, ProgramConfig, SweepConfig};
pub use engine::{ExecutionEngine, SimulatedEngine};
pub use iq_reduce::{LoopAxis, ReduceOptions};
pub use settings::{CompilerSettings, UnsupportedGatePolicy};

pub use tproc_asm::Channel;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No configuration for channel {channel}")]
    ConfigMissing { channel: Channel },
    #[error("Gate '{mnemonic}' is not supported")]
    UnsupportedGate { mnemonic: String },
    #[error("Malformed gate listing line: {0}")]
    MalformedLine(String),
    #[error("Invalid loop axes: {0}")]
    InvalidAxes(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Acquisition completed {completed} of {expected} shots")]
    StreamIncomplete { expected: u64, completed: u64 },
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<Error>,
    },
    #[error(transparent)]
    Asm(#[from] tproc_asm::Error),
    #[error(transparent)]
    Reduce(#[from] iq_reduce::Error),
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

    /// The error without any line context.
    pub fn root(&self) -> &Error {
        match self {
            Error::AtLine { source, .. } => source.root(),
            _ => self,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
