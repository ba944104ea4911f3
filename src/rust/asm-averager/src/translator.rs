// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Translation of gate listing lines into pulse instructions.

use crate::config::{ChannelConfig, ProgramConfig};
use crate::gate_listing::{ChannelRef, GateLine, tokenize_line};
use crate::settings::{CompilerSettings, UnsupportedGatePolicy};
use crate::{Channel, Error, Result};
use tproc_asm::instruction::{Instruction, PulseRegisters};
use tproc_asm::pulse::mode_code;
use tproc_asm::registers::ChannelRegisters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    /// Hadamard, played as a half-length pulse.
    H,
    /// Full-length pi pulse.
    X,
}

const GATE_TABLE: [(&str, GateKind); 2] = [("h", GateKind::H), ("x", GateKind::X)];

impl GateKind {
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        GATE_TABLE
            .iter()
            .find(|(name, _)| *name == mnemonic)
            .map(|(_, kind)| *kind)
    }

    pub fn scale_length(&self, length: u32) -> u32 {
        match self {
            GateKind::H => length / 2,
            GateKind::X => length,
        }
    }
}

/// A recognized gate with the pulse parameters of its target channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRecord {
    pub kind: GateKind,
    pub channel: Channel,
    /// Channel parameters with the length already scaled for the gate.
    pub pulse: ChannelConfig,
}

impl GateRecord {
    pub fn new(kind: GateKind, channel: Channel, config: &ProgramConfig) -> Result<Self> {
        let channel_config = config.channel(channel)?;
        Ok(GateRecord {
            kind,
            channel,
            pulse: ChannelConfig {
                length: kind.scale_length(channel_config.length),
                ..*channel_config
            },
        })
    }

    fn instructions(&self, settings: &CompilerSettings) -> Result<[Instruction; 2]> {
        let pulse = &self.pulse;
        let set = Instruction::SetPulseRegisters(PulseRegisters {
            channel: self.channel,
            registers: ChannelRegisters::for_channel(self.channel),
            waveform: settings.waveform.clone(),
            frequency: pulse.freq,
            phase: pulse.phase,
            gain: pulse.gain,
            length: pulse.length,
            mode: mode_code(pulse.length, &settings.pulse_mode)?,
            delay: 0,
        });
        let envelope = Instruction::AddGaussianEnvelope {
            channel: self.channel,
            name: settings.waveform.clone(),
            sigma: pulse.sigma,
            length: pulse.length,
        };
        Ok([set, envelope])
    }
}

fn single_channel_operand(mnemonic: &str, operands: &[String]) -> Result<Channel> {
    match operands {
        [operand] => Ok(ChannelRef::parse(operand)?.index),
        _ => Err(Error::MalformedLine(format!(
            "'{mnemonic}' takes exactly one operand, got {}",
            operands.len()
        ))),
    }
}

/// Translate a single tokenized line.
///
/// Headers, declarations and blank lines produce no instructions.
pub fn translate(
    line: &GateLine,
    config: &ProgramConfig,
    settings: &CompilerSettings,
) -> Result<Vec<Instruction>> {
    let (mnemonic, operands) = match line {
        GateLine::Empty | GateLine::Header | GateLine::Declaration { .. } => return Ok(vec![]),
        GateLine::Gate { mnemonic, operands } => (mnemonic, operands),
    };
    let Some(kind) = GateKind::from_mnemonic(mnemonic) else {
        return match settings.unsupported_gates {
            UnsupportedGatePolicy::Skip => {
                tproc_log::warn!("Skipping unsupported gate '{}'", mnemonic);
                Ok(vec![])
            }
            UnsupportedGatePolicy::Reject => Err(Error::UnsupportedGate {
                mnemonic: mnemonic.clone(),
            }),
        };
    };
    let channel = single_channel_operand(mnemonic, operands)?;
    let record = GateRecord::new(kind, channel, config)?;
    tproc_log::diagnostic!(
        "{} on channel {} -> length {}, sigma {}",
        mnemonic,
        channel,
        record.pulse.length,
        record.pulse.sigma
    );
    Ok(record.instructions(settings)?.to_vec())
}

/// Translate a whole gate listing.
///
/// The first failing line aborts the translation; its 1-based line number is
/// attached to the error.
pub fn translate_listing(
    listing: &str,
    config: &ProgramConfig,
    settings: &CompilerSettings,
) -> Result<Vec<Instruction>> {
    let mut instructions = vec![];
    for (index, line) in listing.lines().enumerate() {
        let translated =
            translate(&tokenize_line(line), config, settings).map_err(|e| Error::AtLine {
                line: index + 1,
                source: Box::new(e),
            })?;
        instructions.extend(translated);
    }
    Ok(instructions)
}
