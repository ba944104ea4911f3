// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Module for defining settings for the compiler.

use tproc_asm::Address;
use tproc_asm::pulse::ModeSettings;

/// What to do with gate mnemonics that have no translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsupportedGatePolicy {
    /// Drop the line with a warning.
    #[default]
    Skip,
    /// Fail the compilation.
    Reject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilerSettings {
    /// Data memory address the progress counter is written to.
    pub progress_address: Address,
    pub unsupported_gates: UnsupportedGatePolicy,
    pub pulse_mode: ModeSettings,
    /// Name of the gaussian envelope used by all gate pulses.
    pub waveform: String,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        CompilerSettings {
            progress_address: 1,
            unsupported_gates: UnsupportedGatePolicy::default(),
            pulse_mode: ModeSettings::default(),
            waveform: "qubit".to_string(),
        }
    }
}
