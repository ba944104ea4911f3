// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Encoding of the pulse mode register.
//!
//! ```text
//! bits 31..20   unused
//! bit  19       phase reset
//! bit  18       periodic (1) / oneshot (0)
//! bits 17..16   output selection
//! bits 15..0    pulse length
//! ```

use crate::{Error, Result};

pub const MIN_PULSE_LENGTH: u32 = 3;
pub const MAX_PULSE_LENGTH: u32 = (1 << 16) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputSelection {
    #[default]
    Product,
    Dds,
    Input,
    Zero,
}

impl OutputSelection {
    fn code(&self) -> u32 {
        match self {
            OutputSelection::Product => 0,
            OutputSelection::Dds => 1,
            OutputSelection::Input => 2,
            OutputSelection::Zero => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PulseMode {
    #[default]
    Oneshot,
    Periodic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeSettings {
    pub output: OutputSelection,
    pub mode: PulseMode,
    pub phase_reset: bool,
}

/// Pack the mode settings together with the pulse length into a mode register value.
pub fn mode_code(length: u32, settings: &ModeSettings) -> Result<u32> {
    if !(MIN_PULSE_LENGTH..=MAX_PULSE_LENGTH).contains(&length) {
        return Err(Error::PulseLengthOutOfRange { length });
    }
    let mode = match settings.mode {
        PulseMode::Oneshot => 0,
        PulseMode::Periodic => 1,
    };
    let phrst = u32::from(settings.phase_reset);
    let mc = phrst * 0b01000 + mode * 0b00100 + settings.output.code();
    Ok((mc << 16) | length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_code_is_length() {
        assert_eq!(mode_code(40, &ModeSettings::default()).unwrap(), 40);
    }

    #[test]
    fn test_mode_bits() {
        let settings = ModeSettings {
            output: OutputSelection::Input,
            mode: PulseMode::Periodic,
            phase_reset: true,
        };
        assert_eq!(mode_code(100, &settings).unwrap(), (0b1110 << 16) | 100);
        let dds = ModeSettings {
            output: OutputSelection::Dds,
            ..Default::default()
        };
        assert_eq!(mode_code(3, &dds).unwrap(), (1 << 16) | 3);
    }

    #[test]
    fn test_length_limits() {
        let settings = ModeSettings::default();
        assert!(mode_code(MAX_PULSE_LENGTH, &settings).is_ok());
        assert!(matches!(
            mode_code(2, &settings),
            Err(Error::PulseLengthOutOfRange { length: 2 })
        ));
        assert!(matches!(
            mode_code(1 << 16, &settings),
            Err(Error::PulseLengthOutOfRange { .. })
        ));
    }
}
