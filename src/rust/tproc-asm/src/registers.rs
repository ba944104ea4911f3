// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Static register allocation.
//!
//! Every generator channel owns one bank of six registers on a fixed page:
//!
//! ```text
//! page 0                     loop counters and the progress counter
//! page floor(ch / 2) + 1     bank at offset 0 (even ch) or 10 (odd ch)
//!   offset + 1               frequency
//!   offset + 2               phase
//!   offset + 3               waveform address (always 0)
//!   offset + 4               gain
//!   offset + 5               mode code
//!   offset + 6               delay
//! ```
//!
//! The mapping is a pure function of the channel id, so registers are never
//! recycled within a program and no bookkeeping is needed.

use crate::{Channel, Error, Page, Register, Result};

/// Number of registers per page.
pub const REGISTERS_PER_PAGE: Register = 32;

/// Page reserved for loop counters and the progress counter.
pub const COUNTER_PAGE: Page = 0;

/// Counter of completed innermost loop iterations.
pub const PROGRESS_REGISTER: Register = 13;

/// Counter register of the outermost loop axis; inner axes follow upwards.
pub const FIRST_AXIS_REGISTER: Register = 14;

/// Maximum number of nested loop axes that fit on the counter page.
pub const MAX_LOOP_AXES: usize = (REGISTERS_PER_PAGE - FIRST_AXIS_REGISTER) as usize;

const ODD_BANK_OFFSET: Register = 10;

pub fn page_for(channel: Channel) -> Page {
    channel / 2 + 1
}

pub fn bank_offset(channel: Channel) -> Register {
    if channel % 2 == 1 { ODD_BANK_OFFSET } else { 0 }
}

/// Counter register for the axis at `index` (0 = outermost), if it fits the page.
pub fn axis_counter_register(index: usize) -> Option<Register> {
    if index < MAX_LOOP_AXES {
        Some(FIRST_AXIS_REGISTER + index as Register)
    } else {
        None
    }
}

/// The register bank of a single generator channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelRegisters {
    pub page: Page,
    pub frequency: Register,
    pub phase: Register,
    pub address: Register,
    pub gain: Register,
    pub mode: Register,
    pub delay: Register,
}

impl ChannelRegisters {
    pub fn for_channel(channel: Channel) -> Self {
        let offset = bank_offset(channel);
        ChannelRegisters {
            page: page_for(channel),
            frequency: offset + 1,
            phase: offset + 2,
            address: offset + 3,
            gain: offset + 4,
            mode: offset + 5,
            delay: offset + 6,
        }
    }

    /// Slots in the order the `set` instruction consumes them.
    pub fn slots(&self) -> [Register; 6] {
        [
            self.frequency,
            self.phase,
            self.address,
            self.gain,
            self.mode,
            self.delay,
        ]
    }
}

/// Verify that a channel bank does not share any register with the loop counters.
///
/// Channel pages start at 1, so a failure here means the allocation table
/// itself is broken.
pub fn check_counter_isolation(bank: &ChannelRegisters, counters: &[Register]) -> Result<()> {
    if bank.page != COUNTER_PAGE {
        return Ok(());
    }
    if let Some(register) = bank.slots().into_iter().find(|r| counters.contains(r)) {
        return Err(Error::RegisterCollision {
            page: bank.page,
            register,
            reason: "used both as a loop counter and as a channel register".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_page_and_bank() {
        assert_eq!(page_for(0), 1);
        assert_eq!(page_for(1), 1);
        assert_eq!(page_for(2), 2);
        assert_eq!(page_for(7), 4);
        assert_eq!(bank_offset(0), 0);
        assert_eq!(bank_offset(3), 10);

        let regs = ChannelRegisters::for_channel(5);
        assert_eq!(regs.page, 3);
        assert_eq!(regs.slots(), [11, 12, 13, 14, 15, 16]);
    }

    #[test]
    fn test_allocation_is_collision_free() {
        let counters: Vec<Register> = std::iter::once(PROGRESS_REGISTER)
            .chain((0..MAX_LOOP_AXES).filter_map(axis_counter_register))
            .collect();
        let mut seen = HashSet::new();
        for channel in 0..64 {
            let regs = ChannelRegisters::for_channel(channel);
            assert_eq!(regs.page, channel / 2 + 1);
            assert_eq!(regs, ChannelRegisters::for_channel(channel));
            let slots: HashSet<_> = regs.slots().into_iter().collect();
            assert_eq!(slots.len(), 6);
            for slot in regs.slots() {
                assert!(slot < REGISTERS_PER_PAGE);
                assert!(seen.insert((regs.page, slot)));
            }
            assert_ne!(regs.page, COUNTER_PAGE);
            check_counter_isolation(&regs, &counters).unwrap();
        }
    }

    #[test]
    fn test_axis_registers() {
        assert_eq!(axis_counter_register(0), Some(14));
        assert_eq!(axis_counter_register(1), Some(15));
        assert_eq!(axis_counter_register(MAX_LOOP_AXES - 1), Some(31));
        assert_eq!(axis_counter_register(MAX_LOOP_AXES), None);
    }

    #[test]
    fn test_counter_page_bank_is_rejected() {
        let bank = ChannelRegisters {
            page: COUNTER_PAGE,
            ..ChannelRegisters::for_channel(0)
        };
        let err = check_counter_isolation(&bank, &[4]).unwrap_err();
        assert!(matches!(err, Error::RegisterCollision { register: 4, .. }));
    }
}
