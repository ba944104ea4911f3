// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::instruction::{AluOp, Instruction, PulseRegisters};
use crate::{Address, Error, Page, Register, Result};
use std::collections::HashSet;

/// An ordered, immutable sequence of instructions ready to be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Render the program as tProc assembly.
    pub fn to_asm(&self) -> String {
        self.instructions.iter().map(emit_instruction).collect()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

fn emit_set_pulse(pulse: &PulseRegisters) -> String {
    let page = pulse.registers.page;
    let mut text: String = pulse
        .register_writes()
        .iter()
        .map(|(register, value)| format!("  regwi {page}, ${register}, {value};\n"))
        .collect();
    let slots = pulse
        .registers
        .slots()
        .iter()
        .map(|r| format!("${r}"))
        .collect::<Vec<String>>()
        .join(", ");
    text += &format!("  set {}, {page}, {slots};\n", pulse.channel);
    text
}

fn emit_instruction(instruction: &Instruction) -> String {
    match instruction {
        Instruction::RegisterWriteImmediate {
            page,
            register,
            value,
        } => format!("  regwi {page}, ${register}, {value};\n"),
        Instruction::ArithmeticImmediate {
            page,
            destination,
            source,
            op,
            value,
        } => format!("  mathi {page}, ${destination}, ${source} {op} {value};\n"),
        Instruction::MemoryWriteImmediate {
            page,
            register,
            address,
        } => format!("  memwi {page}, ${register}, {address};\n"),
        Instruction::Label { name } => format!("{name}:\n"),
        Instruction::LoopDecrementJump {
            page,
            register,
            label,
        } => format!("  loopnz {page}, ${register}, @{label};\n"),
        Instruction::End => "  end;\n".to_string(),
        Instruction::SetPulseRegisters(pulse) => emit_set_pulse(pulse),
        Instruction::AddGaussianEnvelope {
            channel,
            name,
            sigma,
            length,
        } => format!("  // envelope {name} on ch {channel}: gauss sigma={sigma} length={length}\n"),
    }
}

/// Append-only builder for a [`Program`].
///
/// Labels are tracked so that a label cannot be defined twice and every
/// jump target is known by the time the program is finished.
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    labels: HashSet<String>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instruction(&mut self, instruction: Instruction) -> Result<()> {
        if let Instruction::Label { name } = &instruction {
            if !self.labels.insert(name.clone()) {
                return Err(Error::DuplicateLabel(name.clone()));
            }
        }
        self.instructions.push(instruction);
        Ok(())
    }

    pub fn extend<I>(&mut self, instructions: I) -> Result<()>
    where
        I: IntoIterator<Item = Instruction>,
    {
        for instruction in instructions {
            self.add_instruction(instruction)?;
        }
        Ok(())
    }

    pub fn add_register_write(&mut self, page: Page, register: Register, value: i64) {
        self.instructions.push(Instruction::RegisterWriteImmediate {
            page,
            register,
            value,
        });
    }

    pub fn add_arithmetic(
        &mut self,
        page: Page,
        destination: Register,
        source: Register,
        op: AluOp,
        value: i64,
    ) {
        self.instructions.push(Instruction::ArithmeticImmediate {
            page,
            destination,
            source,
            op,
            value,
        });
    }

    pub fn add_memory_write(&mut self, page: Page, register: Register, address: Address) {
        self.instructions.push(Instruction::MemoryWriteImmediate {
            page,
            register,
            address,
        });
    }

    pub fn add_label<S: Into<String>>(&mut self, name: S) -> Result<()> {
        self.add_instruction(Instruction::Label { name: name.into() })
    }

    pub fn add_loop_decrement_jump<S: Into<String>>(
        &mut self,
        page: Page,
        register: Register,
        label: S,
    ) {
        self.instructions.push(Instruction::LoopDecrementJump {
            page,
            register,
            label: label.into(),
        });
    }

    pub fn add_end(&mut self) {
        self.instructions.push(Instruction::End);
    }

    pub fn finish(self) -> Result<Program> {
        for instruction in &self.instructions {
            if let Instruction::LoopDecrementJump { label, .. } = instruction {
                if !self.labels.contains(label) {
                    return Err(Error::UndefinedLabel(label.clone()));
                }
            }
        }
        Ok(Program {
            instructions: self.instructions,
        })
    }
}
