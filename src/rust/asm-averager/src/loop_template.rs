// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Nested count-down loop template.
//!
//! For axes `[a, b]` (outer to inner) the generated program reads
//!
//! ```text
//!   <initialize>
//!   regwi 0, $13, 0;              progress counter
//!   regwi 0, $14, extent_a - 1;
//! LOOP_A:
//!   regwi 0, $15, extent_b - 1;
//! LOOP_B:
//!   <body>
//!   mathi 0, $13, $13 + 1;
//!   memwi 0, $13, <progress address>;
//!   loopnz 0, $15, @LOOP_B;
//!   <update a>
//!   loopnz 0, $14, @LOOP_A;
//!   end;
//! ```

use crate::settings::CompilerSettings;
use crate::{Error, Result};
use iq_reduce::LoopAxis;
use std::collections::HashSet;
use tproc_asm::Register;
use tproc_asm::instruction::{AluOp, Instruction};
use tproc_asm::program::{Program, ProgramBuilder};
use tproc_asm::registers::{
    COUNTER_PAGE, MAX_LOOP_AXES, PROGRESS_REGISTER, axis_counter_register,
    check_counter_isolation,
};

/// Hooks that fill the loop template.
pub trait ProgramTemplate {
    /// Instructions executed once before the loops.
    fn initialize(&self, _program: &mut ProgramBuilder) -> Result<()> {
        Ok(())
    }

    /// Instructions executed once per innermost iteration.
    fn body(&self, program: &mut ProgramBuilder) -> Result<()>;

    /// Instructions executed each time the loop inside `axis` has completed,
    /// before `axis` advances to its next point.
    fn update(&self, _program: &mut ProgramBuilder, _axis: &LoopAxis) -> Result<()> {
        Ok(())
    }
}

/// A body made of a fixed instruction sequence, e.g. a translated gate listing.
#[derive(Debug, Clone, Default)]
pub struct InstructionBody {
    instructions: Vec<Instruction>,
}

impl InstructionBody {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        InstructionBody { instructions }
    }
}

impl ProgramTemplate for InstructionBody {
    fn body(&self, program: &mut ProgramBuilder) -> Result<()> {
        program.extend(self.instructions.iter().cloned())?;
        Ok(())
    }
}

pub fn loop_label(axis: &LoopAxis) -> String {
    format!("LOOP_{}", axis.name.to_uppercase())
}

fn validate(axes: &[LoopAxis]) -> Result<()> {
    iq_reduce::validate_axes(axes).map_err(|e| match e {
        iq_reduce::Error::InvalidAxes(msg) => Error::InvalidAxes(msg),
        other => other.into(),
    })?;
    if axes.len() > MAX_LOOP_AXES {
        return Err(Error::InvalidAxes(format!(
            "{} axes given, at most {MAX_LOOP_AXES} fit on the counter page",
            axes.len()
        )));
    }
    let mut labels = HashSet::new();
    for axis in axes {
        if !axis
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::InvalidAxes(format!(
                "axis name '{}' is not a valid label",
                axis.name
            )));
        }
        if !labels.insert(loop_label(axis)) {
            return Err(Error::InvalidAxes(format!(
                "axis name '{}' clashes with another axis label",
                axis.name
            )));
        }
        if axis.extent - 1 > i32::MAX as usize {
            return Err(Error::InvalidAxes(format!(
                "extent {} of axis '{}' does not fit a register",
                axis.extent, axis.name
            )));
        }
    }
    Ok(())
}

/// Build the complete program for `axes`, ordered from outermost to innermost.
pub fn build(
    axes: &[LoopAxis],
    template: &dyn ProgramTemplate,
    settings: &CompilerSettings,
) -> Result<Program> {
    validate(axes)?;
    let counters = (0..axes.len())
        .map(|index| {
            axis_counter_register(index)
                .ok_or_else(|| Error::InvalidAxes(format!("no counter register for axis {index}")))
        })
        .collect::<Result<Vec<Register>>>()?;

    let mut program = ProgramBuilder::new();
    template.initialize(&mut program)?;
    program.add_register_write(COUNTER_PAGE, PROGRESS_REGISTER, 0);

    for (axis, &counter) in axes.iter().zip(&counters) {
        program.add_register_write(COUNTER_PAGE, counter, axis.extent as i64 - 1);
        program.add_label(loop_label(axis))?;
    }

    template.body(&mut program)?;
    program.add_arithmetic(
        COUNTER_PAGE,
        PROGRESS_REGISTER,
        PROGRESS_REGISTER,
        AluOp::Add,
        1,
    );
    program.add_memory_write(COUNTER_PAGE, PROGRESS_REGISTER, settings.progress_address);

    for index in (0..axes.len()).rev() {
        program.add_loop_decrement_jump(COUNTER_PAGE, counters[index], loop_label(&axes[index]));
        if index > 0 {
            template.update(&mut program, &axes[index - 1])?;
        }
    }
    program.add_end();

    let program = program.finish()?;
    let mut reserved = counters;
    reserved.push(PROGRESS_REGISTER);
    for instruction in &program {
        if let Instruction::SetPulseRegisters(pulse) = instruction {
            check_counter_isolation(&pulse.registers, &reserved)?;
        }
    }
    tproc_log::info!(
        "Built program with {} instructions over {} loop axes",
        program.len(),
        axes.len()
    );
    Ok(program)
}
