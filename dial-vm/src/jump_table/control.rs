//! Control-flow opcodes: `JUMP`, `JUMP_IF`, `JUMP_IF_NOT`.
//!
//! Offsets are relative to the program counter *after* the instruction's
//! operand, which [`Instruction::next_pc`] already reflects; the engine's
//! fetch loop sets `self.pc = next_pc` before the handler runs, so a
//! handler only needs to add the offset to the current `pc()`.

use crate::error::{DialError, DialResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::Jump, jump);
    table.register(OpCode::JumpIf, jump_if);
    table.register(OpCode::JumpIfNot, jump_if_not);
}

fn missing_operand() -> DialError {
    DialError::type_mismatch("instruction operand", "none")
}

fn apply_offset(engine: &mut ExecutionEngine, offset: i32) {
    let target = (engine.pc() as i64 + offset as i64) as usize;
    engine.set_pc(target);
}

fn jump(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let offset = operand.as_i32().ok_or_else(missing_operand)?;
    apply_offset(engine, offset);
    Ok(StepOutcome::Continue)
}

fn jump_if(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let offset = operand.as_i32().ok_or_else(missing_operand)?;
    let condition = engine.pop()?;
    if engine.is_truthy(condition) {
        apply_offset(engine, offset);
    }
    Ok(StepOutcome::Continue)
}

fn jump_if_not(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let offset = operand.as_i32().ok_or_else(missing_operand)?;
    let condition = engine.pop()?;
    if !engine.is_truthy(condition) {
        apply_offset(engine, offset);
    }
    Ok(StepOutcome::Continue)
}
