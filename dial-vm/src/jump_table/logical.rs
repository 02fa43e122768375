//! Boolean opcodes: `NOT`, `AND`, `OR`.
//!
//! Operate on truthiness (`ExecutionEngine::is_truthy`), not strict `Bool`
//! equality, and always produce a `Bool`.

use crate::error::DialResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;
use crate::value::Value;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::Not, not);
    table.register(OpCode::And, and);
    table.register(OpCode::Or, or);
}

fn not(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let a = engine.pop()?;
    let truthy = engine.is_truthy(a);
    engine.push(Value::Bool(!truthy))?;
    Ok(StepOutcome::Continue)
}

fn and(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let b = engine.pop()?;
    let a = engine.pop()?;
    let result = engine.is_truthy(a) && engine.is_truthy(b);
    engine.push(Value::Bool(result))?;
    Ok(StepOutcome::Continue)
}

fn or(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let b = engine.pop()?;
    let a = engine.pop()?;
    let result = engine.is_truthy(a) || engine.is_truthy(b);
    engine.push(Value::Bool(result))?;
    Ok(StepOutcome::Continue)
}
