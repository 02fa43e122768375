//! Comparison opcodes: `EQ`, `NE`, `LT`, `LE`, `GT`, `GE`.
//!
//! Equality reuses `Value`'s derived `PartialEq` (safe because interning
//! guarantees equal-content strings share a handle), widened with an
//! explicit numeric cross-tag case for `Int32`/`Float32` pairs. Ordering
//! only applies to numeric pairs and widens the same way; any other pair
//! compares as `false` for every ordering opcode.

use crate::error::DialResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;
use crate::value::Value;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::Eq, eq);
    table.register(OpCode::Ne, ne);
    table.register(OpCode::Lt, lt);
    table.register(OpCode::Le, le);
    table.register(OpCode::Gt, gt);
    table.register(OpCode::Ge, ge);
}

fn values_equal(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Int32(x), Value::Float32(y)) => x as f32 == y,
        (Value::Float32(x), Value::Int32(y)) => x == y as f32,
        _ => a == b,
    }
}

fn numeric_pair(a: Value, b: Value) -> Option<(f64, f64)> {
    match (a, b) {
        (Value::Int32(x), Value::Int32(y)) => Some((x as f64, y as f64)),
        (Value::Int32(x), Value::Float32(y)) => Some((x as f64, y as f64)),
        (Value::Float32(x), Value::Int32(y)) => Some((x as f64, y as f64)),
        (Value::Float32(x), Value::Float32(y)) => Some((x as f64, y as f64)),
        _ => None,
    }
}

fn pop_pair(engine: &mut ExecutionEngine) -> DialResult<(Value, Value)> {
    let b = engine.pop()?;
    let a = engine.pop()?;
    Ok((a, b))
}

fn eq(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    engine.push(Value::Bool(values_equal(a, b)))?;
    Ok(StepOutcome::Continue)
}

fn ne(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    engine.push(Value::Bool(!values_equal(a, b)))?;
    Ok(StepOutcome::Continue)
}

fn lt(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    let result = numeric_pair(a, b).map(|(x, y)| x < y).unwrap_or(false);
    engine.push(Value::Bool(result))?;
    Ok(StepOutcome::Continue)
}

fn le(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    let result = numeric_pair(a, b).map(|(x, y)| x <= y).unwrap_or(false);
    engine.push(Value::Bool(result))?;
    Ok(StepOutcome::Continue)
}

fn gt(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    let result = numeric_pair(a, b).map(|(x, y)| x > y).unwrap_or(false);
    engine.push(Value::Bool(result))?;
    Ok(StepOutcome::Continue)
}

fn ge(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    let result = numeric_pair(a, b).map(|(x, y)| x >= y).unwrap_or(false);
    engine.push(Value::Bool(result))?;
    Ok(StepOutcome::Continue)
}
