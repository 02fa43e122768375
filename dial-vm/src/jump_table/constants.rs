//! Literal-push opcodes: `PUSH_NULL`, `PUSH_TRUE`, `PUSH_FALSE`,
//! `PUSH_I8`/`PUSH_I16`/`PUSH_I32`/`PUSH_F32`, `PUSH_STR`.

use crate::error::{DialError, DialResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;
use crate::value::Value;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::PushNull, push_null);
    table.register(OpCode::PushTrue, push_true);
    table.register(OpCode::PushFalse, push_false);
    table.register(OpCode::PushI8, push_i8);
    table.register(OpCode::PushI16, push_i16);
    table.register(OpCode::PushI32, push_i32);
    table.register(OpCode::PushF32, push_f32);
    table.register(OpCode::PushStr, push_str);
}

fn missing_operand() -> DialError {
    DialError::type_mismatch("instruction operand", "none")
}

fn push_null(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    engine.push(Value::Null)?;
    Ok(StepOutcome::Continue)
}

fn push_true(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    engine.push(Value::Bool(true))?;
    Ok(StepOutcome::Continue)
}

fn push_false(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    engine.push(Value::Bool(false))?;
    Ok(StepOutcome::Continue)
}

fn push_i8(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let value = operand.as_i32().ok_or_else(missing_operand)?;
    engine.push(Value::Int32(value))?;
    Ok(StepOutcome::Continue)
}

fn push_i16(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let value = operand.as_i32().ok_or_else(missing_operand)?;
    engine.push(Value::Int32(value))?;
    Ok(StepOutcome::Continue)
}

fn push_i32(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let value = operand.as_i32().ok_or_else(missing_operand)?;
    engine.push(Value::Int32(value))?;
    Ok(StepOutcome::Continue)
}

fn push_f32(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let value = operand.as_f32().ok_or_else(missing_operand)?;
    engine.push(Value::Float32(value))?;
    Ok(StepOutcome::Continue)
}

fn push_str(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let index = operand.as_u16().ok_or_else(missing_operand)?;
    let content = engine.module().constant(index)?.to_string();
    let value = engine.intern_string(&content)?;
    engine.push(value)?;
    Ok(StepOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NullPlatform;
    use crate::pool::Pool;

    fn engine_with_constant(s: &str) -> (ExecutionEngine, u16) {
        let mut b = crate::module_builder::ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        let idx = b.add_constant(s);
        (ExecutionEngine::new(b.build(), Pool::new(1 << 16), Box::new(NullPlatform)), idx)
    }

    #[test]
    fn push_str_interns_and_pushes_a_string_value() {
        let (mut e, idx) = engine_with_constant("hi");
        push_str(&mut e, Operand::U16(idx)).unwrap();
        let value = e.pop().unwrap();
        assert!(matches!(value, Value::String(_)));
    }

    #[test]
    fn push_i8_sign_extends() {
        let (mut e, _) = engine_with_constant("unused");
        push_i8(&mut e, Operand::I8(-5)).unwrap();
        assert_eq!(e.pop().unwrap(), Value::Int32(-5));
    }
}
