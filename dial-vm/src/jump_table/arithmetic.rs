//! Numeric (and, for `ADD`, string-concatenating) opcodes: `ADD`, `SUB`,
//! `MUL`, `DIV`, `MOD`, `NEG`.
//!
//! Coercion rule: `Int op Int -> Int` (two's-complement wrap); if either
//! side is `Float`, both widen to `Float`. `ADD` additionally concatenates
//! when either side is `String`. Non-numeric, non-string operands yield
//! `Null` rather than an error. Integer division by zero yields `Int32(0)`;
//! float division by zero yields `NaN`; `MOD` by zero on either variant is
//! an error.

use crate::error::DialResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;
use crate::value::Value;
use crate::error::DialError;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::Add, add);
    table.register(OpCode::Sub, sub);
    table.register(OpCode::Mul, mul);
    table.register(OpCode::Div, div);
    table.register(OpCode::Mod, modulo);
    table.register(OpCode::Neg, neg);
}

fn pop_pair(engine: &mut ExecutionEngine) -> DialResult<(Value, Value)> {
    let b = engine.pop()?;
    let a = engine.pop()?;
    Ok((a, b))
}

fn add(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    let result = match (a, b) {
        (Value::String(_), _) | (_, Value::String(_)) => {
            let sa = engine.pool().to_display_string(a);
            let sb = engine.pool().to_display_string(b);
            engine.intern_string(&format!("{sa}{sb}"))?
        }
        (Value::Int32(x), Value::Int32(y)) => Value::Int32(x.wrapping_add(y)),
        (Value::Int32(x), Value::Float32(y)) => Value::Float32(x as f32 + y),
        (Value::Float32(x), Value::Int32(y)) => Value::Float32(x + y as f32),
        (Value::Float32(x), Value::Float32(y)) => Value::Float32(x + y),
        _ => Value::Null,
    };
    engine.push(result)?;
    Ok(StepOutcome::Continue)
}

fn sub(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    let result = match (a, b) {
        (Value::Int32(x), Value::Int32(y)) => Value::Int32(x.wrapping_sub(y)),
        (Value::Int32(x), Value::Float32(y)) => Value::Float32(x as f32 - y),
        (Value::Float32(x), Value::Int32(y)) => Value::Float32(x - y as f32),
        (Value::Float32(x), Value::Float32(y)) => Value::Float32(x - y),
        _ => Value::Null,
    };
    engine.push(result)?;
    Ok(StepOutcome::Continue)
}

fn mul(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    let result = match (a, b) {
        (Value::Int32(x), Value::Int32(y)) => Value::Int32(x.wrapping_mul(y)),
        (Value::Int32(x), Value::Float32(y)) => Value::Float32(x as f32 * y),
        (Value::Float32(x), Value::Int32(y)) => Value::Float32(x * y as f32),
        (Value::Float32(x), Value::Float32(y)) => Value::Float32(x * y),
        _ => Value::Null,
    };
    engine.push(result)?;
    Ok(StepOutcome::Continue)
}

fn div_f32(x: f32, y: f32) -> Value {
    if y == 0.0 {
        Value::Float32(f32::NAN)
    } else {
        Value::Float32(x / y)
    }
}

fn div(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    let result = match (a, b) {
        (Value::Int32(x), Value::Int32(y)) => {
            if y == 0 {
                Value::Int32(0)
            } else {
                Value::Int32(x.wrapping_div(y))
            }
        }
        (Value::Int32(x), Value::Float32(y)) => div_f32(x as f32, y),
        (Value::Float32(x), Value::Int32(y)) => div_f32(x, y as f32),
        (Value::Float32(x), Value::Float32(y)) => div_f32(x, y),
        _ => Value::Null,
    };
    engine.push(result)?;
    Ok(StepOutcome::Continue)
}

fn mod_f32(x: f32, y: f32) -> DialResult<Value> {
    if y == 0.0 {
        return Err(DialError::divide_by_zero("MOD"));
    }
    Ok(Value::Float32(x % y))
}

fn modulo(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let (a, b) = pop_pair(engine)?;
    let result = match (a, b) {
        (Value::Int32(x), Value::Int32(y)) => {
            if y == 0 {
                return Err(DialError::divide_by_zero("MOD"));
            }
            Value::Int32(x.wrapping_rem(y))
        }
        (Value::Int32(x), Value::Float32(y)) => mod_f32(x as f32, y)?,
        (Value::Float32(x), Value::Int32(y)) => mod_f32(x, y as f32)?,
        (Value::Float32(x), Value::Float32(y)) => mod_f32(x, y)?,
        _ => Value::Null,
    };
    engine.push(result)?;
    Ok(StepOutcome::Continue)
}

fn neg(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let a = engine.pop()?;
    let result = match a {
        Value::Int32(x) => Value::Int32(x.wrapping_neg()),
        Value::Float32(x) => Value::Float32(-x),
        _ => Value::Null,
    };
    engine.push(result)?;
    Ok(StepOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NullPlatform;
    use crate::pool::Pool;

    fn engine() -> ExecutionEngine {
        let b = crate::module_builder::ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        ExecutionEngine::new(b.build(), Pool::new(1 << 16), Box::new(NullPlatform))
    }

    #[test]
    fn integer_division_by_zero_yields_zero() {
        let mut e = engine();
        e.push(Value::Int32(10)).unwrap();
        e.push(Value::Int32(0)).unwrap();
        div(&mut e, Operand::None).unwrap();
        assert_eq!(e.pop().unwrap(), Value::Int32(0));
    }

    #[test]
    fn float_division_by_zero_yields_nan() {
        let mut e = engine();
        e.push(Value::Float32(10.0)).unwrap();
        e.push(Value::Float32(0.0)).unwrap();
        div(&mut e, Operand::None).unwrap();
        let Value::Float32(result) = e.pop().unwrap() else { panic!("expected Float32") };
        assert!(result.is_nan());
    }

    #[test]
    fn mod_by_zero_is_an_error() {
        let mut e = engine();
        e.push(Value::Int32(10)).unwrap();
        e.push(Value::Int32(0)).unwrap();
        assert!(modulo(&mut e, Operand::None).is_err());
    }

    #[test]
    fn add_concatenates_when_either_side_is_a_string() {
        let mut e = engine();
        let s = e.intern_string("count: ").unwrap();
        e.push(s).unwrap();
        e.push(Value::Int32(3)).unwrap();
        add(&mut e, Operand::None).unwrap();
        let Value::String(handle) = e.pop().unwrap() else { panic!("expected String") };
        assert_eq!(e.pool().get_string(handle), Some("count: 3"));
    }
}
