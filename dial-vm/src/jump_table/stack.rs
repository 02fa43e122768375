//! Stack manipulation opcodes: `NOP`, `POP`, `DUP`, `SWAP`.

use crate::error::DialResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::Nop, nop);
    table.register(OpCode::Pop, pop);
    table.register(OpCode::Dup, dup);
    table.register(OpCode::Swap, swap);
}

fn nop(_engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    Ok(StepOutcome::Continue)
}

fn pop(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    engine.pop()?;
    Ok(StepOutcome::Continue)
}

fn dup(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let top = engine.peek()?;
    engine.push(top)?;
    Ok(StepOutcome::Continue)
}

fn swap(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let mut top_two = engine.pop_n(2)?;
    let b = top_two.pop().expect("pop_n(2) yields two items");
    let a = top_two.pop().expect("pop_n(2) yields two items");
    engine.push(b)?;
    engine.push(a)?;
    Ok(StepOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NullPlatform;
    use crate::pool::Pool;
    use crate::value::Value;

    fn engine() -> ExecutionEngine {
        let b = crate::module_builder::ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        ExecutionEngine::new(b.build(), Pool::new(1 << 16), Box::new(NullPlatform))
    }

    #[test]
    fn dup_duplicates_the_top_value() {
        let mut e = engine();
        e.push(Value::Int32(5)).unwrap();
        dup(&mut e, Operand::None).unwrap();
        assert_eq!(e.pop().unwrap(), Value::Int32(5));
        assert_eq!(e.pop().unwrap(), Value::Int32(5));
    }

    #[test]
    fn swap_exchanges_the_top_two_values() {
        let mut e = engine();
        e.push(Value::Int32(1)).unwrap();
        e.push(Value::Int32(2)).unwrap();
        swap(&mut e, Operand::None).unwrap();
        assert_eq!(e.pop().unwrap(), Value::Int32(1));
        assert_eq!(e.pop().unwrap(), Value::Int32(2));
    }
}
