//! Miscellaneous opcodes: `PRINT`, `HALT`.

use crate::error::DialResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::Print, print);
    table.register(OpCode::Halt, halt);
}

fn print(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let value = engine.pop()?;
    let text = engine.pool().to_display_string(value);
    engine.platform_print(&text);
    Ok(StepOutcome::Continue)
}

fn halt(_engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    Ok(StepOutcome::Halt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_builder::ModuleBuilder;
    use crate::platform::NullPlatform;
    use crate::pool::Pool;
    use crate::value::Value;

    fn engine() -> ExecutionEngine {
        let b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        ExecutionEngine::new(b.build(), Pool::new(1 << 16), Box::new(NullPlatform))
    }

    #[test]
    fn print_pops_and_forwards_the_display_form() {
        let mut e = engine();
        e.push(Value::Int32(5)).unwrap();
        print(&mut e, Operand::None).unwrap();
        assert_eq!(e.stack_len(), 0);
    }

    #[test]
    fn halt_returns_the_halt_outcome() {
        let mut e = engine();
        assert_eq!(halt(&mut e, Operand::None).unwrap(), StepOutcome::Halt);
    }
}
