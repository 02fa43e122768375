//! Local/global variable access: `LOAD_LOCAL`, `STORE_LOCAL`,
//! `LOAD_GLOBAL`, `STORE_GLOBAL`.

use crate::error::{DialError, DialResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::LoadLocal, load_local);
    table.register(OpCode::StoreLocal, store_local);
    table.register(OpCode::LoadGlobal, load_global);
    table.register(OpCode::StoreGlobal, store_global);
}

fn missing_operand() -> DialError {
    DialError::type_mismatch("instruction operand", "none")
}

fn load_local(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let index = operand.as_u8().ok_or_else(missing_operand)?;
    let value = engine.local(index);
    engine.push(value)?;
    Ok(StepOutcome::Continue)
}

fn store_local(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let index = operand.as_u8().ok_or_else(missing_operand)?;
    let value = engine.pop()?;
    engine.set_local(index, value)?;
    Ok(StepOutcome::Continue)
}

fn load_global(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let index = operand.as_u16().ok_or_else(missing_operand)?;
    let value = engine.get_global(index)?;
    engine.push(value)?;
    Ok(StepOutcome::Continue)
}

fn store_global(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let index = operand.as_u16().ok_or_else(missing_operand)?;
    let value = engine.pop()?;
    engine.set_global(index, value)?;
    Ok(StepOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NullPlatform;
    use crate::pool::Pool;
    use crate::value::Value;

    fn engine_with_global() -> ExecutionEngine {
        let mut b = crate::module_builder::ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        b.add_global("count");
        ExecutionEngine::new(b.build(), Pool::new(1 << 16), Box::new(NullPlatform))
    }

    #[test]
    fn local_round_trips_through_store_and_load() {
        let mut e = engine_with_global();
        e.push(Value::Int32(9)).unwrap();
        store_local(&mut e, Operand::U8(2)).unwrap();
        load_local(&mut e, Operand::U8(2)).unwrap();
        assert_eq!(e.pop().unwrap(), Value::Int32(9));
    }

    #[test]
    fn global_round_trips_through_store_and_load() {
        let mut e = engine_with_global();
        e.push(Value::Int32(42)).unwrap();
        store_global(&mut e, Operand::U16(0)).unwrap();
        load_global(&mut e, Operand::U16(0)).unwrap();
        assert_eq!(e.pop().unwrap(), Value::Int32(42));
    }
}
