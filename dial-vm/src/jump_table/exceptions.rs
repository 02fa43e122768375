//! Exception-handling opcodes: `TRY`, `END_TRY`, `THROW`.
//!
//! `THROW` resolves its own handler rather than going through the generic
//! error-propagation path, so a caught value keeps its original type —
//! routing it through `DialError::UnhandledException` (a `String`) would
//! flatten every caught Value to its display form. That error variant is
//! reserved for the case where no handler exists at all.

use crate::error::{DialError, DialResult};
use crate::exception_handling::ExceptionHandler;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::Try, try_op);
    table.register(OpCode::EndTry, end_try);
    table.register(OpCode::Throw, throw);
}

fn missing_operand() -> DialError {
    DialError::type_mismatch("instruction operand", "none")
}

/// `TRY catch_offset`: pushes a handler recording the current stack
/// height and the catch target, relative to the PC just past the operand.
fn try_op(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let offset = operand.as_i32().ok_or_else(missing_operand)?;
    let catch_pc = (engine.pc() as i64 + offset as i64) as usize;
    engine.push_handler(ExceptionHandler::new(catch_pc, engine.stack_len()));
    Ok(StepOutcome::Continue)
}

fn end_try(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    engine.pop_handler();
    Ok(StepOutcome::Continue)
}

/// `THROW`: pops the thrown Value. If a handler is active, the stack is
/// truncated to the height recorded at `TRY`, the original Value is pushed
/// back, and execution jumps to `catch_pc`. Otherwise the program halts
/// with an `UnhandledException` carrying the Value's display form.
fn throw(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let thrown = engine.pop()?;
    match engine.pop_handler() {
        Some(handler) => {
            engine.truncate_stack(handler.stack_size_on_entry);
            engine.push(thrown)?;
            engine.set_pc(handler.catch_pc);
            Ok(StepOutcome::Continue)
        }
        None => {
            let message = engine.pool().to_display_string(thrown);
            Err(DialError::unhandled_exception(message))
        }
    }
}
