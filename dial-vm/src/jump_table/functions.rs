//! Call opcodes: `CALL`, `CALL_NATIVE`, `RETURN`, `LOAD_FUNCTION`,
//! `CALL_INDIRECT`, `CALL_METHOD`.
//!
//! `CALL`/`CALL_NATIVE`/`CALL_METHOD` all share the wire-level
//! `u16 index + u8 count` operand shape (see [`crate::instruction::Operand`]);
//! for `CALL_METHOD` the index names a constant-pool string (the method
//! name) rather than a function-table entry.

use crate::error::{DialError, DialResult};
use crate::execution_context::CallFrame;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;
use crate::value::Value;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::Call, call);
    table.register(OpCode::CallNative, call_native);
    table.register(OpCode::Return, ret);
    table.register(OpCode::LoadFunction, load_function);
    table.register(OpCode::CallIndirect, call_indirect);
    table.register(OpCode::CallMethod, call_method);
}

fn missing_operand() -> DialError {
    DialError::type_mismatch("instruction operand", "none")
}

/// `CALL func_idx argc`: arguments are already on top of the stack as
/// `[arg0 … arg(argc-1)]`; `stack_base` is the height once they're popped,
/// and locals are populated from them directly.
fn call(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let (func_idx, argc) = operand.as_index_and_count().ok_or_else(missing_operand)?;
    let args = engine.pop_n(argc as usize)?;
    let entry = engine.module().function(func_idx)?.clone();
    let stack_base = engine.stack_len();
    let return_pc = engine.pc();
    engine.push_frame(CallFrame::new(return_pc, stack_base, entry.name, args))?;
    engine.set_pc(entry.entry_pc as usize);
    Ok(StepOutcome::Continue)
}

/// `RETURN`: pops the return value, pops the frame, truncates the stack to
/// the frame's `stack_base`, restores the caller's PC, and pushes the
/// result — except a `::constructor` frame always yields its receiver
/// (`locals[0]`) regardless of what was explicitly returned.
fn ret(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let explicit_return = engine.pop()?;
    let frame = engine.pop_frame()?;
    engine.truncate_stack(frame.stack_base);
    engine.set_pc(frame.return_pc);
    let value = if frame.is_constructor() {
        frame.local(0)
    } else {
        explicit_return
    };
    engine.push(value)?;
    Ok(StepOutcome::Continue)
}

/// `LOAD_FUNCTION idx`: allocates and pushes a first-class Function Value
/// referencing function-table entry `idx`.
fn load_function(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let idx = operand.as_u16().ok_or_else(missing_operand)?;
    let function_ref = engine.function_ref(idx)?;
    let value = engine.allocate_function(idx, function_ref.param_count)?;
    engine.push(value)?;
    Ok(StepOutcome::Continue)
}

/// `CALL_INDIRECT argc`: pops the callee Function (top), validates its
/// arity, then checks whether the next stack slot is an Object — if so it
/// is consumed as the implicit receiver and bound to `locals[0]`.
fn call_indirect(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let argc = operand.as_u8().ok_or_else(missing_operand)?;
    let callee = engine.pop()?;
    let Value::Function(handle) = callee else {
        return Err(DialError::type_mismatch("Function", callee.type_name()));
    };
    let function_ref = engine
        .pool()
        .get_function(handle)
        .ok_or_else(|| DialError::invalid_index("function", handle.index()))?;
    if function_ref.param_count != argc {
        return Err(DialError::arity_mismatch(function_ref.param_count, argc));
    }

    let args = engine.pop_n(argc as usize)?;
    let receiver = engine.peek().ok().filter(|v| matches!(v, Value::Object(_)));
    let locals = if let Some(receiver_value) = receiver {
        engine.pop()?;
        let mut locals = Vec::with_capacity(args.len() + 1);
        locals.push(receiver_value);
        locals.extend(args);
        locals
    } else {
        args
    };

    let entry = engine.module().function(function_ref.function_index)?.clone();
    let stack_base = engine.stack_len();
    let return_pc = engine.pc();
    engine.push_frame(CallFrame::new(return_pc, stack_base, entry.name, locals))?;
    engine.set_pc(entry.entry_pc as usize);
    Ok(StepOutcome::Continue)
}

/// `CALL_METHOD argc name_idx`: expects `[…, receiver, arg0 … arg(argc-1)]`;
/// the receiver must be an Object whose `name_idx` field is a Function.
fn call_method(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let (name_idx, argc) = operand.as_index_and_count().ok_or_else(missing_operand)?;
    let args = engine.pop_n(argc as usize)?;
    let receiver_value = engine.pop()?;
    let Value::Object(object_handle) = receiver_value else {
        return Err(DialError::bad_receiver(receiver_value.type_name()));
    };

    let name = engine.module().constant(name_idx)?.to_string();
    let field = engine
        .pool()
        .get_object(object_handle)
        .and_then(|o| o.get(&name))
        .ok_or_else(|| DialError::invalid_index("field", name_idx as u32))?;
    let Value::Function(function_handle) = field else {
        return Err(DialError::type_mismatch("Function field", field.type_name()));
    };
    let function_ref = engine
        .pool()
        .get_function(function_handle)
        .ok_or_else(|| DialError::invalid_index("function", function_handle.index()))?;

    let mut locals = Vec::with_capacity(args.len() + 1);
    locals.push(receiver_value);
    locals.extend(args);

    let entry = engine.module().function(function_ref.function_index)?.clone();
    let stack_base = engine.stack_len();
    let return_pc = engine.pc();
    engine.push_frame(CallFrame::new(return_pc, stack_base, entry.name, locals))?;
    engine.set_pc(entry.entry_pc as usize);
    Ok(StepOutcome::Continue)
}

/// `CALL_NATIVE native_id_or_name_idx argc`: resolves the native ID
/// (directly, or through the legacy name-table indirection per the
/// Module's `NATIVE_IDS_DIRECT` flag), pops `argc` arguments, and dispatches
/// through the Platform. `system.sleep` is special-cased: it never reaches
/// native dispatch, instead suspending the batch directly.
fn call_native(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let (index, argc) = operand.as_index_and_count().ok_or_else(missing_operand)?;
    let args = engine.pop_n(argc as usize)?;

    let id = if engine.module().uses_direct_native_ids() {
        index
    } else {
        let name = engine.module().constant(index)?;
        crate::native::lookup_by_name(name)
            .map(|sig| sig.id)
            .unwrap_or(crate::native::UNKNOWN)
    };

    if crate::native::is_sleep(id) {
        let ms = match args.first() {
            Some(Value::Int32(n)) => *n as i64,
            Some(Value::Float32(f)) => *f as i64,
            _ => 0,
        };
        return Ok(StepOutcome::Sleep(ms));
    }

    if let Some(sig) = crate::native::lookup_by_id(id) {
        if (args.len() as u8) < sig.arity {
            return Err(DialError::arity_mismatch(sig.arity, args.len() as u8));
        }
        if sig.requires_callback && !matches!(args.first(), Some(Value::Function(_))) {
            return Err(DialError::arity_mismatch(sig.arity, args.len() as u8));
        }
    }

    let result = engine.dispatch_native(id, &args)?;
    engine.push(result)?;
    Ok(StepOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_builder::ModuleBuilder;
    use crate::platform::NullPlatform;
    use crate::pool::Pool;

    fn engine_with(b: ModuleBuilder) -> ExecutionEngine {
        ExecutionEngine::new(b.build(), Pool::new(1 << 16), Box::new(NullPlatform))
    }

    #[test]
    fn call_pushes_a_frame_and_jumps_to_the_entry_pc() {
        let mut b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        b.push_op(OpCode::Halt);
        let callee = b.begin_function("add_one", 1);
        b.push_op(OpCode::Halt);
        let mut engine = engine_with(b);

        engine.set_pc(1);
        engine.push(Value::Int32(41)).unwrap();
        call(&mut engine, Operand::IndexAndCount(callee, 1)).unwrap();

        assert_eq!(engine.pc(), 1);
        assert_eq!(engine.stack_len(), 0);
        let frame = engine.current_frame().unwrap();
        assert_eq!(frame.return_pc, 1);
        assert_eq!(frame.local(0), Value::Int32(41));
    }

    #[test]
    fn return_restores_caller_pc_and_stack_height() {
        let mut b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        b.push_op(OpCode::Halt);
        let mut engine = engine_with(b);

        engine.push(Value::Int32(7)).unwrap(); // caller's unrelated stack slot
        let frame = CallFrame::new(5, 1, "add_one", vec![Value::Int32(41)]);
        engine.push_frame(frame).unwrap();
        engine.push(Value::Int32(42)).unwrap();

        ret(&mut engine, Operand::None).unwrap();

        assert_eq!(engine.pc(), 5);
        assert_eq!(engine.stack_len(), 2);
        assert_eq!(engine.pop().unwrap(), Value::Int32(42));
        assert_eq!(engine.pop().unwrap(), Value::Int32(7));
    }

    #[test]
    fn return_from_a_constructor_frame_yields_the_receiver() {
        let mut b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        b.push_op(OpCode::Halt);
        let mut engine = engine_with(b);

        let receiver = engine.allocate_object("Counter").unwrap();
        let frame = CallFrame::new(0, 0, "Counter::constructor", vec![receiver]);
        engine.push_frame(frame).unwrap();
        engine.push(Value::Null).unwrap(); // explicit `return;` with no value

        ret(&mut engine, Operand::None).unwrap();

        assert_eq!(engine.pop().unwrap(), receiver);
    }

    #[test]
    fn call_indirect_arity_mismatch_does_not_push_a_frame() {
        let mut b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        b.push_op(OpCode::Halt);
        let idx = b.begin_function("needs_two", 2);
        b.push_op(OpCode::Halt);
        let mut engine = engine_with(b);

        let function_value = engine.allocate_function(idx, 2).unwrap();
        engine.push(Value::Int32(1)).unwrap();
        engine.push(function_value).unwrap();

        let err = call_indirect(&mut engine, Operand::U8(1)).unwrap_err();
        assert!(matches!(err, DialError::ArityMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn call_native_rejects_a_non_function_callback_argument() {
        let mut b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        let name_idx = b.add_constant("encoder.onTurn");
        b.push_op(OpCode::Halt);
        let mut engine = engine_with(b);

        // The legacy delay-only form: no Function argument at all.
        engine.push(Value::Int32(1)).unwrap();
        let err = call_native(&mut engine, Operand::IndexAndCount(name_idx, 1)).unwrap_err();
        assert!(matches!(err, DialError::ArityMismatch { expected: 1, actual: 1 }));
    }

    #[test]
    fn load_function_pushes_a_function_value() {
        let mut b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        let idx = b.begin_function("f", 0);
        b.push_op(OpCode::Halt);
        let mut engine = engine_with(b);

        load_function(&mut engine, Operand::U16(idx)).unwrap();
        assert!(matches!(engine.pop().unwrap(), Value::Function(_)));
    }
}
