//! Object and array opcodes: `GET_FIELD`, `SET_FIELD`, `GET_INDEX`,
//! `SET_INDEX`, `NEW_OBJECT`, `NEW_ARRAY`.
//!
//! `GET_FIELD`/`SET_FIELD` carry no operand: the field name is a String
//! Value pushed ahead of them (typically via `PUSH_STR`), matching
//! `GET_INDEX`/`SET_INDEX`'s all-on-stack protocol. Arrays additionally
//! expose a read-only `length` pseudo-field through `GET_FIELD`; writing
//! past the end of an Array via `SET_INDEX` grows it by exactly one slot
//! (the natural way a compiler lowers an array literal's element-by-element
//! build-up), anything further out of range is an error.

use crate::error::{DialError, DialResult};
use crate::execution_context::CallFrame;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;
use crate::value::Value;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::GetField, get_field);
    table.register(OpCode::SetField, set_field);
    table.register(OpCode::GetIndex, get_index);
    table.register(OpCode::SetIndex, set_index);
    table.register(OpCode::NewObject, new_object);
    table.register(OpCode::NewArray, new_array);
}

fn missing_operand() -> DialError {
    DialError::type_mismatch("instruction operand", "none")
}

fn field_name(engine: &ExecutionEngine, value: Value) -> DialResult<String> {
    match value {
        Value::String(handle) => engine
            .pool()
            .get_string(handle)
            .map(str::to_string)
            .ok_or_else(|| DialError::invalid_index("string", handle.index())),
        other => Err(DialError::type_mismatch("String", other.type_name())),
    }
}

fn get_field(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let name_value = engine.pop()?;
    let name = field_name(engine, name_value)?;
    let receiver = engine.pop()?;
    let value = match receiver {
        Value::Object(handle) => engine.pool().get_object(handle).and_then(|o| o.get(&name)).unwrap_or(Value::Null),
        Value::Array(handle) if name == "length" => {
            let len = engine.pool().get_array(handle).map(|a| a.len()).unwrap_or(0);
            Value::Int32(len as i32)
        }
        Value::Array(_) => Value::Null,
        other => return Err(DialError::bad_receiver(other.type_name())),
    };
    engine.push(value)?;
    Ok(StepOutcome::Continue)
}

fn set_field(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let value = engine.pop()?;
    let name_value = engine.pop()?;
    let name = field_name(engine, name_value)?;
    let receiver = engine.pop()?;
    let Value::Object(handle) = receiver else {
        return Err(DialError::bad_receiver(receiver.type_name()));
    };
    let object = engine
        .pool_mut()
        .get_object_mut(handle)
        .ok_or_else(|| DialError::invalid_index("object", handle.index()))?;
    object.set(name, value);
    Ok(StepOutcome::Continue)
}

fn get_index(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let index_value = engine.pop()?;
    let receiver = engine.pop()?;
    let Value::Array(handle) = receiver else {
        return Err(DialError::bad_receiver(receiver.type_name()));
    };
    let Value::Int32(index) = index_value else {
        return Err(DialError::type_mismatch("Int32 index", index_value.type_name()));
    };
    if index < 0 {
        return Err(DialError::invalid_index("array", index as u32));
    }
    let value = engine
        .pool()
        .get_array(handle)
        .and_then(|a| a.get(index as usize))
        .ok_or_else(|| DialError::invalid_index("array", index as u32))?;
    engine.push(value)?;
    Ok(StepOutcome::Continue)
}

fn set_index(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let value = engine.pop()?;
    let index_value = engine.pop()?;
    let receiver = engine.pop()?;
    let Value::Array(handle) = receiver else {
        return Err(DialError::bad_receiver(receiver.type_name()));
    };
    let Value::Int32(index) = index_value else {
        return Err(DialError::type_mismatch("Int32 index", index_value.type_name()));
    };
    if index < 0 {
        return Err(DialError::invalid_index("array", index as u32));
    }
    let index = index as usize;
    let array = engine
        .pool_mut()
        .get_array_mut(handle)
        .ok_or_else(|| DialError::invalid_index("array", handle.index()))?;
    if index == array.len() {
        array.push(value);
    } else if !array.set(index, value) {
        return Err(DialError::invalid_index("array", index as u32));
    }
    Ok(StepOutcome::Continue)
}

fn new_array(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let value = engine.allocate_array(Vec::new())?;
    engine.push(value)?;
    Ok(StepOutcome::Continue)
}

/// `NEW_OBJECT class_name_idx`: allocates an instance, attaches every
/// `ClassName::method` entry as a Function field, and, if a
/// `ClassName::constructor` exists, immediately calls it with `argc`
/// (the constructor's own declared parameter count) arguments already on
/// the stack below this instruction — the instance is not pushed until
/// `RETURN`'s constructor special case restores it. Without a
/// constructor, the instance is pushed directly.
fn new_object(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let class_name_idx = operand.as_u16().ok_or_else(missing_operand)?;
    let class_name = engine.module().constant(class_name_idx)?.to_string();

    let instance = engine.allocate_object(&class_name)?;
    let Value::Object(handle) = instance else {
        unreachable!("allocate_object always returns Value::Object")
    };

    let methods: Vec<(String, u16, u8)> = engine
        .module()
        .methods_of(&class_name)
        .map(|(idx, entry)| {
            let method_name = entry.name.rsplit("::").next().unwrap_or(&entry.name).to_string();
            (method_name, idx, entry.param_count)
        })
        .collect();
    for (method_name, idx, param_count) in methods {
        let function_value = engine.allocate_function(idx, param_count)?;
        if let Some(object) = engine.pool_mut().get_object_mut(handle) {
            object.set(method_name, function_value);
        }
    }

    let constructor = engine
        .module()
        .constructor_of(&class_name)
        .map(|(_, entry)| (entry.name.clone(), entry.entry_pc, entry.param_count));

    match constructor {
        Some((name, entry_pc, param_count)) => {
            let args = engine.pop_n(param_count as usize)?;
            let mut locals = Vec::with_capacity(args.len() + 1);
            locals.push(instance);
            locals.extend(args);
            let stack_base = engine.stack_len();
            let return_pc = engine.pc();
            engine.push_frame(CallFrame::new(return_pc, stack_base, name, locals))?;
            engine.set_pc(entry_pc as usize);
        }
        None => engine.push(instance)?,
    }
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
    fn new_object_without_constructor_pushes_instance_directly() {
        let mut b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        let class_idx = b.add_constant("Point");
        b.push_op(OpCode::Halt);
        let mut engine = engine_with(b);

        new_object(&mut engine, Operand::U16(class_idx)).unwrap();
        let value = engine.pop().unwrap();
        assert!(matches!(value, Value::Object(_)));
    }

    #[test]
    fn new_object_attaches_methods_as_function_fields() {
        let mut b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        let class_idx = b.add_constant("Counter");
        b.push_op(OpCode::Halt);
        b.begin_function("Counter::increment", 0);
        b.push_op(OpCode::Halt);
        let mut engine = engine_with(b);

        new_object(&mut engine, Operand::U16(class_idx)).unwrap();
        let Value::Object(handle) = engine.pop().unwrap() else {
            panic!("expected Object")
        };
        let field = engine.pool().get_object(handle).unwrap().get("increment");
        assert!(matches!(field, Some(Value::Function(_))));
    }

    #[test]
    fn new_object_with_constructor_defers_the_push_to_return() {
        let mut b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        let class_idx = b.add_constant("Counter");
        b.push_op(OpCode::Halt);
        b.begin_function("Counter::constructor", 1);
        b.push_op(OpCode::Halt);
        let mut engine = engine_with(b);

        engine.push(Value::Int32(5)).unwrap();
        new_object(&mut engine, Operand::U16(class_idx)).unwrap();

        assert_eq!(engine.stack_len(), 0);
        let frame = engine.current_frame().unwrap();
        assert!(frame.is_constructor());
        assert!(matches!(frame.local(0), Value::Object(_)));
        assert_eq!(frame.local(1), Value::Int32(5));
    }

    #[test]
    fn set_index_grows_an_array_by_one_slot_then_get_index_reads_it_back() {
        let b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        let mut engine = engine_with(b);
        let array = engine.allocate_array(Vec::new()).unwrap();

        engine.push(array).unwrap();
        engine.push(Value::Int32(0)).unwrap();
        engine.push(Value::Int32(9)).unwrap();
        set_index(&mut engine, Operand::None).unwrap();

        engine.push(array).unwrap();
        engine.push(Value::Int32(0)).unwrap();
        get_index(&mut engine, Operand::None).unwrap();
        assert_eq!(engine.pop().unwrap(), Value::Int32(9));
    }

    #[test]
    fn set_index_past_the_grow_slot_is_an_error() {
        let b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        let mut engine = engine_with(b);
        let array = engine.allocate_array(Vec::new()).unwrap();

        engine.push(array).unwrap();
        engine.push(Value::Int32(3)).unwrap();
        engine.push(Value::Int32(9)).unwrap();
        assert!(set_index(&mut engine, Operand::None).is_err());
    }

    #[test]
    fn get_field_length_on_array() {
        let b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        let mut engine = engine_with(b);
        let array = engine.allocate_array(vec![Value::Int32(1), Value::Int32(2)]).unwrap();
        let name = engine.intern_string("length").unwrap();
        engine.push(array).unwrap();
        engine.push(name).unwrap();
        get_field(&mut engine, Operand::None).unwrap();
        assert_eq!(engine.pop().unwrap(), Value::Int32(2));
    }

    #[test]
    fn get_field_on_object_reads_a_set_field() {
        let b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        let mut engine = engine_with(b);
        let instance = engine.allocate_object("Point").unwrap();
        let name = engine.intern_string("x").unwrap();

        engine.push(instance).unwrap();
        engine.push(name).unwrap();
        engine.push(Value::Int32(3)).unwrap();
        set_field(&mut engine, Operand::None).unwrap();

        engine.push(instance).unwrap();
        engine.push(name).unwrap();
        get_field(&mut engine, Operand::None).unwrap();
        assert_eq!(engine.pop().unwrap(), Value::Int32(3));
    }
}
