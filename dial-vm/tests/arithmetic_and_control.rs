mod support;

use dial_vm::module_builder::ModuleBuilder;
use dial_vm::op_code::OpCode;
use dial_vm::pool::Pool;
use dial_vm::scheduler::{run_to_completion, DEFAULT_BUDGET};
use dial_vm::{ExecutionEngine, ExecutionResult};

use support::RecordingPlatform;

/// Sums 1..=5 with a local-variable loop and prints the total, exercising
/// PUSH_I32/LOAD_LOCAL/STORE_LOCAL/ADD/LT/JUMP/JUMP_IF_NOT end to end.
#[test]
fn sums_one_through_five_with_a_loop() {
    let mut b = ModuleBuilder::new("sum", "0.1.0", "test", 1 << 16);

    b.push_i32(0);
    b.push_u8_operand(OpCode::StoreLocal, 0); // sum = 0
    b.push_i32(1);
    b.push_u8_operand(OpCode::StoreLocal, 1); // i = 1

    let loop_start = b.current_pc();
    b.push_u8_operand(OpCode::LoadLocal, 1);
    b.push_i32(6);
    b.push_op(OpCode::Lt); // i < 6
    let end_placeholder = b.push_jump_placeholder(OpCode::JumpIfNot);

    b.push_u8_operand(OpCode::LoadLocal, 0);
    b.push_u8_operand(OpCode::LoadLocal, 1);
    b.push_op(OpCode::Add);
    b.push_u8_operand(OpCode::StoreLocal, 0); // sum += i

    b.push_u8_operand(OpCode::LoadLocal, 1);
    b.push_i32(1);
    b.push_op(OpCode::Add);
    b.push_u8_operand(OpCode::StoreLocal, 1); // i += 1

    let jump_back_pc = b.current_pc();
    let next_pc_after_jump = jump_back_pc + 5;
    let back_offset = loop_start as i64 - next_pc_after_jump as i64;
    b.push_i32_operand(OpCode::Jump, back_offset as i32);

    b.patch_jump_to_current_pc(end_placeholder);
    b.push_u8_operand(OpCode::LoadLocal, 0);
    b.push_op(OpCode::Print);
    b.push_op(OpCode::Halt);

    let module = b.build();
    let platform = RecordingPlatform::new();
    let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(platform.clone()));

    let result = run_to_completion(&mut engine, DEFAULT_BUDGET);
    assert_eq!(result, ExecutionResult::Finished);
    assert_eq!(platform.printed(), vec!["15".to_string()]);
}

#[test]
fn integer_division_by_zero_prints_zero() {
    let mut b = ModuleBuilder::new("div_int", "0.1.0", "test", 1 << 16);
    b.push_i32(7);
    b.push_i32(0);
    b.push_op(OpCode::Div);
    b.push_op(OpCode::Print);
    b.push_op(OpCode::Halt);
    let module = b.build();

    let platform = RecordingPlatform::new();
    let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(platform.clone()));
    assert_eq!(run_to_completion(&mut engine, DEFAULT_BUDGET), ExecutionResult::Finished);
    assert_eq!(platform.printed(), vec!["0".to_string()]);
}

#[test]
fn float_division_by_zero_prints_nan() {
    let mut b = ModuleBuilder::new("div_float", "0.1.0", "test", 1 << 16);
    b.push_f32(7.0);
    b.push_f32(0.0);
    b.push_op(OpCode::Div);
    b.push_op(OpCode::Print);
    b.push_op(OpCode::Halt);
    let module = b.build();

    let platform = RecordingPlatform::new();
    let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(platform.clone()));
    assert_eq!(run_to_completion(&mut engine, DEFAULT_BUDGET), ExecutionResult::Finished);
    assert_eq!(platform.printed(), vec!["NaN".to_string()]);
}

#[test]
fn modulo_by_zero_is_a_fatal_error() {
    let mut b = ModuleBuilder::new("mod", "0.1.0", "test", 1 << 16);
    b.push_i32(7);
    b.push_i32(0);
    b.push_op(OpCode::Mod);
    b.push_op(OpCode::Halt);
    let module = b.build();

    let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(RecordingPlatform::new()));
    assert!(matches!(run_to_completion(&mut engine, DEFAULT_BUDGET), ExecutionResult::Error(_)));
}
